// Session logic - anonymous aliases and per-session rate limiting.
//
// A session is just an opaque id carried in a cookie. The first time a
// session asks for an alias one is generated and persisted; everything the
// user writes is attributed to that alias.
//
// Rate limiting is kept in memory: a rolling window of request times per
// session, in the same spirit as the message cache in the logging service.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::VecDeque;
use thiserror::Error;
use tracing::info;

const ADJECTIVES: [&str; 8] = [
    "Calm", "Blue", "Silent", "Brave", "Quiet", "Gentle", "Wise", "Kind",
];
const NOUNS: [&str; 8] = [
    "Phoenix", "Cloud", "Forest", "River", "Owl", "Star", "Moon", "Wind",
];

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Too many requests, please try again later")]
    RateLimited,

    #[error("Storage error: {0}")]
    StorageError(String),
}

/// Trait for persisting session aliases.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn get_alias(&self, session_id: &str) -> Result<Option<String>, SessionError>;

    /// Store an alias unless the session already has one. Returns the alias in effect.
    async fn save_alias(
        &self,
        session_id: &str,
        alias: &str,
        at: DateTime<Utc>,
    ) -> Result<String, SessionError>;

    /// Remove sessions created before `older_than`.
    async fn cleanup_expired(&self, older_than: DateTime<Utc>) -> Result<u64, SessionError>;
}

/// Rolling-window request limits.
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    pub max_requests: u32,
    pub window_secs: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: 100, // 100 requests...
            window_secs: 900,  // ...per 15 minutes
        }
    }
}

/// Build an alias like `QuietOwl_42`.
pub fn generate_alias<R: Rng>(rng: &mut R) -> String {
    let adjective = ADJECTIVES.choose(rng).copied().unwrap_or("Calm");
    let noun = NOUNS.choose(rng).copied().unwrap_or("Owl");
    let number: u16 = rng.gen_range(1..=999);
    format!("{}{}_{}", adjective, noun, number)
}

pub struct SessionService<S: SessionStore> {
    store: S,
    rate_limit: RateLimitConfig,
    // Session ID -> request times inside the current window
    requests: DashMap<String, VecDeque<DateTime<Utc>>>,
}

impl<S: SessionStore> SessionService<S> {
    pub fn new(store: S, rate_limit: RateLimitConfig) -> Self {
        Self {
            store,
            rate_limit,
            requests: DashMap::new(),
        }
    }

    /// The alias already assigned to a session, if any.
    pub async fn alias(&self, session_id: &str) -> Result<Option<String>, SessionError> {
        self.store.get_alias(session_id).await
    }

    /// Return the session's alias, generating one on first use.
    pub async fn ensure_alias(&self, session_id: &str) -> Result<String, SessionError> {
        if let Some(alias) = self.store.get_alias(session_id).await? {
            return Ok(alias);
        }

        let candidate = generate_alias(&mut rand::thread_rng());
        let alias = self
            .store
            .save_alias(session_id, &candidate, Utc::now())
            .await?;

        info!(alias = %alias, "Assigned new alias");
        Ok(alias)
    }

    /// Count a request against the session's window.
    ///
    /// Rejected requests are not recorded, so a client that backs off
    /// regains access as soon as old requests age out.
    pub fn check_rate_limit(&self, session_id: &str, now: DateTime<Utc>) -> Result<(), SessionError> {
        let window_start = now - Duration::seconds(self.rate_limit.window_secs as i64);
        let mut window = self.requests.entry(session_id.to_string()).or_default();

        while window.front().is_some_and(|t| *t <= window_start) {
            window.pop_front();
        }

        if window.len() >= self.rate_limit.max_requests as usize {
            return Err(SessionError::RateLimited);
        }

        window.push_back(now);
        Ok(())
    }

    /// Drop rate-limit windows with no requests left in them. Returns how many were dropped.
    pub fn sweep_rate_limits(&self, now: DateTime<Utc>) -> usize {
        let window_start = now - Duration::seconds(self.rate_limit.window_secs as i64);
        let before = self.requests.len();
        self.requests
            .retain(|_, window| window.back().is_some_and(|t| *t > window_start));
        before - self.requests.len()
    }

    /// Forget sessions older than `lifetime`.
    pub async fn expire_sessions(
        &self,
        now: DateTime<Utc>,
        lifetime: Duration,
    ) -> Result<u64, SessionError> {
        self.store.cleanup_expired(now - lifetime).await
    }
}
