// Runtime configuration, read once at startup from the environment (and `.env`).

use crate::core::moderation::ModerationConfig;
use crate::core::sessions::RateLimitConfig;
use anyhow::anyhow;
use std::{env, fmt::Display, path::PathBuf, str::FromStr};
use tracing::{info, warn};

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub database_url: String,
    /// Directory holding the HTML pages and browser assets
    pub static_dir: PathBuf,
    /// `production` turns on secure cookies
    pub app_env: String,
    pub rate_limit_max_requests: u32,
    pub rate_limit_window_secs: u64,
    pub spam_threshold: f64,
    pub auto_hide_report_threshold: u64,
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        Self::from_source(|key| env::var(key).ok())
    }

    /// Build the config from any key lookup. `load` uses the process environment.
    pub fn from_source(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        Ok(Self {
            port: try_load(&lookup, "PORT", "3000")?,
            database_url: try_load(&lookup, "DATABASE_URL", "sqlite://data/talking_helps.db")?,
            static_dir: try_load(&lookup, "STATIC_DIR", "public")?,
            app_env: try_load(&lookup, "APP_ENV", "development")?,
            rate_limit_max_requests: try_load(&lookup, "RATE_LIMIT_MAX_REQUESTS", "100")?,
            rate_limit_window_secs: try_load(&lookup, "RATE_LIMIT_WINDOW_SECS", "900")?,
            spam_threshold: try_load(&lookup, "SPAM_THRESHOLD", "0.7")?,
            auto_hide_report_threshold: try_load(&lookup, "AUTO_HIDE_REPORT_THRESHOLD", "3")?,
        })
    }

    pub fn is_production(&self) -> bool {
        self.app_env.eq_ignore_ascii_case("production")
    }

    pub fn moderation(&self) -> ModerationConfig {
        ModerationConfig {
            spam_threshold: self.spam_threshold,
            auto_hide_report_threshold: self.auto_hide_report_threshold,
        }
    }

    pub fn rate_limit(&self) -> RateLimitConfig {
        RateLimitConfig {
            max_requests: self.rate_limit_max_requests,
            window_secs: self.rate_limit_window_secs,
        }
    }
}

fn try_load<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: &str,
) -> anyhow::Result<T>
where
    T::Err: Display,
{
    lookup(key)
        .unwrap_or_else(|| {
            info!("{key} not set, using default: {default}");
            default.to_string()
        })
        .parse()
        .map_err(|e| {
            warn!("Invalid {key} value: {e}");
            anyhow!("Invalid {key} value: {e}")
        })
}
