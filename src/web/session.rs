// Session cookie handling and per-session rate limiting.
//
// Every API request runs through `session_layer`. It reads (or mints) the
// session id, counts the request against a rate-limit window, and hands
// the handlers a `Session` with the alias already looked up.
//
// Only sessions that hold an alias get their own window. Requests without
// one are counted per peer address, so dropping the cookie does not reset
// the budget and one-off ids never pile up in the limiter.

use std::net::SocketAddr;

use axum::{
    extract::{ConnectInfo, Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use chrono::Utc;
use uuid::Uuid;

use super::{ApiError, AppState};

pub const SESSION_COOKIE: &str = "sid";
pub const SESSION_LIFETIME_DAYS: i64 = 365;

/// The caller's session, available to handlers as an `Extension`.
#[derive(Debug, Clone)]
pub struct Session {
    pub id: String,
    pub alias: Option<String>,
}

impl Session {
    /// The alias, or 401 when the session never asked for one.
    pub fn require_alias(&self) -> Result<&str, ApiError> {
        self.alias.as_deref().ok_or(ApiError::NoAlias)
    }

    /// The alias for ownership checks. A session without one owns nothing.
    pub fn owner(&self) -> &str {
        self.alias.as_deref().unwrap_or_default()
    }
}

pub async fn session_layer(
    State(state): State<AppState>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    // Ids are random uuids; anything else is treated as no session at all
    let existing = jar
        .get(SESSION_COOKIE)
        .map(|c| c.value().to_string())
        .filter(|v| Uuid::parse_str(v).is_ok());
    let id = existing
        .clone()
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    let alias = match &existing {
        Some(id) => state.sessions.alias(id).await?,
        None => None,
    };

    let limit_key = if alias.is_some() {
        id.clone()
    } else {
        peer_key(&request)
    };
    state.sessions.check_rate_limit(&limit_key, Utc::now())?;

    request.extensions_mut().insert(Session {
        id: id.clone(),
        alias,
    });

    let response = next.run(request).await;
    if existing.is_some() {
        return Ok(response);
    }

    let jar = jar.add(session_cookie(id, state.config.is_production()));
    Ok((jar, response).into_response())
}

/// Rate-limit key for callers without an established session.
fn peer_key(request: &Request) -> String {
    match request.extensions().get::<ConnectInfo<SocketAddr>>() {
        Some(ConnectInfo(addr)) => format!("peer:{}", addr.ip()),
        None => "peer:unknown".to_string(),
    }
}

fn session_cookie(id: String, secure: bool) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, id))
        .http_only(true)
        .same_site(SameSite::Strict)
        .path("/")
        .max_age(time::Duration::days(SESSION_LIFETIME_DAYS))
        .secure(secure)
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_production_cookie_is_secure() {
        let cookie = session_cookie(Uuid::new_v4().to_string(), true);

        assert_eq!(cookie.secure(), Some(true));
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::Strict));
    }

    #[test]
    fn test_owner_without_alias_is_empty() {
        let session = Session {
            id: "s1".to_string(),
            alias: None,
        };

        assert_eq!(session.owner(), "");
        assert!(session.require_alias().is_err());
    }

    #[test]
    fn test_peer_key_uses_ip_only() {
        let mut request = Request::new(axum::body::Body::empty());
        assert_eq!(peer_key(&request), "peer:unknown");

        request
            .extensions_mut()
            .insert(ConnectInfo(SocketAddr::from(([10, 0, 0, 7], 51234))));
        assert_eq!(peer_key(&request), "peer:10.0.0.7");
    }
}
