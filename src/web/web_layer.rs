// Web layer - HTTP routes, session cookies and error responses.
//
// Handlers are thin: they pull the session alias and request body apart,
// call into a core service, and shape the JSON reply. All rules live in core.

#[path = "handlers/handler_catalog.rs"]
pub mod handlers;

pub mod error;
pub mod session;
pub mod state;

pub use error::ApiError;
pub use state::AppState;

use axum::{
    middleware,
    routing::{delete, get, post, put},
    Router,
};
use tokio::signal::ctrl_c;
#[cfg(unix)]
use tokio::signal::unix::{signal, SignalKind};
use tower_http::trace::TraceLayer;
use tracing::info;

use handlers::{alias, comments, pages, posts, profile, reports};

/// Build the full application router.
pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .route("/alias", get(alias::get_alias))
        .route("/posts", get(posts::list_posts).post(posts::create_post))
        .route(
            "/posts/:id",
            put(posts::update_post).delete(posts::delete_post),
        )
        .route("/posts/:id/like", post(posts::toggle_like))
        .route("/posts/:id/comments", get(comments::list_comments))
        .route("/comments", post(comments::create_comment))
        .route("/comments/:id", delete(comments::delete_comment))
        .route("/profile/:kind", get(profile::get_profile))
        .route(
            "/reports",
            get(reports::list_reports).post(reports::create_report),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            session::session_layer,
        ));

    Router::new()
        .nest("/api", api)
        .merge(pages::page_routes(&state.config.static_dir))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Resolves on Ctrl+C or SIGTERM.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }

        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                tracing::error!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::infra::test_support::memory_pool;
    use axum::body::{to_bytes, Body};
    use axum::extract::ConnectInfo;
    use axum::http::{header, Request, StatusCode};
    use std::net::SocketAddr;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    async fn test_app_with(config: Config) -> Router {
        router(AppState::new(memory_pool().await, config))
    }

    async fn test_app() -> Router {
        test_app_with(Config::from_source(|_| None).unwrap()).await
    }

    async fn send(
        app: &Router,
        method: &str,
        uri: &str,
        cookie: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Option<String>, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .expect("request"),
            None => builder.body(Body::empty()).expect("request"),
        };

        let response = app.clone().oneshot(request).await.expect("response");
        let status = response.status();
        let set_cookie = response
            .headers()
            .get(header::SET_COOKIE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.to_string());
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        let payload: Value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, set_cookie, payload)
    }

    /// Ask for an alias and return the `name=value` cookie pair for later requests.
    async fn sign_in(app: &Router) -> (String, String) {
        let (status, set_cookie, body) = send(app, "GET", "/api/alias", None, None).await;
        assert_eq!(status, StatusCode::OK);
        let set_cookie = set_cookie.expect("session cookie");
        let pair = set_cookie.split(';').next().unwrap().to_string();
        (pair, body["alias"].as_str().unwrap().to_string())
    }

    async fn create_post(app: &Router, cookie: &str, content: &str) -> Value {
        let (status, _, body) = send(
            app,
            "POST",
            "/api/posts",
            Some(cookie),
            Some(json!({ "content": content })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        body
    }

    #[tokio::test]
    async fn test_alias_is_stable_for_a_session() {
        let app = test_app().await;
        let (cookie, alias) = sign_in(&app).await;

        let (status, set_cookie, body) = send(&app, "GET", "/api/alias", Some(&cookie), None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["alias"], alias);
        // Known sessions keep their cookie
        assert!(set_cookie.is_none());
    }

    #[tokio::test]
    async fn test_session_cookie_attributes() {
        let app = test_app().await;
        let (_, set_cookie, _) = send(&app, "GET", "/api/alias", None, None).await;
        let set_cookie = set_cookie.unwrap();

        assert!(set_cookie.starts_with("sid="));
        assert!(set_cookie.contains("HttpOnly"));
        assert!(set_cookie.contains("SameSite=Strict"));
        assert!(set_cookie.contains("Max-Age=31536000"));
        assert!(!set_cookie.contains("Secure"));
    }

    #[tokio::test]
    async fn test_writes_require_an_alias() {
        let app = test_app().await;

        let (status, _, body) = send(
            &app,
            "POST",
            "/api/posts",
            None,
            Some(json!({ "content": "hello" })),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["message"], "No alias found");

        let (status, _, _) = send(&app, "GET", "/api/profile/posts", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _, _) = send(&app, "GET", "/api/reports", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_create_and_list_posts() {
        let app = test_app().await;
        let (cookie, alias) = sign_in(&app).await;

        let post = create_post(&app, &cookie, "Feeling a bit better today").await;
        assert_eq!(post["alias"], alias);
        assert_eq!(post["likes"], json!([]));
        assert_eq!(post["commentCount"], 0);
        assert_eq!(post["status"], "active");
        assert!(post["_id"].is_string());

        let (status, _, body) = send(&app, "GET", "/api/posts?page=1&limit=5", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["posts"].as_array().unwrap().len(), 1);
        assert_eq!(
            body["pagination"],
            json!({ "page": 1, "limit": 5, "total": 1, "pages": 1 })
        );
    }

    #[tokio::test]
    async fn test_rejected_content_lists_issues() {
        let app = test_app().await;
        let (cookie, _) = sign_in(&app).await;

        let (status, _, body) = send(
            &app,
            "POST",
            "/api/posts",
            Some(&cookie),
            Some(json!({ "content": "click here https://example.com" })),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Content violates community guidelines");
        let issues = body["issues"].as_array().unwrap();
        assert!(issues
            .iter()
            .any(|i| i["reason"] == "Contains blocked word: click here"));
        assert!(issues.iter().any(|i| i["reason"] == "Contains URL"));
    }

    #[tokio::test]
    async fn test_blank_and_malformed_bodies() {
        let app = test_app().await;
        let (cookie, _) = sign_in(&app).await;

        let (status, _, body) = send(
            &app,
            "POST",
            "/api/posts",
            Some(&cookie),
            Some(json!({ "content": "   " })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Content is required");

        let request = Request::builder()
            .method("POST")
            .uri("/api/posts")
            .header(header::COOKIE, &cookie)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_only_the_author_may_edit_or_delete() {
        let app = test_app().await;
        let (author, _) = sign_in(&app).await;
        let (stranger, _) = sign_in(&app).await;
        let post = create_post(&app, &author, "first draft").await;
        let uri = format!("/api/posts/{}", post["_id"].as_str().unwrap());

        let (status, _, body) = send(
            &app,
            "PUT",
            &uri,
            Some(&stranger),
            Some(json!({ "content": "hijacked" })),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["message"], "Not authorized to edit this post");

        let (status, _, body) = send(
            &app,
            "PUT",
            &uri,
            Some(&author),
            Some(json!({ "content": "first draft" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Failed to update post");

        let (status, _, body) = send(
            &app,
            "PUT",
            &uri,
            Some(&author),
            Some(json!({ "content": "second draft" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["post"]["content"], "second draft");

        let (status, _, _) = send(&app, "DELETE", &uri, Some(&stranger), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, _, _) = send(&app, "DELETE", &uri, Some(&author), None).await;
        assert_eq!(status, StatusCode::OK);

        let (status, _, _) = send(&app, "DELETE", &uri, Some(&author), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_like_toggles() {
        let app = test_app().await;
        let (cookie, _) = sign_in(&app).await;
        let post = create_post(&app, &cookie, "a small win").await;
        let uri = format!("/api/posts/{}/like", post["_id"].as_str().unwrap());

        let (status, _, body) = send(&app, "POST", &uri, Some(&cookie), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["liked"], true);
        assert_eq!(body["likeCount"], 1);

        let (_, _, body) = send(&app, "POST", &uri, Some(&cookie), None).await;
        assert_eq!(body["liked"], false);
        assert_eq!(body["likeCount"], 0);

        let (status, _, _) = send(&app, "POST", "/api/posts/missing/like", Some(&cookie), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_comment_lifecycle_keeps_count() {
        let app = test_app().await;
        let (cookie, alias) = sign_in(&app).await;
        let post = create_post(&app, &cookie, "anyone else up late?").await;
        let post_id = post["_id"].as_str().unwrap().to_string();

        let (status, _, comment) = send(
            &app,
            "POST",
            "/api/comments",
            Some(&cookie),
            Some(json!({ "postId": post_id, "content": "me too" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(comment["parentPostId"], post_id.as_str());

        let (_, _, feed) = send(&app, "GET", "/api/posts", None, None).await;
        assert_eq!(feed["posts"][0]["commentCount"], 1);

        let comments_uri = format!("/api/posts/{}/comments", post_id);
        let (_, _, listed) = send(&app, "GET", &comments_uri, None, None).await;
        assert_eq!(listed["comments"].as_array().unwrap().len(), 1);

        let (_, _, profile) = send(&app, "GET", "/api/profile/comments", Some(&cookie), None).await;
        assert_eq!(profile["items"][0]["alias"], alias);

        let comment_uri = format!("/api/comments/{}", comment["_id"].as_str().unwrap());
        let (status, _, _) = send(&app, "DELETE", &comment_uri, Some(&cookie), None).await;
        assert_eq!(status, StatusCode::OK);

        let (_, _, feed) = send(&app, "GET", "/api/posts", None, None).await;
        assert_eq!(feed["posts"][0]["commentCount"], 0);

        let (status, _, body) = send(
            &app,
            "POST",
            "/api/comments",
            Some(&cookie),
            Some(json!({ "postId": "missing", "content": "hello?" })),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "Parent post not found");
    }

    #[tokio::test]
    async fn test_unknown_profile_type() {
        let app = test_app().await;
        let (cookie, _) = sign_in(&app).await;

        let (status, _, body) = send(&app, "GET", "/api/profile/friends", Some(&cookie), None).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Invalid profile type");
    }

    #[tokio::test]
    async fn test_reports_hide_content_at_threshold() {
        let app = test_app().await;
        let (author, _) = sign_in(&app).await;
        let post = create_post(&app, &author, "just venting").await;
        let post_id = post["_id"].as_str().unwrap().to_string();

        let mut last = Value::Null;
        for _ in 0..3 {
            let (reporter, _) = sign_in(&app).await;
            let (status, _, body) = send(
                &app,
                "POST",
                "/api/reports",
                Some(&reporter),
                Some(json!({ "contentId": post_id, "reason": "rude", "category": "hate_speech" })),
            )
            .await;
            assert_eq!(status, StatusCode::CREATED);
            last = body;
        }
        assert_eq!(last["status"], "resolved");

        let (_, _, feed) = send(&app, "GET", "/api/posts", None, None).await;
        assert_eq!(feed["posts"].as_array().unwrap().len(), 0);

        let (_, _, resolved) = send(
            &app,
            "GET",
            "/api/reports?status=resolved",
            Some(&author),
            None,
        )
        .await;
        assert_eq!(resolved["pagination"]["total"], 3);

        let (_, _, pending) = send(&app, "GET", "/api/reports", Some(&author), None).await;
        assert_eq!(pending["reports"].as_array().unwrap().len(), 0);
    }

    #[tokio::test]
    async fn test_report_validation() {
        let app = test_app().await;
        let (cookie, _) = sign_in(&app).await;
        let post = create_post(&app, &cookie, "hello all").await;
        let post_id = post["_id"].as_str().unwrap().to_string();

        let (status, _, body) = send(
            &app,
            "POST",
            "/api/reports",
            Some(&cookie),
            Some(json!({ "contentId": post_id, "reason": "rude" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Missing required fields");

        let (status, _, body) = send(
            &app,
            "POST",
            "/api/reports",
            Some(&cookie),
            Some(json!({ "contentId": post_id, "reason": "rude", "category": "boring" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Invalid category");

        let report = json!({ "contentId": post_id, "reason": "rude", "category": "spam" });
        let (status, _, _) = send(&app, "POST", "/api/reports", Some(&cookie), Some(report.clone())).await;
        assert_eq!(status, StatusCode::CREATED);
        let (status, _, _) = send(&app, "POST", "/api/reports", Some(&cookie), Some(report)).await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (status, _, _) = send(
            &app,
            "GET",
            "/api/reports?status=archived",
            Some(&cookie),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_page_routes_serve_static_files() {
        let dir = tempfile::TempDir::new().unwrap();
        std::fs::write(dir.path().join("index.html"), "<h1>home</h1>").unwrap();
        std::fs::write(dir.path().join("support.html"), "<h1>support</h1>").unwrap();
        std::fs::write(dir.path().join("style.css"), "body {}").unwrap();

        let mut config = Config::from_source(|_| None).unwrap();
        config.static_dir = dir.path().to_path_buf();
        let app = test_app_with(config).await;

        for (uri, expected) in [("/", "<h1>home</h1>"), ("/support", "<h1>support</h1>"), ("/style.css", "body {}")] {
            let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
            let response = app.clone().oneshot(request).await.unwrap();
            assert_eq!(response.status(), StatusCode::OK, "{}", uri);
            let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
            assert_eq!(&bytes[..], expected.as_bytes());
        }

        let request = Request::builder().uri("/profile").body(Body::empty()).unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_rate_limit_per_session() {
        let mut config = Config::from_source(|_| None).unwrap();
        config.rate_limit_max_requests = 2;
        let app = test_app_with(config).await;
        // Asking for the alias is counted against the peer, not the new session
        let (cookie, _) = sign_in(&app).await;

        for _ in 0..2 {
            let (status, _, _) = send(&app, "GET", "/api/posts", Some(&cookie), None).await;
            assert_eq!(status, StatusCode::OK);
        }

        let (status, _, body) = send(&app, "GET", "/api/posts", Some(&cookie), None).await;
        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(body["message"], "Too many requests, please try again later");
    }

    async fn get_from_peer(app: &Router, ip: [u8; 4], cookie: Option<&str>) -> StatusCode {
        let mut builder = Request::builder().uri("/api/posts");
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        let mut request = builder.body(Body::empty()).expect("request");
        request
            .extensions_mut()
            .insert(ConnectInfo(SocketAddr::from((ip, 40000))));
        app.clone().oneshot(request).await.expect("response").status()
    }

    #[tokio::test]
    async fn test_cookieless_requests_share_the_peer_budget() {
        let mut config = Config::from_source(|_| None).unwrap();
        config.rate_limit_max_requests = 1;
        let app = test_app_with(config).await;

        assert_eq!(get_from_peer(&app, [192, 0, 2, 1], None).await, StatusCode::OK);
        // A fresh cookie-less request would otherwise mint a new session
        assert_eq!(
            get_from_peer(&app, [192, 0, 2, 1], None).await,
            StatusCode::TOO_MANY_REQUESTS
        );
        // Unknown or alias-less session ids fall back to the peer as well
        let stranger = format!("{}={}", session::SESSION_COOKIE, uuid::Uuid::new_v4());
        assert_eq!(
            get_from_peer(&app, [192, 0, 2, 1], Some(&stranger)).await,
            StatusCode::TOO_MANY_REQUESTS
        );

        assert_eq!(get_from_peer(&app, [192, 0, 2, 2], None).await, StatusCode::OK);
    }
}
