use std::path::Path;

use axum::Router;
use tower_http::services::{ServeDir, ServeFile};

use crate::web::AppState;

/// HTML pages by name, with everything else served straight from the static directory.
pub fn page_routes(static_dir: &Path) -> Router<AppState> {
    Router::new()
        .route_service("/", ServeFile::new(static_dir.join("index.html")))
        .route_service("/profile", ServeFile::new(static_dir.join("profile.html")))
        .route_service("/support", ServeFile::new(static_dir.join("support.html")))
        .fallback_service(ServeDir::new(static_dir))
}
