use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use serde_json::{json, Value};

use super::PageParams;
use crate::core::posts::ProfileKind;
use crate::web::session::Session;
use crate::web::{ApiError, AppState};

/// `/api/profile/:kind` where kind is `posts`, `comments` or `likes`.
pub async fn get_profile(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(kind): Path<String>,
    Query(params): Query<PageParams>,
) -> Result<Json<Value>, ApiError> {
    let alias = session.require_alias()?;
    let kind: ProfileKind = kind.parse()?;

    let page = state
        .posts
        .profile(alias, kind, params.page_request())
        .await?;

    Ok(Json(json!({
        "items": page.items,
        "pagination": page.pagination,
    })))
}
