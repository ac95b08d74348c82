use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use super::PageParams;
use crate::core::posts::Post;
use crate::web::session::Session;
use crate::web::{ApiError, AppState};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentBody {
    #[serde(default)]
    pub post_id: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
}

pub async fn list_comments(
    State(state): State<AppState>,
    Path(post_id): Path<String>,
    Query(params): Query<PageParams>,
) -> Result<Json<Value>, ApiError> {
    let page = state
        .posts
        .comments(&post_id, params.page_request())
        .await?;

    Ok(Json(json!({
        "comments": page.items,
        "pagination": page.pagination,
    })))
}

pub async fn create_comment(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    payload: Result<Json<CommentBody>, JsonRejection>,
) -> Result<(StatusCode, Json<Post>), ApiError> {
    let alias = session.require_alias()?;
    let Json(body) = payload?;

    let comment = state
        .posts
        .create_comment(
            alias,
            body.post_id.as_deref().unwrap_or_default(),
            body.content.as_deref().unwrap_or_default(),
        )
        .await?;

    Ok((StatusCode::CREATED, Json(comment)))
}

pub async fn delete_comment(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    state.posts.delete_comment(&id, session.owner()).await?;

    Ok(Json(json!({ "message": "Comment deleted successfully" })))
}
