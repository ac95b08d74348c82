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
pub struct ContentBody {
    #[serde(default)]
    pub content: Option<String>,
}

pub async fn list_posts(
    State(state): State<AppState>,
    Query(params): Query<PageParams>,
) -> Result<Json<Value>, ApiError> {
    let page = state.posts.feed(params.page_request()).await?;

    Ok(Json(json!({
        "posts": page.items,
        "pagination": page.pagination,
    })))
}

pub async fn create_post(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    payload: Result<Json<ContentBody>, JsonRejection>,
) -> Result<(StatusCode, Json<Post>), ApiError> {
    let alias = session.require_alias()?;
    let Json(body) = payload?;

    let post = state
        .posts
        .create_post(alias, body.content.as_deref().unwrap_or_default())
        .await?;

    Ok((StatusCode::CREATED, Json(post)))
}

pub async fn update_post(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(id): Path<String>,
    payload: Result<Json<ContentBody>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(body) = payload?;

    let post = state
        .posts
        .update_post(
            &id,
            session.owner(),
            body.content.as_deref().unwrap_or_default(),
        )
        .await?;

    Ok(Json(json!({
        "message": "Post updated successfully",
        "post": post,
    })))
}

pub async fn delete_post(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    state.posts.delete_post(&id, session.owner()).await?;

    Ok(Json(json!({ "message": "Post and its comments deleted successfully" })))
}

pub async fn toggle_like(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let alias = session.require_alias()?;
    let toggle = state.posts.toggle_like(&id, alias).await?;

    Ok(Json(json!({
        "message": "Like toggled successfully",
        "liked": toggle.liked,
        "likeCount": toggle.like_count,
    })))
}
