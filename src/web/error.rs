use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::core::moderation::ModerationError;
use crate::core::posts::PostError;
use crate::core::sessions::SessionError;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Malformed payload")]
    MalformedPayload,

    #[error("No alias found")]
    NoAlias,

    #[error(transparent)]
    Post(#[from] PostError),

    #[error(transparent)]
    Moderation(#[from] ModerationError),

    #[error(transparent)]
    Session(#[from] SessionError),
}

impl From<JsonRejection> for ApiError {
    fn from(_: JsonRejection) -> Self {
        ApiError::MalformedPayload
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::MalformedPayload => StatusCode::BAD_REQUEST,
            ApiError::NoAlias => StatusCode::UNAUTHORIZED,
            ApiError::Post(e) => match e {
                PostError::EmptyContent
                | PostError::Rejected(_)
                | PostError::Unchanged
                | PostError::InvalidProfileKind => StatusCode::BAD_REQUEST,
                PostError::PostNotFound | PostError::CommentNotFound | PostError::ParentNotFound => {
                    StatusCode::NOT_FOUND
                }
                PostError::NotAuthor(_) => StatusCode::FORBIDDEN,
                PostError::StorageError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ApiError::Moderation(e) => match e {
                ModerationError::MissingFields
                | ModerationError::InvalidCategory
                | ModerationError::InvalidStatus => StatusCode::BAD_REQUEST,
                ModerationError::ContentNotFound => StatusCode::NOT_FOUND,
                ModerationError::DuplicateReport => StatusCode::CONFLICT,
                ModerationError::StorageError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ApiError::Session(e) => match e {
                SessionError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
                SessionError::StorageError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Storage details stay in the logs
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            error!("Request failed: {}", self);
            let body = json!({ "message": "Internal server error" });
            return (status, Json(body)).into_response();
        }

        let body = match &self {
            ApiError::Post(PostError::Rejected(issues)) => json!({
                "message": self.to_string(),
                "issues": issues,
            }),
            _ => json!({ "message": self.to_string() }),
        };

        (status, Json(body)).into_response()
    }
}
