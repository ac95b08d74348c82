use axum::{extract::State, Extension, Json};
use serde_json::{json, Value};

use crate::web::session::Session;
use crate::web::{ApiError, AppState};

/// Return the session's alias, generating one on the first call.
pub async fn get_alias(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> Result<Json<Value>, ApiError> {
    let alias = match session.alias {
        Some(alias) => alias,
        None => state.sessions.ensure_alias(&session.id).await?,
    };

    Ok(Json(json!({ "alias": alias })))
}
