use axum::{
    extract::{rejection::JsonRejection, Query, State},
    http::StatusCode,
    Extension, Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::core::moderation::{ContentCategory, ModerationError, Report, ReportStatus};
use crate::core::pagination::PageRequest;
use crate::web::session::Session;
use crate::web::{ApiError, AppState};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportBody {
    #[serde(default)]
    pub content_id: Option<String>,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ReportQuery {
    pub status: Option<String>,
    pub page: Option<String>,
    pub limit: Option<String>,
}

fn present(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

pub async fn create_report(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    payload: Result<Json<ReportBody>, JsonRejection>,
) -> Result<(StatusCode, Json<Report>), ApiError> {
    let alias = session.require_alias()?;
    let Json(body) = payload?;

    let (Some(content_id), Some(reason), Some(category)) = (
        present(body.content_id),
        present(body.reason),
        present(body.category),
    ) else {
        return Err(ModerationError::MissingFields.into());
    };
    let category: ContentCategory = category.parse()?;

    let report = state
        .reports
        .report_content(&content_id, alias, &reason, category)
        .await?;

    Ok((StatusCode::CREATED, Json(report)))
}

pub async fn list_reports(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Query(query): Query<ReportQuery>,
) -> Result<Json<Value>, ApiError> {
    session.require_alias()?;
    let status: ReportStatus = query.status.as_deref().unwrap_or("pending").parse()?;
    let page = PageRequest::parse(query.page.as_deref(), query.limit.as_deref());

    let reports = state.reports.get_reports(status, page).await?;

    Ok(Json(json!({
        "reports": reports.items,
        "pagination": reports.pagination,
    })))
}
