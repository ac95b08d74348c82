// Moderation services - the content gate and the report ledger.
//
// ContentModerator decides whether text may be stored:
//   sanitize -> blocked phrases / patterns -> spam score -> threshold
//
// ReportService records abuse reports and hides content once enough
// reports are pending against it.
//
// NO HTTP dependencies here - just pure domain logic.

use super::content_rules::{check_content, sanitize, spam_score};
use super::moderation_models::{
    ContentCategory, ModerationConfig, ModerationIssue, ModerationResult, Report, ReportStatus,
};
use crate::core::pagination::{Page, PageRequest};
use crate::core::posts::{ContentStatus, PostError, PostStore};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::{debug, info};
use uuid::Uuid;

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, Error)]
pub enum ModerationError {
    #[error("Missing required fields")]
    MissingFields,

    #[error("Invalid category")]
    InvalidCategory,

    #[error("Invalid report status")]
    InvalidStatus,

    #[error("Content not found")]
    ContentNotFound,

    #[error("Content already reported")]
    DuplicateReport,

    #[error("Storage error: {0}")]
    StorageError(String),
}

impl From<PostError> for ModerationError {
    fn from(err: PostError) -> Self {
        ModerationError::StorageError(err.to_string())
    }
}

// ============================================================================
// STORAGE TRAIT (PORT)
// ============================================================================

/// Trait for persisting abuse reports.
#[async_trait]
pub trait ReportStore: Send + Sync {
    /// Fails with `DuplicateReport` when the reporter already has a pending
    /// report on the same content.
    async fn insert_report(&self, report: &Report) -> Result<(), ModerationError>;

    /// Whether `reporter` already has a pending report against the content.
    async fn has_pending_report(
        &self,
        content_id: &str,
        reporter: &str,
    ) -> Result<bool, ModerationError>;

    async fn count_pending(&self, content_id: &str) -> Result<u64, ModerationError>;

    /// Mark every pending report on the content resolved. Returns how many changed.
    async fn resolve_pending(
        &self,
        content_id: &str,
        at: DateTime<Utc>,
    ) -> Result<u64, ModerationError>;

    /// List reports with the given status, newest first.
    async fn list_reports(
        &self,
        status: ReportStatus,
        offset: u64,
        limit: u32,
    ) -> Result<Vec<Report>, ModerationError>;

    async fn count_reports(&self, status: ReportStatus) -> Result<u64, ModerationError>;
}

// ============================================================================
// CONTENT GATE
// ============================================================================

/// Screens user text before it is stored.
#[derive(Debug, Clone, Default)]
pub struct ContentModerator {
    config: ModerationConfig,
}

impl ContentModerator {
    pub fn new(config: ModerationConfig) -> Self {
        Self { config }
    }

    /// Sanitize and screen content.
    ///
    /// Rule violations win over the spam score: when any blocked phrase or
    /// pattern matches, those issues are returned and the score is not computed.
    pub fn moderate(&self, raw: &str) -> ModerationResult {
        let sanitized = sanitize(raw);

        let issues = check_content(&sanitized);
        if !issues.is_empty() {
            debug!(issues = issues.len(), "Content matched moderation rules");
            return ModerationResult::deny(issues, sanitized);
        }

        let score = spam_score(&sanitized);
        if score > self.config.spam_threshold {
            debug!(score, "Content exceeded spam threshold");
            return ModerationResult::deny(
                vec![ModerationIssue::new(ContentCategory::Spam, "High spam score")],
                sanitized,
            );
        }

        ModerationResult::allow(sanitized)
    }
}

// ============================================================================
// REPORT LEDGER
// ============================================================================

pub struct ReportService<R: ReportStore, P: PostStore> {
    reports: R,
    posts: P,
    config: ModerationConfig,
}

impl<R: ReportStore, P: PostStore> ReportService<R, P> {
    pub fn new(reports: R, posts: P, config: ModerationConfig) -> Self {
        Self {
            reports,
            posts,
            config,
        }
    }

    /// File a report against a post or comment.
    ///
    /// Once the pending-report count for the content reaches the configured
    /// threshold the content is hidden and its pending reports are resolved.
    /// The returned report reflects that final state.
    pub async fn report_content(
        &self,
        content_id: &str,
        reporter: &str,
        reason: &str,
        category: ContentCategory,
    ) -> Result<Report, ModerationError> {
        let reason = sanitize(reason.trim());
        if content_id.trim().is_empty() || reason.trim().is_empty() {
            return Err(ModerationError::MissingFields);
        }

        if self.posts.get_post(content_id).await?.is_none() {
            return Err(ModerationError::ContentNotFound);
        }

        if self.reports.has_pending_report(content_id, reporter).await? {
            return Err(ModerationError::DuplicateReport);
        }

        let mut report = Report {
            id: Uuid::new_v4().to_string(),
            content_id: content_id.to_string(),
            reporter_alias: reporter.to_string(),
            reason: reason.trim().to_string(),
            category,
            created_at: Utc::now(),
            status: ReportStatus::Pending,
            resolved_at: None,
        };
        self.reports.insert_report(&report).await?;
        info!(content_id, %category, "Content reported");

        let pending = self.reports.count_pending(content_id).await?;
        if pending >= self.config.auto_hide_report_threshold {
            let now = Utc::now();
            self.auto_moderate(content_id, now).await?;
            report.status = ReportStatus::Resolved;
            report.resolved_at = Some(now);
        }

        Ok(report)
    }

    /// Hide content and close out its pending reports.
    async fn auto_moderate(&self, content_id: &str, at: DateTime<Utc>) -> Result<(), ModerationError> {
        if !self
            .posts
            .set_status(content_id, ContentStatus::Hidden, at)
            .await?
        {
            return Err(ModerationError::ContentNotFound);
        }

        let resolved = self.reports.resolve_pending(content_id, at).await?;
        info!(content_id, resolved, "Content hidden after repeated reports");
        Ok(())
    }

    pub async fn get_reports(
        &self,
        status: ReportStatus,
        page: PageRequest,
    ) -> Result<Page<Report>, ModerationError> {
        let items = self
            .reports
            .list_reports(status, page.offset(), page.limit)
            .await?;
        let total = self.reports.count_reports(status).await?;
        Ok(Page::new(items, page, total))
    }
}

// ============================================================================
// TESTS
// ============================================================================
