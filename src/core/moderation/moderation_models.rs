// Moderation domain models - data structures for content screening and reports.
//
// These are pure domain types with no HTTP dependencies.
// The web layer converts them to JSON responses.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::moderation_service::ModerationError;

/// Category a piece of content (or a report) falls under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentCategory {
    Harmful,
    Spam,
    Inappropriate,
    HateSpeech,
}

impl ContentCategory {
    /// Every category, in the order rules are evaluated.
    pub const ALL: [ContentCategory; 4] = [
        ContentCategory::Harmful,
        ContentCategory::Spam,
        ContentCategory::Inappropriate,
        ContentCategory::HateSpeech,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ContentCategory::Harmful => "harmful",
            ContentCategory::Spam => "spam",
            ContentCategory::Inappropriate => "inappropriate",
            ContentCategory::HateSpeech => "hate_speech",
        }
    }
}

impl fmt::Display for ContentCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContentCategory {
    type Err = ModerationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ContentCategory::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or(ModerationError::InvalidCategory)
    }
}

/// A single reason content was rejected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModerationIssue {
    pub category: ContentCategory,
    pub reason: String,
}

impl ModerationIssue {
    pub fn new(category: ContentCategory, reason: impl Into<String>) -> Self {
        Self {
            category,
            reason: reason.into(),
        }
    }
}

/// Outcome of running content through the moderation gate.
#[derive(Debug, Clone)]
pub struct ModerationResult {
    /// Whether the content may be stored
    pub allowed: bool,
    /// Why it was rejected (empty when allowed)
    pub issues: Vec<ModerationIssue>,
    /// The sanitized text; this is what gets persisted
    pub sanitized_content: String,
}

impl ModerationResult {
    pub fn allow(sanitized_content: String) -> Self {
        Self {
            allowed: true,
            issues: Vec::new(),
            sanitized_content,
        }
    }

    pub fn deny(issues: Vec<ModerationIssue>, sanitized_content: String) -> Self {
        Self {
            allowed: false,
            issues,
            sanitized_content,
        }
    }
}

/// Thresholds for the moderation gate and the report ledger.
#[derive(Debug, Clone)]
pub struct ModerationConfig {
    /// Content scoring strictly above this is rejected as spam
    pub spam_threshold: f64,
    /// Pending reports needed before content is hidden automatically
    pub auto_hide_report_threshold: u64,
}

impl Default for ModerationConfig {
    fn default() -> Self {
        Self {
            spam_threshold: 0.7,
            auto_hide_report_threshold: 3,
        }
    }
}

/// Lifecycle of an abuse report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportStatus {
    Pending,
    Resolved,
}

impl ReportStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportStatus::Pending => "pending",
            ReportStatus::Resolved => "resolved",
        }
    }
}

impl FromStr for ReportStatus {
    type Err = ModerationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(ReportStatus::Pending),
            "resolved" => Ok(ReportStatus::Resolved),
            _ => Err(ModerationError::InvalidStatus),
        }
    }
}

/// An abuse report filed against a post or comment.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    #[serde(rename = "_id")]
    pub id: String,
    pub content_id: String,
    pub reporter_alias: String,
    pub reason: String,
    pub category: ContentCategory,
    pub created_at: DateTime<Utc>,
    pub status: ReportStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolved_at: Option<DateTime<Utc>>,
}
