// SQLite-backed report store for the abuse report ledger.
//
// Tables:
// - reports: One row per abuse report, pending until the content is moderated

use crate::core::moderation::{ModerationError, Report, ReportStatus, ReportStore};
use crate::infra::database::{from_db_time, to_db_time};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Pool, Row, Sqlite};

pub struct SqliteReportStore {
    pool: Pool<Sqlite>,
}

impl SqliteReportStore {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }

    /// Run database migrations to create required tables.
    pub async fn migrate(&self) -> Result<(), ModerationError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS reports (
                id TEXT PRIMARY KEY,
                content_id TEXT NOT NULL,
                reporter_alias TEXT NOT NULL,
                reason TEXT NOT NULL,
                category TEXT NOT NULL,
                created_at TEXT NOT NULL,
                status TEXT NOT NULL DEFAULT 'pending',
                resolved_at TEXT
            );
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| ModerationError::StorageError(e.to_string()))?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_reports_content_status ON reports(content_id, status)",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| ModerationError::StorageError(e.to_string()))?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_reports_created_at ON reports(created_at DESC)")
            .execute(&self.pool)
            .await
            .map_err(|e| ModerationError::StorageError(e.to_string()))?;

        // One pending report per reporter and content, even under concurrent inserts
        sqlx::query(
            r#"
            CREATE UNIQUE INDEX IF NOT EXISTS idx_reports_pending_reporter
            ON reports(content_id, reporter_alias) WHERE status = 'pending'
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| ModerationError::StorageError(e.to_string()))?;

        Ok(())
    }
}

#[async_trait]
impl ReportStore for SqliteReportStore {
    async fn insert_report(&self, report: &Report) -> Result<(), ModerationError> {
        sqlx::query(
            r#"
            INSERT INTO reports (id, content_id, reporter_alias, reason, category, created_at, status, resolved_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&report.id)
        .bind(&report.content_id)
        .bind(&report.reporter_alias)
        .bind(&report.reason)
        .bind(report.category.as_str())
        .bind(to_db_time(report.created_at))
        .bind(report.status.as_str())
        .bind(report.resolved_at.map(to_db_time))
        .execute(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                ModerationError::DuplicateReport
            }
            e => ModerationError::StorageError(e.to_string()),
        })?;
        Ok(())
    }

    async fn has_pending_report(
        &self,
        content_id: &str,
        reporter: &str,
    ) -> Result<bool, ModerationError> {
        let row = sqlx::query(
            r#"
            SELECT 1 FROM reports
            WHERE content_id = ? AND reporter_alias = ? AND status = 'pending'
            LIMIT 1
            "#,
        )
        .bind(content_id)
        .bind(reporter)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| ModerationError::StorageError(e.to_string()))?;

        Ok(row.is_some())
    }

    async fn count_pending(&self, content_id: &str) -> Result<u64, ModerationError> {
        let row = sqlx::query(
            "SELECT COUNT(*) FROM reports WHERE content_id = ? AND status = 'pending'",
        )
        .bind(content_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| ModerationError::StorageError(e.to_string()))?;

        Ok(row.get::<i64, _>(0) as u64)
    }

    async fn resolve_pending(
        &self,
        content_id: &str,
        at: DateTime<Utc>,
    ) -> Result<u64, ModerationError> {
        let result = sqlx::query(
            r#"
            UPDATE reports SET status = 'resolved', resolved_at = ?
            WHERE content_id = ? AND status = 'pending'
            "#,
        )
        .bind(to_db_time(at))
        .bind(content_id)
        .execute(&self.pool)
        .await
        .map_err(|e| ModerationError::StorageError(e.to_string()))?;

        Ok(result.rows_affected())
    }

    async fn list_reports(
        &self,
        status: ReportStatus,
        offset: u64,
        limit: u32,
    ) -> Result<Vec<Report>, ModerationError> {
        let rows = sqlx::query(
            r#"
            SELECT id, content_id, reporter_alias, reason, category, created_at, status, resolved_at
            FROM reports
            WHERE status = ?
            ORDER BY created_at DESC, rowid DESC
            LIMIT ? OFFSET ?
            "#,
        )
        .bind(status.as_str())
        .bind(limit as i64)
        .bind(offset as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| ModerationError::StorageError(e.to_string()))?;

        rows.iter().map(row_to_report).collect()
    }

    async fn count_reports(&self, status: ReportStatus) -> Result<u64, ModerationError> {
        let row = sqlx::query("SELECT COUNT(*) FROM reports WHERE status = ?")
            .bind(status.as_str())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| ModerationError::StorageError(e.to_string()))?;

        Ok(row.get::<i64, _>(0) as u64)
    }
}

fn row_to_report(row: &sqlx::sqlite::SqliteRow) -> Result<Report, ModerationError> {
    let category: String = row.get("category");
    let status: String = row.get("status");
    let created_at: String = row.get("created_at");
    let resolved_at: Option<String> = row.get("resolved_at");

    Ok(Report {
        id: row.get("id"),
        content_id: row.get("content_id"),
        reporter_alias: row.get("reporter_alias"),
        reason: row.get("reason"),
        category: category
            .parse()
            .map_err(|_| ModerationError::StorageError(format!("bad category {}", category)))?,
        created_at: from_db_time(&created_at)
            .map_err(|e| ModerationError::StorageError(format!("bad created_at: {}", e)))?,
        status: status
            .parse()
            .map_err(|_| ModerationError::StorageError(format!("bad status {}", status)))?,
        resolved_at: resolved_at
            .as_deref()
            .map(from_db_time)
            .transpose()
            .map_err(|e| ModerationError::StorageError(format!("bad resolved_at: {}", e)))?,
    })
}
