// SQLite-backed session store: session id -> alias.

use crate::core::sessions::{SessionError, SessionStore};
use crate::infra::database::to_db_time;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Pool, Row, Sqlite};

pub struct SqliteSessionStore {
    pool: Pool<Sqlite>,
}

impl SqliteSessionStore {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }

    pub async fn migrate(&self) -> Result<(), SessionError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS sessions (
                id TEXT PRIMARY KEY,
                alias TEXT NOT NULL,
                created_at TEXT NOT NULL
            );
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| SessionError::StorageError(e.to_string()))?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_sessions_created_at ON sessions(created_at)")
            .execute(&self.pool)
            .await
            .map_err(|e| SessionError::StorageError(e.to_string()))?;

        Ok(())
    }
}

#[async_trait]
impl SessionStore for SqliteSessionStore {
    async fn get_alias(&self, session_id: &str) -> Result<Option<String>, SessionError> {
        let row = sqlx::query("SELECT alias FROM sessions WHERE id = ?")
            .bind(session_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| SessionError::StorageError(e.to_string()))?;

        Ok(row.map(|r| r.get("alias")))
    }

    async fn save_alias(
        &self,
        session_id: &str,
        alias: &str,
        at: DateTime<Utc>,
    ) -> Result<String, SessionError> {
        // Two racing requests may both try to assign; the first one wins
        sqlx::query(
            r#"
            INSERT INTO sessions (id, alias, created_at)
            VALUES (?, ?, ?)
            ON CONFLICT(id) DO NOTHING
            "#,
        )
        .bind(session_id)
        .bind(alias)
        .bind(to_db_time(at))
        .execute(&self.pool)
        .await
        .map_err(|e| SessionError::StorageError(e.to_string()))?;

        let row = sqlx::query("SELECT alias FROM sessions WHERE id = ?")
            .bind(session_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| SessionError::StorageError(e.to_string()))?;

        Ok(row.get("alias"))
    }

    async fn cleanup_expired(&self, older_than: DateTime<Utc>) -> Result<u64, SessionError> {
        let result = sqlx::query("DELETE FROM sessions WHERE created_at < ?")
            .bind(to_db_time(older_than))
            .execute(&self.pool)
            .await
            .map_err(|e| SessionError::StorageError(e.to_string()))?;

        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::test_support::memory_pool;
    use chrono::Duration;

    #[tokio::test]
    async fn test_first_alias_wins() {
        let store = SqliteSessionStore::new(memory_pool().await);

        assert_eq!(store.get_alias("s1").await.unwrap(), None);
        let saved = store.save_alias("s1", "CalmOwl_1", Utc::now()).await.unwrap();
        let again = store.save_alias("s1", "BlueMoon_2", Utc::now()).await.unwrap();

        assert_eq!(saved, "CalmOwl_1");
        assert_eq!(again, "CalmOwl_1");
    }

    #[tokio::test]
    async fn test_cleanup_expired() {
        let store = SqliteSessionStore::new(memory_pool().await);
        let now = Utc::now();
        store
            .save_alias("old", "CalmOwl_1", now - Duration::days(400))
            .await
            .unwrap();
        store.save_alias("new", "BlueMoon_2", now).await.unwrap();

        let removed = store
            .cleanup_expired(now - Duration::days(365))
            .await
            .unwrap();

        assert_eq!(removed, 1);
        assert!(store.get_alias("old").await.unwrap().is_none());
        assert!(store.get_alias("new").await.unwrap().is_some());
    }
}
