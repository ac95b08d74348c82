// SQLite-backed post store.
//
// Tables:
// - posts: Posts and comments (comments carry parent_post_id)
// - post_likes: One row per (item, alias) like

use crate::core::posts::{ContentStatus, Post, PostError, PostQuery, PostStore};
use crate::infra::database::{from_db_time, to_db_time};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Pool, Row, Sqlite, SqliteConnection};

const SELECT_POSTS: &str = r#"
    SELECT p.id, p.content, p.alias, p.parent_post_id, p.created_at,
           p.comment_count, p.status, p.moderated_at,
           (SELECT json_group_array(l.alias) FROM post_likes l WHERE l.post_id = p.id) AS likes
    FROM posts p
"#;

#[derive(Clone)]
pub struct SqlitePostStore {
    pool: Pool<Sqlite>,
}

impl SqlitePostStore {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }

    /// Run database migrations to create required tables.
    pub async fn migrate(&self) -> Result<(), PostError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS posts (
                id TEXT PRIMARY KEY,
                content TEXT NOT NULL,
                alias TEXT NOT NULL,
                parent_post_id TEXT,
                created_at TEXT NOT NULL,
                comment_count INTEGER NOT NULL DEFAULT 0,
                status TEXT NOT NULL DEFAULT 'active',
                moderated_at TEXT
            );
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| PostError::StorageError(e.to_string()))?;

        for index in [
            "CREATE INDEX IF NOT EXISTS idx_posts_created_at ON posts(created_at DESC)",
            "CREATE INDEX IF NOT EXISTS idx_posts_alias ON posts(alias)",
            "CREATE INDEX IF NOT EXISTS idx_posts_parent ON posts(parent_post_id)",
            "CREATE INDEX IF NOT EXISTS idx_posts_status ON posts(status)",
        ] {
            sqlx::query(index)
                .execute(&self.pool)
                .await
                .map_err(|e| PostError::StorageError(e.to_string()))?;
        }

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS post_likes (
                post_id TEXT NOT NULL,
                alias TEXT NOT NULL,
                created_at TEXT NOT NULL,
                PRIMARY KEY (post_id, alias)
            );
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| PostError::StorageError(e.to_string()))?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_post_likes_alias ON post_likes(alias)")
            .execute(&self.pool)
            .await
            .map_err(|e| PostError::StorageError(e.to_string()))?;

        Ok(())
    }
}

/// WHERE clause for a query plus the single value it binds, if any.
fn filter_clause(query: &PostQuery) -> (&'static str, Option<&str>) {
    match query {
        PostQuery::Feed => ("p.parent_post_id IS NULL AND p.status != 'hidden'", None),
        PostQuery::Comments { post_id } => (
            "p.parent_post_id = ? AND p.status != 'hidden'",
            Some(post_id.as_str()),
        ),
        PostQuery::AuthoredPosts { alias } => (
            "p.alias = ? AND p.parent_post_id IS NULL",
            Some(alias.as_str()),
        ),
        PostQuery::AuthoredComments { alias } => (
            "p.alias = ? AND p.parent_post_id IS NOT NULL",
            Some(alias.as_str()),
        ),
        PostQuery::LikedBy { alias } => (
            "EXISTS (SELECT 1 FROM post_likes l WHERE l.post_id = p.id AND l.alias = ?)",
            Some(alias.as_str()),
        ),
    }
}

#[async_trait]
impl PostStore for SqlitePostStore {
    async fn insert_post(&self, post: &Post) -> Result<(), PostError> {
        let mut conn = self
            .pool
            .acquire()
            .await
            .map_err(|e| PostError::StorageError(e.to_string()))?;
        insert_row(&mut *conn, post).await
    }

    async fn insert_comment(&self, comment: &Post) -> Result<(), PostError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| PostError::StorageError(e.to_string()))?;

        insert_row(&mut *tx, comment).await?;
        sqlx::query("UPDATE posts SET comment_count = comment_count + 1 WHERE id = ?")
            .bind(&comment.parent_post_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| PostError::StorageError(e.to_string()))?;

        tx.commit()
            .await
            .map_err(|e| PostError::StorageError(e.to_string()))
    }

    async fn get_post(&self, id: &str) -> Result<Option<Post>, PostError> {
        let sql = format!("{} WHERE p.id = ?", SELECT_POSTS);
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| PostError::StorageError(e.to_string()))?;

        row.as_ref().map(row_to_post).transpose()
    }

    async fn list_posts(
        &self,
        query: &PostQuery,
        offset: u64,
        limit: u32,
    ) -> Result<Vec<Post>, PostError> {
        let (clause, value) = filter_clause(query);
        let sql = format!(
            "{} WHERE {} ORDER BY p.created_at DESC, p.rowid DESC LIMIT ? OFFSET ?",
            SELECT_POSTS, clause
        );

        let mut statement = sqlx::query(&sql);
        if let Some(value) = value {
            statement = statement.bind(value);
        }
        let rows = statement
            .bind(limit as i64)
            .bind(offset as i64)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| PostError::StorageError(e.to_string()))?;

        rows.iter().map(row_to_post).collect()
    }

    async fn count_posts(&self, query: &PostQuery) -> Result<u64, PostError> {
        let (clause, value) = filter_clause(query);
        let sql = format!("SELECT COUNT(*) FROM posts p WHERE {}", clause);

        let mut statement = sqlx::query(&sql);
        if let Some(value) = value {
            statement = statement.bind(value);
        }
        let row = statement
            .fetch_one(&self.pool)
            .await
            .map_err(|e| PostError::StorageError(e.to_string()))?;

        Ok(row.get::<i64, _>(0) as u64)
    }

    async fn update_content(&self, id: &str, content: &str) -> Result<bool, PostError> {
        let result = sqlx::query("UPDATE posts SET content = ? WHERE id = ?")
            .bind(content)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| PostError::StorageError(e.to_string()))?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_post(&self, id: &str) -> Result<u64, PostError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| PostError::StorageError(e.to_string()))?;

        // A deleted comment no longer counts towards its parent
        sqlx::query(
            r#"
            UPDATE posts SET comment_count = MAX(comment_count - 1, 0)
            WHERE id = (SELECT parent_post_id FROM posts WHERE id = ?)
            "#,
        )
        .bind(id)
        .execute(&mut *tx)
        .await
        .map_err(|e| PostError::StorageError(e.to_string()))?;

        sqlx::query(
            r#"
            DELETE FROM post_likes
            WHERE post_id = ? OR post_id IN (SELECT id FROM posts WHERE parent_post_id = ?)
            "#,
        )
        .bind(id)
        .bind(id)
        .execute(&mut *tx)
        .await
        .map_err(|e| PostError::StorageError(e.to_string()))?;

        let result = sqlx::query("DELETE FROM posts WHERE id = ? OR parent_post_id = ?")
            .bind(id)
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(|e| PostError::StorageError(e.to_string()))?;

        tx.commit()
            .await
            .map_err(|e| PostError::StorageError(e.to_string()))?;

        Ok(result.rows_affected())
    }

    async fn has_liked(&self, post_id: &str, alias: &str) -> Result<bool, PostError> {
        let row = sqlx::query("SELECT 1 FROM post_likes WHERE post_id = ? AND alias = ?")
            .bind(post_id)
            .bind(alias)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| PostError::StorageError(e.to_string()))?;

        Ok(row.is_some())
    }

    async fn add_like(
        &self,
        post_id: &str,
        alias: &str,
        at: DateTime<Utc>,
    ) -> Result<(), PostError> {
        sqlx::query(
            r#"
            INSERT INTO post_likes (post_id, alias, created_at)
            VALUES (?, ?, ?)
            ON CONFLICT(post_id, alias) DO NOTHING
            "#,
        )
        .bind(post_id)
        .bind(alias)
        .bind(to_db_time(at))
        .execute(&self.pool)
        .await
        .map_err(|e| PostError::StorageError(e.to_string()))?;
        Ok(())
    }

    async fn remove_like(&self, post_id: &str, alias: &str) -> Result<(), PostError> {
        sqlx::query("DELETE FROM post_likes WHERE post_id = ? AND alias = ?")
            .bind(post_id)
            .bind(alias)
            .execute(&self.pool)
            .await
            .map_err(|e| PostError::StorageError(e.to_string()))?;
        Ok(())
    }

    async fn set_status(
        &self,
        id: &str,
        status: ContentStatus,
        at: DateTime<Utc>,
    ) -> Result<bool, PostError> {
        let result = sqlx::query("UPDATE posts SET status = ?, moderated_at = ? WHERE id = ?")
            .bind(status.as_str())
            .bind(to_db_time(at))
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| PostError::StorageError(e.to_string()))?;

        Ok(result.rows_affected() > 0)
    }
}

async fn insert_row(conn: &mut SqliteConnection, post: &Post) -> Result<(), PostError> {
    sqlx::query(
        r#"
        INSERT INTO posts (id, content, alias, parent_post_id, created_at, comment_count, status, moderated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&post.id)
    .bind(&post.content)
    .bind(&post.alias)
    .bind(&post.parent_post_id)
    .bind(to_db_time(post.created_at))
    .bind(post.comment_count)
    .bind(post.status.as_str())
    .bind(post.moderated_at.map(to_db_time))
    .execute(conn)
    .await
    .map_err(|e| PostError::StorageError(e.to_string()))?;
    Ok(())
}

fn row_to_post(row: &sqlx::sqlite::SqliteRow) -> Result<Post, PostError> {
    let likes_json: String = row.get("likes");
    let created_at: String = row.get("created_at");
    let moderated_at: Option<String> = row.get("moderated_at");
    let status: String = row.get("status");

    Ok(Post {
        id: row.get("id"),
        content: row.get("content"),
        alias: row.get("alias"),
        parent_post_id: row.get("parent_post_id"),
        created_at: from_db_time(&created_at)
            .map_err(|e| PostError::StorageError(format!("bad created_at: {}", e)))?,
        likes: serde_json::from_str(&likes_json)
            .map_err(|e| PostError::StorageError(e.to_string()))?,
        comment_count: row.get("comment_count"),
        status: ContentStatus::from_db(&status)
            .ok_or_else(|| PostError::StorageError(format!("bad status {}", status)))?,
        moderated_at: moderated_at
            .as_deref()
            .map(from_db_time)
            .transpose()
            .map_err(|e| PostError::StorageError(format!("bad moderated_at: {}", e)))?,
    })
}
