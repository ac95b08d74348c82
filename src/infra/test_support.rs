// Test helpers shared by store, service and route tests.

use super::moderation::SqliteReportStore;
use super::posts::SqlitePostStore;
use super::sessions::SqliteSessionStore;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{Pool, Sqlite};

/// A fresh in-memory database with every table created.
///
/// Pinned to one connection: each SQLite memory connection is its own database.
pub async fn memory_pool() -> Pool<Sqlite> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
        .unwrap();

    SqlitePostStore::new(pool.clone()).migrate().await.unwrap();
    SqliteReportStore::new(pool.clone()).migrate().await.unwrap();
    SqliteSessionStore::new(pool.clone()).migrate().await.unwrap();

    pool
}
