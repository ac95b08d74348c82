// Shared SQLite plumbing: opening the pool and encoding timestamps.

use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use std::path::Path;
use std::str::FromStr;

/// Open a pool for `database_url`, creating the file (and its folder) if needed.
///
/// Accepts either a `sqlite:` URL or a bare file path.
pub async fn connect(database_url: &str) -> anyhow::Result<Pool<Sqlite>> {
    let conn_str = if database_url.starts_with("sqlite:") {
        database_url.to_string()
    } else {
        format!("sqlite://{}", database_url)
    };

    if !conn_str.contains(":memory:") {
        let path_str = conn_str
            .trim_start_matches("sqlite://")
            .trim_start_matches("sqlite:");
        let path_str = path_str.split('?').next().unwrap_or(path_str);
        if let Some(parent) = Path::new(path_str).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
    }

    let options = SqliteConnectOptions::from_str(&conn_str)?.create_if_missing(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;
    Ok(pool)
}

/// Fixed-width RFC 3339 so stored timestamps sort correctly as text.
pub fn to_db_time(time: DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn from_db_time(value: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    DateTime::parse_from_rfc3339(value).map(|dt| dt.with_timezone(&Utc))
}
