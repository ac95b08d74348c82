// This is the entry point of the Talking Helps server.
//
// **Architecture Overview:**
// - `core/` = Business logic (moderation, posts, sessions; no HTTP)
// - `infra/` = Implementations of core traits (SQLite stores)
// - `web/` = HTTP adapters (routes, cookies, error responses)
//
// This file's job is to:
// 1. Load configuration
// 2. Open the database and run migrations
// 3. Initialize services (dependency injection)
// 4. Start housekeeping and serve HTTP until shutdown

// These attrs point each module declaration at a more descriptive root file
// so we don't end up with half a dozen mod.rs files that all look the same.
#[path = "core/core_layer.rs"]
mod core;
#[path = "infra/infra_layer.rs"]
mod infra;
#[path = "web/web_layer.rs"]
mod web;

mod config;

use crate::config::Config;
use crate::infra::database;
use crate::infra::moderation::SqliteReportStore;
use crate::infra::posts::SqlitePostStore;
use crate::infra::sessions::SqliteSessionStore;
use crate::web::session::SESSION_LIFETIME_DAYS;
use crate::web::AppState;
use anyhow::Context;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

/// How often stale sessions and idle rate-limit windows are swept.
const HOUSEKEEPING_INTERVAL_SECS: u64 = 60 * 60;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file (if it exists)
    dotenv::dotenv().ok();

    // Initialize logging so we can see what's happening
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let config = Config::load()?;

    let pool = database::connect(&config.database_url)
        .await
        .with_context(|| format!("Failed to open database {}", config.database_url))?;

    // Every store owns its own tables
    SqlitePostStore::new(pool.clone()).migrate().await?;
    SqliteReportStore::new(pool.clone()).migrate().await?;
    SqliteSessionStore::new(pool.clone()).migrate().await?;
    info!("Database ready");

    let address = format!("0.0.0.0:{}", config.port);
    let state = AppState::new(pool, config);

    // Spawn a background task that forgets expired sessions and idle windows
    let sessions = std::sync::Arc::clone(&state.sessions);
    tokio::spawn(async move {
        use std::time::Duration as StdDuration;
        use tokio::time::sleep;

        loop {
            sleep(StdDuration::from_secs(HOUSEKEEPING_INTERVAL_SECS)).await;

            let now = chrono::Utc::now();
            let dropped = sessions.sweep_rate_limits(now);
            match sessions
                .expire_sessions(now, chrono::Duration::days(SESSION_LIFETIME_DAYS))
                .await
            {
                Ok(expired) => {
                    tracing::debug!(expired, dropped, "Housekeeping finished");
                }
                Err(e) => {
                    tracing::error!("Session cleanup failed: {}", e);
                }
            }
        }
    });

    let app = web::router(state);

    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind {address}"))?;
    info!("Server running on {address}");

    // Peer addresses key the rate limit for callers without a session
    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(web::shutdown_signal())
        .await?;

    info!("Server shut down");
    Ok(())
}
