use std::sync::Arc;

use sqlx::{Pool, Sqlite};

use crate::config::Config;
use crate::core::moderation::{ContentModerator, ReportService};
use crate::core::posts::PostService;
use crate::core::sessions::SessionService;
use crate::infra::moderation::SqliteReportStore;
use crate::infra::posts::SqlitePostStore;
use crate::infra::sessions::SqliteSessionStore;

/// Shared handles every handler can reach.
#[derive(Clone)]
pub struct AppState {
    pub posts: Arc<PostService<SqlitePostStore>>,
    pub reports: Arc<ReportService<SqliteReportStore, SqlitePostStore>>,
    pub sessions: Arc<SessionService<SqliteSessionStore>>,
    pub config: Arc<Config>,
}

impl AppState {
    /// Wire the services over one pool. Tables must already be migrated.
    pub fn new(pool: Pool<Sqlite>, config: Config) -> Self {
        let post_store = SqlitePostStore::new(pool.clone());
        let moderator = ContentModerator::new(config.moderation());

        Self {
            posts: Arc::new(PostService::new(post_store.clone(), moderator)),
            reports: Arc::new(ReportService::new(
                SqliteReportStore::new(pool.clone()),
                post_store,
                config.moderation(),
            )),
            sessions: Arc::new(SessionService::new(
                SqliteSessionStore::new(pool),
                config.rate_limit(),
            )),
            config: Arc::new(config),
        }
    }
}
