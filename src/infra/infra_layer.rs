// The infra module contains implementations of core traits.
// Each feature implementation goes in its own submodule.

pub mod database;

#[path = "posts/sqlite_post_store.rs"]
pub mod posts;

#[path = "moderation/sqlite_report_store.rs"]
pub mod moderation;

#[path = "sessions/sqlite_session_store.rs"]
pub mod sessions;

#[cfg(test)]
pub mod test_support;
