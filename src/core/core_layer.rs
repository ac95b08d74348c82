// The core module contains all business logic.
// Each feature gets its own submodule.

#[path = "moderation/mod.rs"]
pub mod moderation;

#[path = "posts/mod.rs"]
pub mod posts;

#[path = "sessions/session_service.rs"]
pub mod sessions;

pub mod pagination;
