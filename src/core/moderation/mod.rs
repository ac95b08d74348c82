// Core moderation module - content screening and the abuse report ledger.
// Following the same layout as the posts module.

pub mod content_rules;
pub mod moderation_models;
pub mod moderation_service;

pub use moderation_models::*;
pub use moderation_service::*;
