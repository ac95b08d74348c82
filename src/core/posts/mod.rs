// Core posts module - posts, comments, likes and profile listings.

pub mod posts_models;
pub mod posts_service;

pub use posts_models::*;
pub use posts_service::*;
