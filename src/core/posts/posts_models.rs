// Post domain models - posts and comments share one shape.
//
// A comment is a post with a parent; this mirrors how they are stored.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use super::posts_service::PostError;

/// Visibility of a post or comment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentStatus {
    Active,
    /// Hidden by moderation; excluded from public listings
    Hidden,
}

impl ContentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentStatus::Active => "active",
            ContentStatus::Hidden => "hidden",
        }
    }

    /// Parse a stored status. `None` for values never written by `as_str`.
    pub fn from_db(value: &str) -> Option<Self> {
        match value {
            "active" => Some(ContentStatus::Active),
            "hidden" => Some(ContentStatus::Hidden),
            _ => None,
        }
    }
}

/// A post or a comment.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    #[serde(rename = "_id")]
    pub id: String,
    /// Sanitized content
    pub content: String,
    /// Alias of the author
    pub alias: String,
    /// Set for comments, `None` for top-level posts
    pub parent_post_id: Option<String>,
    pub created_at: DateTime<Utc>,
    /// Aliases that liked this item
    pub likes: Vec<String>,
    pub comment_count: i64,
    pub status: ContentStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub moderated_at: Option<DateTime<Utc>>,
}

impl Post {
    pub fn is_comment(&self) -> bool {
        self.parent_post_id.is_some()
    }

    pub fn is_hidden(&self) -> bool {
        self.status == ContentStatus::Hidden
    }
}

/// Which listing of a user's own activity to show.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileKind {
    Posts,
    Comments,
    Likes,
}

impl FromStr for ProfileKind {
    type Err = PostError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "posts" => Ok(ProfileKind::Posts),
            "comments" => Ok(ProfileKind::Comments),
            "likes" => Ok(ProfileKind::Likes),
            _ => Err(PostError::InvalidProfileKind),
        }
    }
}

/// Filters a store can list and count by.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PostQuery {
    /// Visible top-level posts
    Feed,
    /// Visible comments under a post
    Comments { post_id: String },
    /// Top-level posts written by an alias, hidden ones included
    AuthoredPosts { alias: String },
    /// Comments written by an alias, hidden ones included
    AuthoredComments { alias: String },
    /// Anything the alias has liked
    LikedBy { alias: String },
}

impl PostQuery {
    pub fn for_profile(kind: ProfileKind, alias: &str) -> Self {
        let alias = alias.to_string();
        match kind {
            ProfileKind::Posts => PostQuery::AuthoredPosts { alias },
            ProfileKind::Comments => PostQuery::AuthoredComments { alias },
            ProfileKind::Likes => PostQuery::LikedBy { alias },
        }
    }
}

/// Result of toggling a like.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LikeToggle {
    /// Whether the alias likes the item after the toggle
    pub liked: bool,
    pub like_count: usize,
}
