// Posts service - core business logic for posts, comments and likes.
//
// This service handles:
// - Screening new and edited content through the moderation gate
// - Ownership checks for edits and deletes
// - Keeping a post's comment counter in step with its comments
// - Like toggling and profile listings
//
// NO HTTP dependencies here - aliases arrive as plain strings.

use super::posts_models::{ContentStatus, LikeToggle, Post, PostQuery, ProfileKind};
use crate::core::moderation::{ContentModerator, ModerationIssue};
use crate::core::pagination::{Page, PageRequest};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, Error)]
pub enum PostError {
    #[error("Content is required")]
    EmptyContent,

    #[error("Content violates community guidelines")]
    Rejected(Vec<ModerationIssue>),

    #[error("Post not found")]
    PostNotFound,

    #[error("Comment not found")]
    CommentNotFound,

    #[error("Parent post not found")]
    ParentNotFound,

    #[error("Not authorized to {0}")]
    NotAuthor(&'static str),

    #[error("Failed to update post")]
    Unchanged,

    #[error("Invalid profile type")]
    InvalidProfileKind,

    #[error("Storage error: {0}")]
    StorageError(String),
}

// ============================================================================
// STORAGE TRAIT (PORT)
// ============================================================================

/// Trait for persisting posts, comments and likes.
#[async_trait]
pub trait PostStore: Send + Sync {
    async fn insert_post(&self, post: &Post) -> Result<(), PostError>;

    /// Insert a comment and bump its parent's counter in one step.
    async fn insert_comment(&self, comment: &Post) -> Result<(), PostError>;

    /// Fetch a post or comment by id, including its likes.
    async fn get_post(&self, id: &str) -> Result<Option<Post>, PostError>;

    /// List matching items, newest first.
    async fn list_posts(
        &self,
        query: &PostQuery,
        offset: u64,
        limit: u32,
    ) -> Result<Vec<Post>, PostError>;

    async fn count_posts(&self, query: &PostQuery) -> Result<u64, PostError>;

    /// Replace the content. Returns false when nothing was updated.
    async fn update_content(&self, id: &str, content: &str) -> Result<bool, PostError>;

    /// Delete an item together with its comments and likes. Returns rows removed.
    ///
    /// Deleting a comment decrements its parent's counter in the same step,
    /// never below zero.
    async fn delete_post(&self, id: &str) -> Result<u64, PostError>;

    async fn has_liked(&self, post_id: &str, alias: &str) -> Result<bool, PostError>;

    async fn add_like(&self, post_id: &str, alias: &str, at: DateTime<Utc>)
        -> Result<(), PostError>;

    async fn remove_like(&self, post_id: &str, alias: &str) -> Result<(), PostError>;

    /// Change visibility and stamp the moderation time. Returns false if the item is missing.
    async fn set_status(
        &self,
        id: &str,
        status: ContentStatus,
        at: DateTime<Utc>,
    ) -> Result<bool, PostError>;
}

// ============================================================================
// CORE SERVICE
// ============================================================================

pub struct PostService<S: PostStore> {
    store: S,
    moderator: ContentModerator,
}

impl<S: PostStore> PostService<S> {
    pub fn new(store: S, moderator: ContentModerator) -> Self {
        Self { store, moderator }
    }

    /// Visible top-level posts, newest first.
    pub async fn feed(&self, page: PageRequest) -> Result<Page<Post>, PostError> {
        self.list(PostQuery::Feed, page).await
    }

    /// Visible comments under a post, newest first.
    pub async fn comments(&self, post_id: &str, page: PageRequest) -> Result<Page<Post>, PostError> {
        self.list(
            PostQuery::Comments {
                post_id: post_id.to_string(),
            },
            page,
        )
        .await
    }

    /// The alias's own posts, comments, or liked items.
    pub async fn profile(
        &self,
        alias: &str,
        kind: ProfileKind,
        page: PageRequest,
    ) -> Result<Page<Post>, PostError> {
        self.list(PostQuery::for_profile(kind, alias), page).await
    }

    async fn list(&self, query: PostQuery, page: PageRequest) -> Result<Page<Post>, PostError> {
        let items = self
            .store
            .list_posts(&query, page.offset(), page.limit)
            .await?;
        let total = self.store.count_posts(&query).await?;
        Ok(Page::new(items, page, total))
    }

    pub async fn create_post(&self, alias: &str, raw: &str) -> Result<Post, PostError> {
        let content = self.screen(alias, raw)?;
        let post = new_item(alias, content, None);

        self.store.insert_post(&post).await?;
        info!(post_id = %post.id, alias, "Post created");
        Ok(post)
    }

    /// Edit a post or comment. Only the author may edit, and the new text is moderated.
    pub async fn update_post(&self, id: &str, alias: &str, raw: &str) -> Result<Post, PostError> {
        if raw.trim().is_empty() {
            return Err(PostError::EmptyContent);
        }

        let mut post = self
            .store
            .get_post(id)
            .await?
            .ok_or(PostError::PostNotFound)?;

        if post.alias != alias {
            return Err(PostError::NotAuthor("edit this post"));
        }

        let content = self.screen(alias, raw)?;
        if content == post.content {
            return Err(PostError::Unchanged);
        }

        if !self.store.update_content(id, &content).await? {
            return Err(PostError::Unchanged);
        }

        post.content = content;
        info!(post_id = id, "Post edited");
        Ok(post)
    }

    /// Delete a post (and its comments). Deleting a comment this way also fixes the parent counter.
    pub async fn delete_post(&self, id: &str, alias: &str) -> Result<(), PostError> {
        let post = self
            .store
            .get_post(id)
            .await?
            .ok_or(PostError::PostNotFound)?;

        if post.alias != alias {
            return Err(PostError::NotAuthor("delete this post"));
        }

        let removed = self.store.delete_post(id).await?;

        info!(post_id = id, removed, "Post deleted");
        Ok(())
    }

    pub async fn toggle_like(&self, id: &str, alias: &str) -> Result<LikeToggle, PostError> {
        let post = self
            .store
            .get_post(id)
            .await?
            .filter(|p| !p.is_hidden())
            .ok_or(PostError::PostNotFound)?;

        if self.store.has_liked(id, alias).await? {
            self.store.remove_like(id, alias).await?;
            let like_count = post.likes.iter().filter(|a| a.as_str() != alias).count();
            Ok(LikeToggle {
                liked: false,
                like_count,
            })
        } else {
            self.store.add_like(id, alias, Utc::now()).await?;
            Ok(LikeToggle {
                liked: true,
                like_count: post.likes.len() + 1,
            })
        }
    }

    /// Comment on a visible top-level post.
    pub async fn create_comment(
        &self,
        alias: &str,
        post_id: &str,
        raw: &str,
    ) -> Result<Post, PostError> {
        if raw.trim().is_empty() {
            return Err(PostError::EmptyContent);
        }

        let parent = self
            .store
            .get_post(post_id)
            .await?
            .filter(|p| !p.is_comment() && !p.is_hidden())
            .ok_or(PostError::ParentNotFound)?;

        let content = self.screen(alias, raw)?;
        let comment = new_item(alias, content, Some(parent.id.clone()));

        self.store.insert_comment(&comment).await?;

        info!(comment_id = %comment.id, post_id, alias, "Comment created");
        Ok(comment)
    }

    pub async fn delete_comment(&self, id: &str, alias: &str) -> Result<(), PostError> {
        let comment = self
            .store
            .get_post(id)
            .await?
            .filter(|p| p.is_comment())
            .ok_or(PostError::CommentNotFound)?;

        if comment.alias != alias {
            return Err(PostError::NotAuthor("delete this comment"));
        }

        self.store.delete_post(id).await?;

        info!(comment_id = id, "Comment deleted");
        Ok(())
    }

    /// Run text through the moderation gate and return what should be stored.
    fn screen(&self, alias: &str, raw: &str) -> Result<String, PostError> {
        if raw.trim().is_empty() {
            return Err(PostError::EmptyContent);
        }

        let result = self.moderator.moderate(raw);
        if !result.allowed {
            warn!(
                alias,
                issues = result.issues.len(),
                "Content rejected by moderation"
            );
            return Err(PostError::Rejected(result.issues));
        }

        // Markup-only input can sanitize down to nothing
        let content = result.sanitized_content.trim().to_string();
        if content.is_empty() {
            return Err(PostError::EmptyContent);
        }
        Ok(content)
    }
}

fn new_item(alias: &str, content: String, parent_post_id: Option<String>) -> Post {
    Post {
        id: Uuid::new_v4().to_string(),
        content,
        alias: alias.to_string(),
        parent_post_id,
        created_at: Utc::now(),
        likes: Vec::new(),
        comment_count: 0,
        status: ContentStatus::Active,
        moderated_at: None,
    }
}

// ============================================================================
// TESTS
// ============================================================================
