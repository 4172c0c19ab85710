//! Service layer over the storage contract.
//!
//! [`Service`] is what API and CLI layers call. It delegates to a shared
//! [`PostStorage`], logs each operation, and publishes every created comment
//! so observers can follow a post's thread as it grows.

use crate::context::OpContext;
use crate::domain::{Comment, NewComment, NewPost, Page, PageRequest, Post, PostId, ThreadMode};
use crate::error::Result;
use crate::storage::PostStorage;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{info, warn};

/// Buffered comment events per subscriber before it starts lagging.
const EVENT_CAPACITY: usize = 256;

/// Orchestrates storage calls and comment notifications.
#[derive(Clone)]
pub struct Service {
    storage: Arc<dyn PostStorage>,
    events: broadcast::Sender<Comment>,
}

impl std::fmt::Debug for Service {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Service")
            .field("subscribers", &self.events.receiver_count())
            .finish_non_exhaustive()
    }
}

impl Service {
    /// Wrap a storage backend.
    pub fn new(storage: Arc<dyn PostStorage>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self { storage, events }
    }

    /// Follow new comments on one post.
    pub fn subscribe(&self, post_id: PostId) -> CommentSubscription {
        CommentSubscription {
            post_id,
            rx: self.events.subscribe(),
        }
    }

    /// Create a post.
    ///
    /// # Errors
    ///
    /// Propagates storage errors.
    pub async fn create_post(&self, ctx: &OpContext, post: NewPost) -> Result<Post> {
        let post = self.storage.create_post(ctx, post).await?;
        info!(post_id = %post.id, commentable = post.commentable, "Post created");
        Ok(post)
    }

    /// Fetch a post with its thread.
    ///
    /// # Errors
    ///
    /// Propagates storage errors.
    pub async fn get_post(&self, ctx: &OpContext, id: PostId) -> Result<Post> {
        self.storage.get_post(ctx, id).await
    }

    /// List a page of posts.
    ///
    /// # Errors
    ///
    /// Propagates storage errors.
    pub async fn list_posts(
        &self,
        ctx: &OpContext,
        page: &PageRequest,
        mode: ThreadMode,
    ) -> Result<Page<Post>> {
        self.storage.list_posts(ctx, page, mode).await
    }

    /// Create a comment and notify subscribers of its post.
    ///
    /// # Errors
    ///
    /// Propagates storage errors. Nothing is published on failure.
    pub async fn create_comment(&self, ctx: &OpContext, comment: NewComment) -> Result<Comment> {
        let comment = self.storage.create_comment(ctx, comment).await?;
        info!(
            comment_id = %comment.id,
            post_id = %comment.post_id,
            reply = comment.parent_id.is_some(),
            "Comment created"
        );

        // No receivers is not an error.
        let _ = self.events.send(comment.clone());
        Ok(comment)
    }

    /// Open or close a post for comments.
    ///
    /// # Errors
    ///
    /// Propagates storage errors.
    pub async fn set_commentable(&self, ctx: &OpContext, id: PostId, enabled: bool) -> Result<()> {
        self.storage.set_commentable(ctx, id, enabled).await?;
        info!(post_id = %id, commentable = enabled, "Commenting toggled");
        Ok(())
    }

    /// Count a post's comments at any depth.
    ///
    /// # Errors
    ///
    /// Propagates storage errors.
    pub async fn count_comments(&self, ctx: &OpContext, id: PostId) -> Result<usize> {
        self.storage.count_comments(ctx, id).await
    }
}

/// Stream of comments created on one post after subscribing.
#[derive(Debug)]
pub struct CommentSubscription {
    post_id: PostId,
    rx: broadcast::Receiver<Comment>,
}

impl CommentSubscription {
    /// The post this subscription follows.
    pub fn post_id(&self) -> PostId {
        self.post_id
    }

    /// Wait for the next comment on the post.
    ///
    /// Returns `None` once the service is gone. A subscriber that falls
    /// behind skips the comments it missed.
    pub async fn next(&mut self) -> Option<Comment> {
        loop {
            match self.rx.recv().await {
                Ok(comment) if comment.post_id == self.post_id => return Some(comment),
                Ok(_) => {}
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(post_id = %self.post_id, skipped, "Comment subscriber lagged");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}
