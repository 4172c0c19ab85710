//! Storage abstraction layer for threadkeep.
//!
//! This module provides the storage contract and a factory for creating
//! storage backends. It supports two implementations:
//!
//! - **In-memory**: Process-local arena of posts and comment records behind a
//!   single read/write lock
//! - **SQLite**: Durable relational storage with transactional writes
//!
//! # Architecture
//!
//! The storage layer uses an async trait so the in-memory backend (lock
//! waits) and the SQLite backend (blocking I/O moved off the runtime) share
//! one object-safe interface. Stores are shared as `Arc<dyn PostStorage>`;
//! every method takes `&self` and synchronizes internally.
//!
//! Both backends keep comments as flat [`CommentRecord`](crate::domain::CommentRecord)s
//! and build threads with [`crate::thread::assemble`] on every read.
//!
//! # Test Utilities
//!
//! This module provides a [`MockStorage`] implementation for testing code that
//! depends on the [`PostStorage`] trait. To use it in your tests, enable the
//! `test-util` feature:
//!
//! ```toml
//! [dev-dependencies]
//! threadkeep = { version = "...", features = ["test-util"] }
//! ```
//!
//! # Example
//!
//! ```no_run
//! use threadkeep::context::OpContext;
//! use threadkeep::domain::{NewComment, NewPost};
//! use threadkeep::storage::{create_storage, StorageBackend};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> anyhow::Result<()> {
//!     let storage = create_storage(StorageBackend::InMemory).await?;
//!     let ctx = OpContext::background();
//!
//!     let post = storage
//!         .create_post(
//!             &ctx,
//!             NewPost {
//!                 title: "Hello".to_string(),
//!                 author: "ann".to_string(),
//!                 content: "First post".to_string(),
//!                 commentable: true,
//!             },
//!         )
//!         .await?;
//!
//!     storage
//!         .create_comment(&ctx, NewComment::on_post(post.id, "bob", "Welcome!"))
//!         .await?;
//!
//!     Ok(())
//! }
//! ```

use crate::context::OpContext;
use crate::domain::{Comment, NewComment, NewPost, Page, PageRequest, Post, PostId, ThreadMode};
use crate::error::Result;
use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;

// Storage backend implementations
pub mod in_memory;
pub mod sqlite;

/// Core storage contract for posts and threaded comments.
///
/// This trait defines the interface for all storage backends. Implementations
/// must be `Send + Sync` so one instance can serve concurrent requests.
///
/// # Error Handling
///
/// All methods return `Result<T>` where the error is one of:
/// - `PostNotFound` / `CommentNotFound`: a referenced id does not exist
/// - `NotCommentable`: the target post's thread is closed
/// - `BadRequest`: malformed request
/// - `Database` / `StorageUnavailable`: the medium failed
/// - `Cancelled` / `DeadlineExceeded`: the [`OpContext`] fired
///
/// # Cancellation
///
/// A cancelled or expired context aborts the operation without leaving partial
/// state behind.
#[async_trait]
pub trait PostStorage: Send + Sync {
    /// Create a new post with a fresh id and an empty thread.
    async fn create_post(&self, ctx: &OpContext, post: NewPost) -> Result<Post>;

    /// Get a post with its full comment thread.
    ///
    /// # Errors
    ///
    /// Returns `Error::PostNotFound` if the post doesn't exist.
    async fn get_post(&self, ctx: &OpContext, id: PostId) -> Result<Post>;

    /// List posts in insertion order.
    ///
    /// Requesting past the end yields an empty page with `has_more == false`.
    /// With [`ThreadMode::MetadataOnly`] posts come back with empty
    /// `comments` and no comment data is read.
    ///
    /// # Errors
    ///
    /// Returns `Error::BadRequest` if `limit <= 0` or `offset < 0`.
    async fn list_posts(
        &self,
        ctx: &OpContext,
        page: &PageRequest,
        mode: ThreadMode,
    ) -> Result<Page<Post>>;

    /// Create a comment on a post or as a reply to another comment.
    ///
    /// The commentable check and the insert are atomic with respect to
    /// [`PostStorage::set_commentable`] on the same post. Replies inherit
    /// their `post_id` from the parent comment.
    ///
    /// # Errors
    ///
    /// - `Error::BadRequest` if both or neither targets are set
    /// - `Error::PostNotFound` / `Error::CommentNotFound` if the target doesn't exist
    /// - `Error::NotCommentable` if the owning post is closed for comments
    async fn create_comment(&self, ctx: &OpContext, comment: NewComment) -> Result<Comment>;

    /// Open or close a post's thread for new comments.
    ///
    /// # Errors
    ///
    /// Returns `Error::PostNotFound` if the post doesn't exist.
    async fn set_commentable(&self, ctx: &OpContext, id: PostId, enabled: bool) -> Result<()>;

    /// Count the comment records attached to a post, at any depth.
    ///
    /// # Errors
    ///
    /// Returns `Error::PostNotFound` if the post doesn't exist.
    async fn count_comments(&self, ctx: &OpContext, id: PostId) -> Result<usize>;
}

/// Storage backend configuration.
///
/// Determines which storage implementation to use.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageBackend {
    /// In-memory storage (ephemeral)
    InMemory,

    /// SQLite database file (persistent)
    Sqlite(PathBuf),

    /// SQLite database held in memory (ephemeral, same code path as `Sqlite`)
    SqliteInMemory,
}


/// Create a storage instance for the given backend.
///
/// # Errors
///
/// - `Error::Io` if the database directory cannot be created
/// - `Error::Database` if the database cannot be opened or migrated
pub async fn create_storage(backend: StorageBackend) -> Result<Arc<dyn PostStorage>> {
    match backend {
        StorageBackend::InMemory => {
            tracing::debug!("Using in-memory storage");
            Ok(Arc::new(in_memory::InMemoryStorage::new()))
        }
        StorageBackend::Sqlite(path) => {
            tracing::debug!(path = %path.display(), "Opening SQLite storage");
            let storage =
                tokio::task::spawn_blocking(move || sqlite::SqliteStorage::open(&path))
                    .await
                    .map_err(|e| {
                        crate::error::Error::StorageUnavailable(format!(
                            "failed to open database: {e}"
                        ))
                    })??;
            Ok(Arc::new(storage))
        }
        StorageBackend::SqliteInMemory => {
            tracing::debug!("Using in-memory SQLite storage");
            Ok(Arc::new(sqlite::SqliteStorage::open_in_memory()?))
        }
    }
}

// ========== Test Utilities ==========

/// Mock implementation of [`PostStorage`] for testing.
///
/// This is a **stateless** mock for verifying trait object usage. It never
/// stores anything.
///
/// # Behavior
///
/// - `create_post`: Echoes the request back as a post with a fresh id
/// - `get_post`: Always `PostNotFound`
/// - `list_posts`: Validates the page, then returns an empty page
/// - `create_comment`: Validates the target, then echoes a root or reply comment
/// - `set_commentable`, `count_comments`: Always `PostNotFound`
///
/// Use [`in_memory::InMemoryStorage`] when tests need real behavior.
#[cfg(any(test, feature = "test-util"))]
#[derive(Debug, Clone, Copy, Default)]
#[non_exhaustive]
pub struct MockStorage;

#[cfg(any(test, feature = "test-util"))]
impl MockStorage {
    /// Create a new MockStorage instance.
    pub fn new() -> Self {
        Self
    }
}

#[cfg(any(test, feature = "test-util"))]
#[async_trait]
impl PostStorage for MockStorage {
    async fn create_post(&self, ctx: &OpContext, post: NewPost) -> Result<Post> {
        ctx.check()?;
        Ok(Post {
            id: PostId::generate(),
            title: post.title,
            author: post.author,
            content: post.content,
            commentable: post.commentable,
            comments: vec![],
        })
    }

    async fn get_post(&self, ctx: &OpContext, id: PostId) -> Result<Post> {
        ctx.check()?;
        Err(crate::error::Error::PostNotFound(id))
    }

    async fn list_posts(
        &self,
        ctx: &OpContext,
        page: &PageRequest,
        _mode: ThreadMode,
    ) -> Result<Page<Post>> {
        ctx.check()?;
        page.validate()?;
        Ok(Page::empty())
    }

    async fn create_comment(&self, ctx: &OpContext, comment: NewComment) -> Result<Comment> {
        use crate::domain::{CommentId, CommentTarget};

        ctx.check()?;
        let (post_id, parent_id) = match comment.target()? {
            CommentTarget::Post(post_id) => (post_id, None),
            CommentTarget::Reply(parent_id) => (PostId::generate(), Some(parent_id)),
        };
        Ok(Comment {
            id: CommentId::generate(),
            post_id,
            parent_id,
            author: comment.author,
            content: comment.content,
            children: vec![],
        })
    }

    async fn set_commentable(&self, ctx: &OpContext, id: PostId, _enabled: bool) -> Result<()> {
        ctx.check()?;
        Err(crate::error::Error::PostNotFound(id))
    }

    async fn count_comments(&self, ctx: &OpContext, id: PostId) -> Result<usize> {
        ctx.check()?;
        Err(crate::error::Error::PostNotFound(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[tokio::test]
    async fn mock_storage_is_usable_as_trait_object() {
        let storage: Arc<dyn PostStorage> = Arc::new(MockStorage::new());
        let ctx = OpContext::background();

        let post = storage
            .create_post(
                &ctx,
                NewPost {
                    title: "t".to_string(),
                    author: "a".to_string(),
                    content: "c".to_string(),
                    commentable: true,
                },
            )
            .await
            .unwrap();
        assert_eq!(post.title, "t");

        let err = storage.get_post(&ctx, post.id).await.unwrap_err();
        assert!(matches!(err, Error::PostNotFound(id) if id == post.id));
    }

    #[tokio::test]
    async fn factory_builds_every_backend() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = OpContext::background();

        for backend in [
            StorageBackend::InMemory,
            StorageBackend::SqliteInMemory,
            StorageBackend::Sqlite(dir.path().join("nested").join("threads.db")),
        ] {
            let storage = create_storage(backend).await.unwrap();
            let page = storage
                .list_posts(&ctx, &PageRequest::default(), ThreadMode::Full)
                .await
                .unwrap();
            assert!(page.items.is_empty());
            assert!(!page.has_more);
        }
    }
}
