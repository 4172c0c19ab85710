//! In-memory storage backend.
//!
//! This module provides a fast, **ephemeral** storage implementation where all
//! data is held in RAM and **lost when the process exits**. It is suitable for:
//!
//! - Testing and development
//! - Single-process deployments that do not need durability
//! - Reference behavior for the SQLite backend
//!
//! # Architecture
//!
//! The store is an arena of flat records addressed by generated id:
//!
//! - `Vec<PostRow>` in insertion order, plus `HashMap<PostId, usize>`
//! - `Vec<CommentRecord>` in insertion order, plus `HashMap<CommentId, usize>`
//! - `HashMap<PostId, Vec<usize>>` listing each post's comment positions
//!
//! Comment trees are never stored. Every read hands the post's records to
//! [`crate::thread::assemble`], exactly like the SQLite backend, so both
//! backends are observably equivalent.
//!
//! # Thread Safety
//!
//! One `tokio::sync::RwLock` guards the whole arena. Reads take shared access;
//! `create_post`, `create_comment` and `set_commentable` take exclusive access,
//! so every write is serialized process-wide. Lock waits race the caller's
//! [`OpContext`]: a cancelled caller gives up waiting and never mutates.
//!
//! # Performance Characteristics
//!
//! - Create post / comment: O(1) amortized
//! - Get post: O(c) where c is the post's comment count
//! - List posts: O(limit + c) for the page's comments

mod inner;
mod trait_impl;

use crate::context::OpContext;
use crate::error::Result;
use inner::InMemoryStorageInner;
use std::sync::Arc;
use tokio::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Thread-safe in-memory storage.
///
/// Cloning yields another handle to the same data.
#[derive(Clone, Default)]
pub struct InMemoryStorage {
    inner: Arc<RwLock<InMemoryStorageInner>>,
}

impl std::fmt::Debug for InMemoryStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryStorage")
            .field("inner", &"<RwLock<InMemoryStorageInner>>")
            .finish()
    }
}

impl InMemoryStorage {
    /// Create a new, empty in-memory store.
    ///
    /// # Example
    ///
    /// ```
    /// use threadkeep::storage::in_memory::InMemoryStorage;
    ///
    /// let storage = InMemoryStorage::new();
    /// ```
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquire shared access, giving up if the context fires first.
    async fn read(&self, ctx: &OpContext) -> Result<RwLockReadGuard<'_, InMemoryStorageInner>> {
        ctx.run(async { Ok(self.inner.read().await) }).await
    }

    /// Acquire exclusive access, giving up if the context fires first.
    async fn write(
        &self,
        ctx: &OpContext,
    ) -> Result<RwLockWriteGuard<'_, InMemoryStorageInner>> {
        ctx.run(async { Ok(self.inner.write().await) }).await
    }
}
