//! Error types for threadkeep operations.
//!
//! Every store returns the same closed [`Error`] enum. API layers that need a
//! coarse, comparable tag use [`Error::kind`], which groups variants the way a
//! transport would report them:
//!
//! - **Input problems** (permanent for the given request): `NotFound`,
//!   `NotCommentable`, `BadRequest`
//! - **Infrastructure problems** (the only retryable kind): `StorageUnavailable`
//! - **Caller gave up**: `Cancelled`

use crate::domain::{CommentId, PostId};
use std::io;
use thiserror::Error;

/// The error type for threadkeep operations.
#[derive(Debug, Error)]
pub enum Error {
    /// The referenced post does not exist.
    #[error("Post not found: {0}")]
    PostNotFound(PostId),

    /// The referenced comment does not exist.
    #[error("Comment not found: {0}")]
    CommentNotFound(CommentId),

    /// The target post's thread is closed.
    #[error("Post {0} is not accepting comments")]
    NotCommentable(PostId),

    /// Malformed request (both or neither comment targets, invalid pagination, bad id).
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// SQLite reported a failure.
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// The storage medium cannot serve the request.
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    /// IO error occurred.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// The operation context was cancelled by the caller.
    #[error("Operation cancelled")]
    Cancelled,

    /// The operation context's deadline passed.
    #[error("Operation deadline exceeded")]
    DeadlineExceeded,

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Coarse classification of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A referenced post or comment does not exist.
    NotFound,
    /// The target post does not accept comments.
    NotCommentable,
    /// The request itself is malformed.
    BadRequest,
    /// The underlying medium failed.
    StorageUnavailable,
    /// The caller cancelled or the deadline expired.
    Cancelled,
    /// Local configuration is invalid.
    Config,
}

impl ErrorKind {
    /// Returns `true` if retrying the same request may succeed.
    ///
    /// Only storage failures qualify. Comment creation is not idempotent, so
    /// whether to retry stays the caller's decision.
    #[must_use]
    pub fn is_retryable(self) -> bool {
        matches!(self, Self::StorageUnavailable)
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::NotFound => "not found",
            Self::NotCommentable => "not commentable",
            Self::BadRequest => "bad request",
            Self::StorageUnavailable => "storage unavailable",
            Self::Cancelled => "cancelled",
            Self::Config => "configuration",
        };
        f.write_str(name)
    }
}

impl Error {
    /// Classify this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::PostNotFound(_) | Self::CommentNotFound(_) => ErrorKind::NotFound,
            Self::NotCommentable(_) => ErrorKind::NotCommentable,
            Self::BadRequest(_) => ErrorKind::BadRequest,
            Self::Database(_) | Self::StorageUnavailable(_) | Self::Io(_) => {
                ErrorKind::StorageUnavailable
            }
            Self::Cancelled | Self::DeadlineExceeded => ErrorKind::Cancelled,
            Self::Config(_) => ErrorKind::Config,
        }
    }

    /// Shorthand for building a [`Error::BadRequest`].
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }
}

/// A specialized Result type for threadkeep operations.
pub type Result<T> = std::result::Result<T, Error>;
