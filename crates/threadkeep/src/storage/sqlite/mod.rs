//! SQLite storage backend.
//!
//! Posts and comments live in two tables (see `schema`). The backend owns a
//! single connection behind a mutex; every operation runs on a blocking
//! thread via [`tokio::task::spawn_blocking`] so the async runtime never
//! blocks on disk I/O.
//!
//! ## Module Structure
//!
//! - `schema` - Database schema (DDL)
//! - `codec` - Id conversions and row mappers
//! - `queries` - Synchronous SQL operations
//!
//! ## Cancellation
//!
//! Each operation races its blocking job against [`OpContext::done`]. When the
//! context fires first the running statement is interrupted, but only if the
//! connection is still held by that same job, so a late interrupt can never
//! hit another caller's query. Writes re-check the context right before
//! `COMMIT`; an interrupted or cancelled write rolls back.

mod codec;
mod queries;
mod schema;

use crate::context::OpContext;
use crate::domain::{Comment, NewComment, NewPost, Page, PageRequest, Post, PostId, ThreadMode};
use crate::error::{Error, Result};
use crate::storage::PostStorage;
use async_trait::async_trait;
use rusqlite::{Connection, ErrorCode, InterruptHandle};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use schema::SCHEMA;
use tracing::{debug, warn};

/// Durable storage over a SQLite database.
#[derive(Clone)]
pub struct SqliteStorage {
    shared: Arc<Shared>,
}

struct Shared {
    conn: Mutex<Connection>,
    interrupt: InterruptHandle,

    /// Ticket of the job currently holding `conn`, if any
    active: Mutex<Option<u64>>,
    next_ticket: AtomicU64,
}

impl std::fmt::Debug for SqliteStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteStorage").finish_non_exhaustive()
    }
}

/// Marks a job as the connection holder for as long as it lives.
struct ActiveGuard<'a> {
    active: &'a Mutex<Option<u64>>,
}

impl<'a> ActiveGuard<'a> {
    fn enter(active: &'a Mutex<Option<u64>>, ticket: u64) -> Result<Self> {
        *lock(active, "active job")? = Some(ticket);
        Ok(Self { active })
    }
}

impl Drop for ActiveGuard<'_> {
    fn drop(&mut self) {
        if let Ok(mut active) = self.active.lock() {
            *active = None;
        }
    }
}

fn lock<'a, T>(mutex: &'a Mutex<T>, what: &str) -> Result<MutexGuard<'a, T>> {
    mutex.lock().map_err(|e| {
        Error::StorageUnavailable(format!(
            "{what} mutex poisoned (a thread panicked while holding the lock): {e}"
        ))
    })
}

fn is_interrupt(err: &Error) -> bool {
    match err {
        Error::Database(rusqlite::Error::SqliteFailure(e, _)) => {
            e.code == ErrorCode::OperationInterrupted
        }
        Error::Cancelled | Error::DeadlineExceeded => true,
        _ => false,
    }
}

impl SqliteStorage {
    /// Open or create the database file, creating parent directories.
    ///
    /// This blocks on disk I/O; async callers should go through
    /// [`crate::storage::create_storage`].
    ///
    /// # Errors
    ///
    /// Returns `Error::Io` if the directory cannot be created, or
    /// `Error::Database` if the file cannot be opened or migrated.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;

        // Enable WAL mode and foreign keys
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        conn.busy_timeout(std::time::Duration::from_secs(5))?;

        conn.execute_batch(SCHEMA)?;
        debug!(path = %path.display(), "Opened SQLite database");

        Ok(Self::from_connection(conn))
    }

    /// Open a private in-memory database with the same schema.
    ///
    /// # Errors
    ///
    /// Returns `Error::Database` if the schema cannot be applied.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self::from_connection(conn))
    }

    fn from_connection(conn: Connection) -> Self {
        let interrupt = conn.get_interrupt_handle();
        Self {
            shared: Arc::new(Shared {
                conn: Mutex::new(conn),
                interrupt,
                active: Mutex::new(None),
                next_ticket: AtomicU64::new(0),
            }),
        }
    }

    /// Run `job` against the connection on a blocking thread, bounded by `ctx`.
    async fn run<T, F>(&self, ctx: &OpContext, op: &'static str, job: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut Connection, &OpContext) -> Result<T> + Send + 'static,
    {
        ctx.check()?;

        let shared = Arc::clone(&self.shared);
        let ticket = shared.next_ticket.fetch_add(1, Ordering::Relaxed);
        let job_ctx = ctx.clone();

        let mut handle = tokio::task::spawn_blocking(move || {
            let mut conn = lock(&shared.conn, "database connection")?;
            // The caller may have given up while we waited for the lock.
            job_ctx.check()?;
            let _active = ActiveGuard::enter(&shared.active, ticket)?;
            job(&mut *conn, &job_ctx)
        });

        tokio::select! {
            joined = &mut handle => Self::joined(op, joined),
            ctx_err = ctx.done() => {
                self.interrupt_if_active(ticket);
                match handle.await {
                    // Finished before the interrupt landed; the result stands.
                    Ok(Ok(value)) => Ok(value),
                    Ok(Err(e)) if is_interrupt(&e) => {
                        debug!(op, "SQLite operation aborted by context");
                        Err(ctx_err)
                    }
                    joined => Self::joined(op, joined),
                }
            }
        }
    }

    fn joined<T>(
        op: &'static str,
        joined: std::result::Result<Result<T>, tokio::task::JoinError>,
    ) -> Result<T> {
        joined.map_err(|e| {
            warn!(op, error = %e, "SQLite worker task failed");
            Error::StorageUnavailable(format!("{op}: worker task failed: {e}"))
        })?
    }

    fn interrupt_if_active(&self, ticket: u64) {
        // Holding `active` keeps the job from releasing the connection while
        // we interrupt it.
        if let Ok(active) = self.shared.active.lock()
            && *active == Some(ticket)
        {
            self.shared.interrupt.interrupt();
        }
    }
}

#[async_trait]
impl PostStorage for SqliteStorage {
    async fn create_post(&self, ctx: &OpContext, new_post: NewPost) -> Result<Post> {
        let post = Post {
            id: PostId::generate(),
            title: new_post.title,
            author: new_post.author,
            content: new_post.content,
            commentable: new_post.commentable,
            comments: Vec::new(),
        };

        let created = self
            .run(ctx, "create_post", move |conn, _| {
                queries::insert_post(conn, &post)?;
                Ok(post)
            })
            .await?;
        debug!(post_id = %created.id, "Created post");
        Ok(created)
    }

    async fn get_post(&self, ctx: &OpContext, id: PostId) -> Result<Post> {
        self.run(ctx, "get_post", move |conn, _| queries::get_post(conn, id))
            .await
    }

    async fn list_posts(
        &self,
        ctx: &OpContext,
        page: &PageRequest,
        mode: ThreadMode,
    ) -> Result<Page<Post>> {
        let (offset, limit) = page.validate()?;
        self.run(ctx, "list_posts", move |conn, _| {
            queries::list_posts(conn, offset, limit, mode)
        })
        .await
    }

    async fn create_comment(&self, ctx: &OpContext, comment: NewComment) -> Result<Comment> {
        let target = comment.target()?;
        let NewComment {
            author, content, ..
        } = comment;

        let created = self
            .run(ctx, "create_comment", move |conn, ctx| {
                queries::insert_comment(conn, ctx, target, author, content)
            })
            .await?;

        debug!(
            comment_id = %created.id,
            post_id = %created.post_id,
            parent_id = ?created.parent_id,
            "Created comment"
        );
        Ok(created)
    }

    async fn set_commentable(&self, ctx: &OpContext, id: PostId, enabled: bool) -> Result<()> {
        self.run(ctx, "set_commentable", move |conn, _| {
            queries::set_commentable(conn, id, enabled)
        })
        .await?;
        debug!(post_id = %id, commentable = enabled, "Updated commentable flag");
        Ok(())
    }

    async fn count_comments(&self, ctx: &OpContext, id: PostId) -> Result<usize> {
        self.run(ctx, "count_comments", move |conn, _| {
            queries::count_comments(conn, id)
        })
        .await
    }
}
