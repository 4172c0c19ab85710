//! SQL operations for the SQLite backend.
//!
//! These functions are synchronous and run on a blocking thread with the
//! connection already locked. Multi-statement reads run inside a deferred
//! transaction so they observe one snapshot.

// SQLite uses i64 for all integer storage. Offsets and limits arrive as
// validated non-negative i64 values, so the round trip through usize is exact.
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::cast_sign_loss)]

use super::codec::{row_to_comment_record, row_to_post, COMMENT_COLUMNS, POST_COLUMNS};
use crate::context::OpContext;
use crate::domain::{
    Comment, CommentId, CommentRecord, CommentTarget, Page, Post, PostId, ThreadMode,
};
use crate::error::{Error, Result};
use crate::thread;
use rusqlite::{params, Connection, OptionalExtension, Transaction, TransactionBehavior};
use std::collections::HashMap;
use tracing::trace;

// === Posts ===

pub(super) fn insert_post(conn: &Connection, post: &Post) -> Result<()> {
    conn.execute(
        "INSERT INTO posts (id, title, author, content, commentable) VALUES (?1, ?2, ?3, ?4, ?5)",
        params![post.id, post.title, post.author, post.content, post.commentable],
    )?;
    Ok(())
}

fn select_post(tx: &Transaction<'_>, id: PostId) -> Result<Option<Post>> {
    tx.query_row(
        &format!("SELECT {POST_COLUMNS} FROM posts WHERE id = ?1"),
        [id],
        row_to_post,
    )
    .optional()
    .map_err(Into::into)
}

/// Load one post and its assembled thread.
pub(super) fn get_post(conn: &mut Connection, id: PostId) -> Result<Post> {
    let tx = conn.transaction()?;
    let mut post = select_post(&tx, id)?.ok_or(Error::PostNotFound(id))?;
    let records = select_thread(&tx, id)?;
    trace!(post_id = %id, comments = records.len(), "Loaded thread records");
    post.comments = thread::assemble(records);
    tx.commit()?;
    Ok(post)
}

/// Load a page of posts in insertion order.
///
/// Fetches one extra row to decide `has_more`.
pub(super) fn list_posts(
    conn: &mut Connection,
    offset: usize,
    limit: usize,
    mode: ThreadMode,
) -> Result<Page<Post>> {
    let tx = conn.transaction()?;
    let sql_offset = offset as i64;
    let sql_limit = limit as i64;

    let mut posts: Vec<Post> = {
        let mut stmt = tx.prepare_cached(&format!(
            "SELECT {POST_COLUMNS} FROM posts ORDER BY rowid LIMIT ?1 OFFSET ?2"
        ))?;
        stmt.query_map(params![sql_limit.saturating_add(1), sql_offset], row_to_post)?
            .collect::<rusqlite::Result<_>>()?
    };

    let has_more = posts.len() > limit;
    posts.truncate(limit);

    if mode == ThreadMode::Full && !posts.is_empty() {
        let mut threads = select_page_threads(&tx, sql_offset, sql_limit)?;
        for post in &mut posts {
            if let Some(records) = threads.remove(&post.id) {
                post.comments = thread::assemble(records);
            }
        }
    }

    tx.commit()?;
    Ok(Page {
        items: posts,
        has_more,
    })
}

pub(super) fn set_commentable(conn: &Connection, id: PostId, enabled: bool) -> Result<()> {
    let updated = conn.execute(
        "UPDATE posts SET commentable = ?2 WHERE id = ?1",
        params![id, enabled],
    )?;
    if updated == 0 {
        return Err(Error::PostNotFound(id));
    }
    Ok(())
}

// === Comments ===

/// Every comment of one post, in insertion order.
fn select_thread(tx: &Transaction<'_>, post_id: PostId) -> Result<Vec<CommentRecord>> {
    let mut stmt = tx.prepare_cached(&format!(
        "SELECT {COMMENT_COLUMNS} FROM comments WHERE post_id = ?1 ORDER BY rowid"
    ))?;
    let records = stmt
        .query_map([post_id], row_to_comment_record)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(records)
}

/// Every comment of the posts in one page window, grouped by post.
///
/// Joins against the same `LIMIT/OFFSET` window as the post query instead of
/// binding one parameter per post, so page size is not bounded by SQLite's
/// variable limit.
fn select_page_threads(
    tx: &Transaction<'_>,
    offset: i64,
    limit: i64,
) -> Result<HashMap<PostId, Vec<CommentRecord>>> {
    let mut stmt = tx.prepare_cached(
        "SELECT c.id, c.post_id, c.parent_comment_id, c.author, c.content
         FROM comments c
         JOIN (SELECT id FROM posts ORDER BY rowid LIMIT ?1 OFFSET ?2) p ON c.post_id = p.id
         ORDER BY c.rowid",
    )?;

    let mut threads: HashMap<PostId, Vec<CommentRecord>> = HashMap::new();
    let rows = stmt.query_map(params![limit, offset], row_to_comment_record)?;
    for row in rows {
        let record = row?;
        threads.entry(record.post_id).or_default().push(record);
    }
    Ok(threads)
}

/// Check the target and insert a comment inside one write transaction.
///
/// `BEGIN IMMEDIATE` takes the write lock before the commentable flag is read,
/// so no `set_commentable` can commit between the check and the insert. Any
/// early return drops the transaction, which rolls it back.
pub(super) fn insert_comment(
    conn: &mut Connection,
    ctx: &OpContext,
    target: CommentTarget,
    author: String,
    content: String,
) -> Result<Comment> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    let (post_id, parent_id) = match target {
        CommentTarget::Post(post_id) => (post_id, None),
        CommentTarget::Reply(parent_id) => {
            let post_id: Option<PostId> = tx
                .query_row(
                    "SELECT post_id FROM comments WHERE id = ?1",
                    [parent_id],
                    |row| row.get(0),
                )
                .optional()?;
            (
                post_id.ok_or(Error::CommentNotFound(parent_id))?,
                Some(parent_id),
            )
        }
    };

    let commentable: Option<bool> = tx
        .query_row(
            "SELECT commentable FROM posts WHERE id = ?1",
            [post_id],
            |row| row.get(0),
        )
        .optional()?;
    match commentable {
        None => return Err(Error::PostNotFound(post_id)),
        Some(false) => return Err(Error::NotCommentable(post_id)),
        Some(true) => {}
    }

    let record = CommentRecord {
        id: CommentId::generate(),
        post_id,
        parent_id,
        author,
        content,
    };
    tx.execute(
        "INSERT INTO comments (id, post_id, parent_comment_id, author, content)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            record.id,
            record.post_id,
            record.parent_id,
            record.author,
            record.content
        ],
    )?;

    // Last chance to back out: a fired context rolls the insert back.
    ctx.check()?;
    tx.commit()?;

    Ok(record.into_leaf())
}

pub(super) fn count_comments(conn: &mut Connection, post_id: PostId) -> Result<usize> {
    let tx = conn.transaction()?;
    if select_post(&tx, post_id)?.is_none() {
        return Err(Error::PostNotFound(post_id));
    }
    let count: i64 = tx.query_row(
        "SELECT COUNT(*) FROM comments WHERE post_id = ?1",
        [post_id],
        |row| row.get(0),
    )?;
    tx.commit()?;
    Ok(count as usize)
}
