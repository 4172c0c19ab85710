//! Conversions between domain types and SQLite values.

use crate::domain::{CommentId, CommentRecord, Post, PostId};
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use rusqlite::Row;
use uuid::Uuid;

/// Decode a hyphenated UUID stored as TEXT.
fn uuid_from_sql(value: ValueRef<'_>) -> FromSqlResult<Uuid> {
    let text = value.as_str()?;
    Uuid::parse_str(text).map_err(|e| FromSqlError::Other(Box::new(e)))
}

impl ToSql for PostId {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_uuid().hyphenated().to_string()))
    }
}

impl FromSql for PostId {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        uuid_from_sql(value).map(Self)
    }
}

impl ToSql for CommentId {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_uuid().hyphenated().to_string()))
    }
}

impl FromSql for CommentId {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        uuid_from_sql(value).map(Self)
    }
}

/// Column list matching [`row_to_post`].
pub(super) const POST_COLUMNS: &str = "id, title, author, content, commentable";

/// Column list matching [`row_to_comment_record`].
pub(super) const COMMENT_COLUMNS: &str = "id, post_id, parent_comment_id, author, content";

/// Map a `posts` row to a post with an empty thread.
pub(super) fn row_to_post(row: &Row<'_>) -> rusqlite::Result<Post> {
    Ok(Post {
        id: row.get(0)?,
        title: row.get(1)?,
        author: row.get(2)?,
        content: row.get(3)?,
        commentable: row.get(4)?,
        comments: Vec::new(),
    })
}

/// Map a `comments` row to a flat record.
pub(super) fn row_to_comment_record(row: &Row<'_>) -> rusqlite::Result<CommentRecord> {
    Ok(CommentRecord {
        id: row.get(0)?,
        post_id: row.get(1)?,
        parent_id: row.get(2)?,
        author: row.get(3)?,
        content: row.get(4)?,
    })
}
