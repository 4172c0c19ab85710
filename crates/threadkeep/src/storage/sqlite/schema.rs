//! Database schema definition for the SQLite backend.
//!
//! Column names and types match the relational layout shared with other
//! deployments of the platform. Ids are UUIDs in hyphenated text form.

/// Database schema definition.
pub(crate) const SCHEMA: &str = r"
-- Posts, in insertion order by rowid
CREATE TABLE IF NOT EXISTS posts (
    id UUID PRIMARY KEY,
    title TEXT NOT NULL,
    author TEXT NOT NULL,
    content TEXT NOT NULL,
    commentable BOOL NOT NULL
);

-- Comments; post_id is the owning post even for nested replies
CREATE TABLE IF NOT EXISTS comments (
    id UUID PRIMARY KEY,
    post_id UUID NOT NULL REFERENCES posts(id),
    parent_comment_id UUID REFERENCES comments(id),
    author TEXT NOT NULL,
    content TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_comments_post ON comments(post_id);
CREATE INDEX IF NOT EXISTS idx_comments_parent ON comments(parent_comment_id);
";
