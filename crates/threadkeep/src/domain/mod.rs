//! Domain types for posts and threaded comments.
//!
//! This module contains the value types shared by every storage backend:
//! posts, comments, their flat storage records, creation requests, and
//! pagination.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Unique identifier for a post
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PostId(pub Uuid);

/// Unique identifier for a comment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommentId(pub Uuid);

macro_rules! uuid_id {
    ($name:ident, $label:literal) => {
        impl $name {
            /// Generate a fresh random (v4) identifier.
            pub fn generate() -> Self {
                Self(Uuid::new_v4())
            }

            /// Parse an identifier supplied by an API caller.
            ///
            /// # Errors
            ///
            /// Returns `Error::BadRequest` if the input is not a UUID.
            pub fn parse(s: &str) -> Result<Self> {
                Uuid::parse_str(s.trim()).map(Self).map_err(|e| {
                    Error::BadRequest(format!("Invalid {} id '{}': {}", $label, s, e))
                })
            }

            /// The underlying UUID.
            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = Error;

            fn from_str(s: &str) -> Result<Self> {
                Self::parse(s)
            }
        }

        impl From<Uuid> for $name {
            fn from(id: Uuid) -> Self {
                Self(id)
            }
        }
    };
}

uuid_id!(PostId, "post");
uuid_id!(CommentId, "comment");

/// A post together with its derived comment thread
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    /// Unique identifier, generated on creation
    pub id: PostId,

    /// Post title
    pub title: String,

    /// Author name (free text)
    pub author: String,

    /// Post body
    pub content: String,

    /// Whether new comments may be attached to this post's thread
    pub commentable: bool,

    /// Root comments, assembled on read.
    ///
    /// Empty when the post was loaded with [`ThreadMode::MetadataOnly`].
    #[serde(default)]
    pub comments: Vec<Comment>,
}

impl Post {
    /// Total number of comments in the assembled thread.
    pub fn comment_count(&self) -> usize {
        self.comments
            .iter()
            .map(|c| 1 + c.descendant_count())
            .sum()
    }
}

/// A comment node inside an assembled thread
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    /// Unique identifier
    pub id: CommentId,

    /// The post this comment ultimately belongs to
    pub post_id: PostId,

    /// The comment this one replies to, `None` for root comments
    pub parent_id: Option<CommentId>,

    /// Author name (free text)
    pub author: String,

    /// Comment body
    pub content: String,

    /// Direct replies, in creation order
    #[serde(default)]
    pub children: Vec<Comment>,
}

impl Comment {
    /// Number of comments below this one, at any depth.
    pub fn descendant_count(&self) -> usize {
        let mut count = 0;
        let mut stack: Vec<&Comment> = self.children.iter().collect();
        while let Some(node) = stack.pop() {
            count += 1;
            stack.extend(node.children.iter());
        }
        count
    }
}

// Deep reply chains would otherwise recurse once per level in drop glue.
impl Drop for Comment {
    fn drop(&mut self) {
        let mut pending = std::mem::take(&mut self.children);
        while let Some(mut node) = pending.pop() {
            pending.append(&mut node.children);
        }
    }
}

/// Flat comment row as persisted by the stores.
///
/// This is the authoritative shape. [`Comment`] trees are always derived from
/// a set of these via [`crate::thread::assemble`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CommentRecord {
    /// Unique identifier
    pub id: CommentId,

    /// Owning post
    pub post_id: PostId,

    /// Parent comment, if this is a reply
    pub parent_id: Option<CommentId>,

    /// Author name
    pub author: String,

    /// Comment body
    pub content: String,
}

impl CommentRecord {
    /// Convert into a tree node with no children yet.
    pub fn into_leaf(self) -> Comment {
        Comment {
            id: self.id,
            post_id: self.post_id,
            parent_id: self.parent_id,
            author: self.author,
            content: self.content,
            children: Vec::new(),
        }
    }
}

impl From<&Comment> for CommentRecord {
    fn from(comment: &Comment) -> Self {
        Self {
            id: comment.id,
            post_id: comment.post_id,
            parent_id: comment.parent_id,
            author: comment.author.clone(),
            content: comment.content.clone(),
        }
    }
}

/// Data for creating a new post
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPost {
    /// Post title
    pub title: String,

    /// Author name
    pub author: String,

    /// Post body
    pub content: String,

    /// Initial value of the commentable flag
    pub commentable: bool,
}

/// Data for creating a new comment.
///
/// Exactly one of `post_id` and `parent_id` must be set. Use
/// [`NewComment::target`] to resolve which.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewComment {
    /// Author name
    pub author: String,

    /// Comment body
    pub content: String,

    /// Attach directly to this post
    #[serde(default)]
    pub post_id: Option<PostId>,

    /// Reply to this comment
    #[serde(default)]
    pub parent_id: Option<CommentId>,
}

impl NewComment {
    /// Build a request for a root comment on a post.
    pub fn on_post(post_id: PostId, author: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            author: author.into(),
            content: content.into(),
            post_id: Some(post_id),
            parent_id: None,
        }
    }

    /// Build a request for a reply to an existing comment.
    pub fn reply_to(
        parent_id: CommentId,
        author: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            author: author.into(),
            content: content.into(),
            post_id: None,
            parent_id: Some(parent_id),
        }
    }

    /// Resolve where this comment should be placed.
    ///
    /// # Errors
    ///
    /// Returns `Error::BadRequest` if both targets or neither target is set.
    pub fn target(&self) -> Result<CommentTarget> {
        match (self.post_id, self.parent_id) {
            (Some(post_id), None) => Ok(CommentTarget::Post(post_id)),
            (None, Some(parent_id)) => Ok(CommentTarget::Reply(parent_id)),
            (Some(_), Some(_)) => Err(Error::bad_request(
                "a comment must target either a post or a parent comment, not both",
            )),
            (None, None) => Err(Error::bad_request(
                "a comment must target either a post or a parent comment",
            )),
        }
    }
}

/// Placement of a new comment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommentTarget {
    /// Root comment on a post
    Post(PostId),

    /// Reply to an existing comment
    Reply(CommentId),
}

/// Offset/limit page request for post listings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    /// Number of posts to skip, in insertion order
    pub offset: i64,

    /// Maximum number of posts to return (must be positive)
    pub limit: i64,
}

/// Default page size used by callers that do not choose one
pub const DEFAULT_PAGE_SIZE: i64 = 20;

impl PageRequest {
    /// Create a page request.
    pub fn new(offset: i64, limit: i64) -> Self {
        Self { offset, limit }
    }

    /// First page of the given size.
    pub fn first(limit: i64) -> Self {
        Self::new(0, limit)
    }

    /// The page immediately after this one.
    pub fn next(&self) -> Self {
        Self::new(self.offset.saturating_add(self.limit), self.limit)
    }

    /// Validate and convert to `(offset, limit)` as unsigned sizes.
    ///
    /// # Errors
    ///
    /// Returns `Error::BadRequest` if `limit <= 0` or `offset < 0`.
    pub fn validate(&self) -> Result<(usize, usize)> {
        if self.limit <= 0 {
            return Err(Error::BadRequest(format!(
                "page limit must be positive, got {}",
                self.limit
            )));
        }
        if self.offset < 0 {
            return Err(Error::BadRequest(format!(
                "page offset cannot be negative, got {}",
                self.offset
            )));
        }
        let offset = usize::try_from(self.offset)
            .map_err(|_| Error::BadRequest(format!("page offset {} too large", self.offset)))?;
        let limit = usize::try_from(self.limit)
            .map_err(|_| Error::BadRequest(format!("page limit {} too large", self.limit)))?;
        Ok((offset, limit))
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::first(DEFAULT_PAGE_SIZE)
    }
}

/// One page of results
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    /// Items on this page, in insertion order
    pub items: Vec<T>,

    /// Whether more items exist beyond this page
    pub has_more: bool,
}

impl<T> Page<T> {
    /// An empty final page.
    pub fn empty() -> Self {
        Self {
            items: Vec::new(),
            has_more: false,
        }
    }
}

/// Whether post reads should assemble comment threads
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ThreadMode {
    /// Populate each post's comment forest
    #[default]
    Full,

    /// Return post metadata only, skipping comment queries
    MetadataOnly,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn comment_target_requires_exactly_one() {
        let post_id = PostId::generate();
        let parent_id = CommentId::generate();

        let on_post = NewComment::on_post(post_id, "ann", "hi");
        assert_eq!(on_post.target().unwrap(), CommentTarget::Post(post_id));

        let reply = NewComment::reply_to(parent_id, "bob", "re: hi");
        assert_eq!(reply.target().unwrap(), CommentTarget::Reply(parent_id));

        let both = NewComment {
            parent_id: Some(parent_id),
            ..on_post.clone()
        };
        assert!(matches!(both.target(), Err(Error::BadRequest(_))));

        let neither = NewComment {
            post_id: None,
            ..on_post
        };
        assert!(matches!(neither.target(), Err(Error::BadRequest(_))));
    }

    #[rstest]
    #[case(0, 0)]
    #[case(0, -1)]
    #[case(-1, 10)]
    #[case(5, i64::MIN)]
    fn page_request_rejects_invalid(#[case] offset: i64, #[case] limit: i64) {
        let err = PageRequest::new(offset, limit).validate().unwrap_err();
        assert!(matches!(err, Error::BadRequest(_)));
    }

    #[test]
    fn page_request_next_advances_by_limit() {
        let page = PageRequest::first(3);
        assert_eq!(page.validate().unwrap(), (0, 3));
        assert_eq!(page.next(), PageRequest::new(3, 3));
        assert_eq!(page.next().next().validate().unwrap(), (6, 3));
    }

    #[test]
    fn ids_parse_and_display_round_trip() {
        let id = PostId::generate();
        assert_eq!(PostId::parse(&id.to_string()).unwrap(), id);
        assert_eq!(format!(" {id} ").parse::<PostId>().unwrap(), id);
    }

    #[test]
    fn malformed_id_is_bad_request() {
        let err = CommentId::parse("not-a-uuid").unwrap_err();
        assert!(matches!(err, Error::BadRequest(ref msg) if msg.contains("comment")));
    }

    #[test]
    fn descendant_count_walks_every_level() {
        let post_id = PostId::generate();
        let leaf = |content: &str| Comment {
            id: CommentId::generate(),
            post_id,
            parent_id: None,
            author: "a".to_string(),
            content: content.to_string(),
            children: vec![],
        };

        let mut middle = leaf("middle");
        middle.children = vec![leaf("deep-1"), leaf("deep-2")];
        let mut root = leaf("root");
        root.children = vec![middle, leaf("sibling")];

        assert_eq!(root.descendant_count(), 4);

        let post = Post {
            id: post_id,
            title: "t".to_string(),
            author: "a".to_string(),
            content: "c".to_string(),
            commentable: true,
            comments: vec![root, leaf("other-root")],
        };
        assert_eq!(post.comment_count(), 6);
    }
}
