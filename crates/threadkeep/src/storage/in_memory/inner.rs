//! Core in-memory storage data structures.
//!
//! This module contains the arena that holds all records. It is not
//! thread-safe on its own; [`super::InMemoryStorage`] wraps it in a lock.

use crate::domain::{
    Comment, CommentId, CommentRecord, CommentTarget, NewPost, Page, Post, PostId, ThreadMode,
};
use crate::error::{Error, Result};
use crate::thread;
use std::collections::HashMap;

/// Post metadata as stored. The thread is derived on read.
#[derive(Debug, Clone)]
pub(super) struct PostRow {
    pub(super) id: PostId,
    pub(super) title: String,
    pub(super) author: String,
    pub(super) content: String,
    pub(super) commentable: bool,
}

/// Inner storage structure (not thread-safe).
///
/// All relations are positions into the record vectors, never references, so
/// no record can alias or own another.
#[derive(Debug, Default)]
pub(crate) struct InMemoryStorageInner {
    /// Posts in insertion order
    posts: Vec<PostRow>,

    /// Post id -> position in `posts`
    post_index: HashMap<PostId, usize>,

    /// Comment records in insertion order
    comments: Vec<CommentRecord>,

    /// Comment id -> position in `comments`
    comment_index: HashMap<CommentId, usize>,

    /// Post id -> positions of its comments in `comments`, in insertion order
    threads: HashMap<PostId, Vec<usize>>,
}

impl InMemoryStorageInner {
    /// Store a new post and return it with an empty thread.
    pub(super) fn insert_post(&mut self, new_post: NewPost) -> Post {
        let mut id = PostId::generate();
        while self.post_index.contains_key(&id) {
            id = PostId::generate();
        }

        let row = PostRow {
            id,
            title: new_post.title,
            author: new_post.author,
            content: new_post.content,
            commentable: new_post.commentable,
        };

        self.post_index.insert(id, self.posts.len());
        self.posts.push(row.clone());
        self.threads.insert(id, Vec::new());

        self.view(&row, ThreadMode::MetadataOnly)
    }

    fn post_row(&self, id: PostId) -> Result<&PostRow> {
        self.post_index
            .get(&id)
            .map(|&pos| &self.posts[pos])
            .ok_or(Error::PostNotFound(id))
    }

    /// Assemble a post value from its row.
    fn view(&self, row: &PostRow, mode: ThreadMode) -> Post {
        let comments = match mode {
            ThreadMode::Full => thread::assemble(self.thread_records(row.id)),
            ThreadMode::MetadataOnly => Vec::new(),
        };

        Post {
            id: row.id,
            title: row.title.clone(),
            author: row.author.clone(),
            content: row.content.clone(),
            commentable: row.commentable,
            comments,
        }
    }

    /// Flat records of one post's thread, in insertion order.
    fn thread_records(&self, post_id: PostId) -> Vec<CommentRecord> {
        self.threads
            .get(&post_id)
            .map(|positions| {
                positions
                    .iter()
                    .map(|&pos| self.comments[pos].clone())
                    .collect()
            })
            .unwrap_or_default()
    }

    pub(super) fn get_post(&self, id: PostId) -> Result<Post> {
        let row = self.post_row(id)?;
        Ok(self.view(row, ThreadMode::Full))
    }

    /// Page of posts in insertion order. `offset` and `limit` are pre-validated.
    pub(super) fn page(&self, offset: usize, limit: usize, mode: ThreadMode) -> Page<Post> {
        if offset >= self.posts.len() {
            return Page::empty();
        }

        let end = offset.saturating_add(limit).min(self.posts.len());
        let items = self.posts[offset..end]
            .iter()
            .map(|row| self.view(row, mode))
            .collect();

        Page {
            items,
            has_more: end < self.posts.len(),
        }
    }

    /// Check the target and insert a comment record.
    ///
    /// Every check runs before any mutation, so a failed call changes nothing.
    pub(super) fn insert_comment(
        &mut self,
        target: CommentTarget,
        author: String,
        content: String,
    ) -> Result<Comment> {
        let (post_id, parent_id) = match target {
            CommentTarget::Post(post_id) => (post_id, None),
            CommentTarget::Reply(parent_id) => {
                let parent_pos = *self
                    .comment_index
                    .get(&parent_id)
                    .ok_or(Error::CommentNotFound(parent_id))?;
                (self.comments[parent_pos].post_id, Some(parent_id))
            }
        };

        let post = self.post_row(post_id)?;
        if !post.commentable {
            return Err(Error::NotCommentable(post_id));
        }

        let mut id = CommentId::generate();
        while self.comment_index.contains_key(&id) {
            id = CommentId::generate();
        }

        let record = CommentRecord {
            id,
            post_id,
            parent_id,
            author,
            content,
        };

        let pos = self.comments.len();
        self.comments.push(record.clone());
        self.comment_index.insert(id, pos);
        self.threads.entry(post_id).or_default().push(pos);

        Ok(record.into_leaf())
    }

    pub(super) fn set_commentable(&mut self, id: PostId, enabled: bool) -> Result<()> {
        let pos = *self.post_index.get(&id).ok_or(Error::PostNotFound(id))?;
        self.posts[pos].commentable = enabled;
        Ok(())
    }

    pub(super) fn count_comments(&self, id: PostId) -> Result<usize> {
        self.post_row(id)?;
        Ok(self.threads.get(&id).map_or(0, Vec::len))
    }

    #[cfg(test)]
    pub(super) fn post_count(&self) -> usize {
        self.posts.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_post(commentable: bool) -> NewPost {
        NewPost {
            title: "title".to_string(),
            author: "author".to_string(),
            content: "content".to_string(),
            commentable,
        }
    }

    #[test]
    fn reply_inherits_post_from_parent() {
        let mut inner = InMemoryStorageInner::default();
        let post = inner.insert_post(new_post(true));

        let root = inner
            .insert_comment(CommentTarget::Post(post.id), "a".into(), "root".into())
            .unwrap();
        let reply = inner
            .insert_comment(CommentTarget::Reply(root.id), "b".into(), "reply".into())
            .unwrap();

        assert_eq!(reply.post_id, post.id);
        assert_eq!(reply.parent_id, Some(root.id));
        assert_eq!(inner.count_comments(post.id).unwrap(), 2);
    }

    #[test]
    fn failed_insert_leaves_arena_untouched() {
        let mut inner = InMemoryStorageInner::default();
        let post = inner.insert_post(new_post(false));

        let err = inner
            .insert_comment(CommentTarget::Post(post.id), "a".into(), "x".into())
            .unwrap_err();

        assert!(matches!(err, Error::NotCommentable(id) if id == post.id));
        assert!(inner.comments.is_empty());
        assert!(inner.comment_index.is_empty());
        assert_eq!(inner.count_comments(post.id).unwrap(), 0);
    }

    #[test]
    fn page_past_end_is_empty() {
        let mut inner = InMemoryStorageInner::default();
        for _ in 0..3 {
            inner.insert_post(new_post(true));
        }
        assert_eq!(inner.post_count(), 3);

        let page = inner.page(3, 10, ThreadMode::Full);
        assert!(page.items.is_empty());
        assert!(!page.has_more);

        let page = inner.page(1, 1, ThreadMode::Full);
        assert_eq!(page.items.len(), 1);
        assert!(page.has_more);
    }
}
