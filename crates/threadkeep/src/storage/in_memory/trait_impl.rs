//! PostStorage trait implementation for in-memory storage.

use super::InMemoryStorage;
use crate::context::OpContext;
use crate::domain::{Comment, NewComment, NewPost, Page, PageRequest, Post, PostId, ThreadMode};
use crate::error::Result;
use crate::storage::PostStorage;
use async_trait::async_trait;

#[async_trait]
impl PostStorage for InMemoryStorage {
    async fn create_post(&self, ctx: &OpContext, new_post: NewPost) -> Result<Post> {
        let mut inner = self.write(ctx).await?;
        let post = inner.insert_post(new_post);
        tracing::debug!(post_id = %post.id, "Created post");
        Ok(post)
    }

    async fn get_post(&self, ctx: &OpContext, id: PostId) -> Result<Post> {
        let inner = self.read(ctx).await?;
        inner.get_post(id)
    }

    async fn list_posts(
        &self,
        ctx: &OpContext,
        page: &PageRequest,
        mode: ThreadMode,
    ) -> Result<Page<Post>> {
        let (offset, limit) = page.validate()?;
        let inner = self.read(ctx).await?;
        Ok(inner.page(offset, limit, mode))
    }

    async fn create_comment(&self, ctx: &OpContext, comment: NewComment) -> Result<Comment> {
        // === Phase 1: Request shape (no lock needed) ===
        let target = comment.target()?;

        // === Phase 2: Check and insert under the exclusive lock ===
        let mut inner = self.write(ctx).await?;
        let created = inner.insert_comment(target, comment.author, comment.content)?;

        tracing::debug!(
            comment_id = %created.id,
            post_id = %created.post_id,
            parent_id = ?created.parent_id,
            "Created comment"
        );
        Ok(created)
    }

    async fn set_commentable(&self, ctx: &OpContext, id: PostId, enabled: bool) -> Result<()> {
        let mut inner = self.write(ctx).await?;
        inner.set_commentable(id, enabled)?;
        tracing::debug!(post_id = %id, commentable = enabled, "Updated commentable flag");
        Ok(())
    }

    async fn count_comments(&self, ctx: &OpContext, id: PostId) -> Result<usize> {
        let inner = self.read(ctx).await?;
        inner.count_comments(id)
    }
}
