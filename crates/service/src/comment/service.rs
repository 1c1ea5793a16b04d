use std::sync::Arc;

use chrono::Utc;
use tracing::{info, instrument};
use uuid::Uuid;

use super::domain::{Comment, CommentInput};
use super::repository::CommentRepository;
use crate::authz::{ensure_can_mutate, Actor};
use crate::errors::ServiceError;

pub struct CommentService<R: CommentRepository> {
    repo: Arc<R>,
}

impl<R: CommentRepository> CommentService<R> {
    pub fn new(repo: Arc<R>) -> Self { Self { repo } }

    /// Comments of a post, newest first. An unknown post yields an empty list.
    #[instrument(skip(self))]
    pub async fn list_for_post(&self, post_id: Uuid) -> Result<Vec<Comment>, ServiceError> {
        self.repo.list_for_post(post_id).await
    }

    #[instrument(skip(self, actor, input), fields(actor = %actor.id))]
    pub async fn add(&self, actor: &Actor, post_id: Uuid, input: CommentInput) -> Result<Comment, ServiceError> {
        if !self.repo.post_exists(post_id).await? {
            return Err(ServiceError::not_found("Post"));
        }
        let text = input.validated_text()?;
        let created = self.repo.insert(post_id, actor.id, text).await?;
        info!(comment_id = %created.id, post_id = %post_id, "comment_added");
        Ok(created)
    }

    #[instrument(skip(self, actor, input), fields(actor = %actor.id))]
    pub async fn update(
        &self,
        actor: &Actor,
        post_id: Uuid,
        comment_id: Uuid,
        input: CommentInput,
    ) -> Result<Comment, ServiceError> {
        let current = self.scoped(post_id, comment_id).await?;
        ensure_can_mutate(actor, current.user_id, "update this comment")?;
        let text = input.validated_text()?;
        let updated = self.repo.update_text(comment_id, text, Utc::now().into()).await?;
        info!(comment_id = %comment_id, "comment_updated");
        Ok(updated)
    }

    #[instrument(skip(self, actor), fields(actor = %actor.id))]
    pub async fn delete(&self, actor: &Actor, post_id: Uuid, comment_id: Uuid) -> Result<(), ServiceError> {
        let current = self.scoped(post_id, comment_id).await?;
        ensure_can_mutate(actor, current.user_id, "delete this comment")?;
        self.repo.delete(comment_id).await?;
        info!(comment_id = %comment_id, "comment_deleted");
        Ok(())
    }

    /// The comment, if it exists under `post_id`.
    async fn scoped(&self, post_id: Uuid, comment_id: Uuid) -> Result<Comment, ServiceError> {
        self.repo
            .find(comment_id)
            .await?
            .filter(|c| c.post_id == post_id)
            .ok_or_else(|| ServiceError::not_found("Comment"))
    }
}
