use async_trait::async_trait;
use chrono::{DateTime, FixedOffset};
use models::{comment, post, user};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Unchanged, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;

use super::domain::Comment;
use crate::errors::ServiceError;

#[async_trait]
pub trait CommentRepository: Send + Sync {
    async fn post_exists(&self, post_id: Uuid) -> Result<bool, ServiceError>;
    /// Newest first, ties broken by id; author names filled in.
    async fn list_for_post(&self, post_id: Uuid) -> Result<Vec<Comment>, ServiceError>;
    async fn find(&self, id: Uuid) -> Result<Option<Comment>, ServiceError>;
    async fn insert(&self, post_id: Uuid, user_id: Uuid, text: String) -> Result<Comment, ServiceError>;
    async fn update_text(&self, id: Uuid, text: String, at: DateTime<FixedOffset>) -> Result<Comment, ServiceError>;
    async fn delete(&self, id: Uuid) -> Result<(), ServiceError>;
}

pub struct SeaOrmCommentRepository {
    pub db: DatabaseConnection,
}

impl SeaOrmCommentRepository {
    pub fn new(db: DatabaseConnection) -> Self { Self { db } }

    async fn with_author(&self, id: Uuid) -> Result<Option<Comment>, ServiceError> {
        let found = comment::Entity::find_by_id(id)
            .find_also_related(user::Entity)
            .one(&self.db)
            .await?;
        Ok(found.map(|(row, author)| Comment::from_row(row, author.map(|u| u.name))))
    }
}

#[async_trait]
impl CommentRepository for SeaOrmCommentRepository {
    async fn post_exists(&self, post_id: Uuid) -> Result<bool, ServiceError> {
        let n = post::Entity::find().filter(post::Column::Id.eq(post_id)).count(&self.db).await?;
        Ok(n > 0)
    }

    async fn list_for_post(&self, post_id: Uuid) -> Result<Vec<Comment>, ServiceError> {
        let rows = comment::Entity::find()
            .filter(comment::Column::PostId.eq(post_id))
            .order_by_desc(comment::Column::CreatedAt)
            .order_by_desc(comment::Column::Id)
            .find_also_related(user::Entity)
            .all(&self.db)
            .await?;
        Ok(rows
            .into_iter()
            .map(|(row, author)| Comment::from_row(row, author.map(|u| u.name)))
            .collect())
    }

    async fn find(&self, id: Uuid) -> Result<Option<Comment>, ServiceError> {
        self.with_author(id).await
    }

    async fn insert(&self, post_id: Uuid, user_id: Uuid, text: String) -> Result<Comment, ServiceError> {
        let id = Uuid::new_v4();
        comment::ActiveModel {
            id: Set(id),
            text: Set(text),
            post_id: Set(post_id),
            user_id: Set(user_id),
            created_at: Set(chrono::Utc::now().into()),
            updated_at: Set(None),
        }
        .insert(&self.db)
        .await?;
        self.with_author(id).await?.ok_or_else(|| ServiceError::not_found("Comment"))
    }

    async fn update_text(&self, id: Uuid, text: String, at: DateTime<FixedOffset>) -> Result<Comment, ServiceError> {
        let am = comment::ActiveModel {
            id: Unchanged(id),
            text: Set(text),
            updated_at: Set(Some(at)),
            ..Default::default()
        };
        match am.update(&self.db).await {
            Ok(_) => {}
            Err(DbErr::RecordNotUpdated) => return Err(ServiceError::not_found("Comment")),
            Err(e) => return Err(e.into()),
        }
        self.with_author(id).await?.ok_or_else(|| ServiceError::not_found("Comment"))
    }

    async fn delete(&self, id: Uuid) -> Result<(), ServiceError> {
        let res = comment::Entity::delete_by_id(id).exec(&self.db).await?;
        if res.rows_affected == 0 {
            return Err(ServiceError::not_found("Comment"));
        }
        Ok(())
    }
}
