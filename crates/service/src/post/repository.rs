use async_trait::async_trait;
use models::{comment, post, user};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Unchanged, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, TransactionTrait,
};
use uuid::Uuid;

use super::domain::Post;
use super::query::PostQuery;
use crate::errors::ServiceError;

/// Persistence for posts. Implementations translate rows into `Post`.
#[async_trait]
pub trait PostRepository: Send + Sync {
    /// One page of matches plus the total match count ignoring pagination.
    async fn find_page(&self, query: &PostQuery) -> Result<(Vec<Post>, u64), ServiceError>;
    async fn find(&self, id: Uuid) -> Result<Option<Post>, ServiceError>;
    /// Like `find`, with the owner's display name filled in.
    async fn find_with_owner(&self, id: Uuid) -> Result<Option<Post>, ServiceError>;
    async fn insert(&self, post: &Post) -> Result<Post, ServiceError>;
    async fn update(&self, post: &Post) -> Result<Post, ServiceError>;
    /// Remove the post and its comments atomically; returns the number of comments removed.
    async fn delete_cascade(&self, id: Uuid) -> Result<u64, ServiceError>;
    async fn find_by_user(&self, user_id: Uuid) -> Result<Vec<Post>, ServiceError>;
}

pub struct SeaOrmPostRepository {
    pub db: DatabaseConnection,
}

impl SeaOrmPostRepository {
    pub fn new(db: DatabaseConnection) -> Self { Self { db } }
}

#[async_trait]
impl PostRepository for SeaOrmPostRepository {
    async fn find_page(&self, query: &PostQuery) -> Result<(Vec<Post>, u64), ServiceError> {
        let filtered = post::Entity::find().filter(query.condition.clone());
        let total = filtered.clone().count(&self.db).await?;

        let mut select = filtered;
        for key in &query.order {
            select = select.order_by(key.column, key.order());
        }
        let rows = select
            .offset(query.pagination.skip())
            .limit(query.pagination.limit)
            .all(&self.db)
            .await?;
        let posts = rows.into_iter().map(Post::try_from).collect::<Result<Vec<_>, _>>()?;
        Ok((posts, total))
    }

    async fn find(&self, id: Uuid) -> Result<Option<Post>, ServiceError> {
        post::Entity::find_by_id(id).one(&self.db).await?.map(Post::try_from).transpose()
    }

    async fn find_with_owner(&self, id: Uuid) -> Result<Option<Post>, ServiceError> {
        let found = post::Entity::find_by_id(id)
            .find_also_related(user::Entity)
            .one(&self.db)
            .await?;
        match found {
            None => Ok(None),
            Some((row, owner)) => {
                let mut post = Post::try_from(row)?;
                post.user_name = owner.map(|u| u.name);
                Ok(Some(post))
            }
        }
    }

    async fn insert(&self, post: &Post) -> Result<Post, ServiceError> {
        let row = post.to_active_model().insert(&self.db).await?;
        Post::try_from(row)
    }

    async fn update(&self, post: &Post) -> Result<Post, ServiceError> {
        let mut am = post::ActiveModel { id: Unchanged(post.id), ..Default::default() };
        post.write_row(&mut am);
        match am.update(&self.db).await {
            Ok(row) => Post::try_from(row),
            Err(DbErr::RecordNotUpdated) => Err(ServiceError::not_found("Post")),
            Err(e) => Err(e.into()),
        }
    }

    async fn delete_cascade(&self, id: Uuid) -> Result<u64, ServiceError> {
        let txn = self.db.begin().await?;
        let comments = comment::Entity::delete_many()
            .filter(comment::Column::PostId.eq(id))
            .exec(&txn)
            .await?
            .rows_affected;
        let removed = post::Entity::delete_by_id(id).exec(&txn).await?.rows_affected;
        if removed == 0 {
            txn.rollback().await?;
            return Err(ServiceError::not_found("Post"));
        }
        txn.commit().await?;
        Ok(comments)
    }

    async fn find_by_user(&self, user_id: Uuid) -> Result<Vec<Post>, ServiceError> {
        post::Entity::find()
            .filter(post::Column::UserId.eq(user_id))
            .order_by_desc(post::Column::CreatedAt)
            .order_by_asc(post::Column::Id)
            .all(&self.db)
            .await?
            .into_iter()
            .map(Post::try_from)
            .collect()
    }
}
