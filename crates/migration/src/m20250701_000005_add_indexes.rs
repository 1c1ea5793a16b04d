use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Post: the common board filter is type + category
        manager
            .create_index(
                Index::create()
                    .name("idx_post_type_category")
                    .table(Post::Table)
                    .col(Post::PostType)
                    .col(Post::Category)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_post_user")
                    .table(Post::Table)
                    .col(Post::UserId)
                    .to_owned(),
            )
            .await?;

        // Default listing order
        manager
            .create_index(
                Index::create()
                    .name("idx_post_created_at")
                    .table(Post::Table)
                    .col(Post::CreatedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_comment_post")
                    .table(Comment::Table)
                    .col(Comment::PostId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(Index::drop().name("idx_post_type_category").table(Post::Table).to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_post_user").table(Post::Table).to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_post_created_at").table(Post::Table).to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_comment_post").table(Comment::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Post { Table, PostType, Category, UserId, CreatedAt }

#[derive(DeriveIden)]
enum Comment { Table, PostId }
