//! Create `comment` table with FKs to `post` and `user`.
//!
//! The post FK does not cascade: comments are removed by the service inside
//! the same transaction that removes the post.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Comment::Table)
                    .if_not_exists()
                    .col(uuid(Comment::Id).primary_key())
                    .col(string_len(Comment::Text, 500).not_null())
                    .col(uuid(Comment::PostId).not_null())
                    .col(uuid(Comment::UserId).not_null())
                    .col(timestamp_with_time_zone(Comment::CreatedAt).not_null())
                    .col(
                        ColumnDef::new(Comment::UpdatedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_comment_post")
                            .from(Comment::Table, Comment::PostId)
                            .to(Post::Table, Post::Id)
                            .on_delete(ForeignKeyAction::Restrict)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_comment_user")
                            .from(Comment::Table, Comment::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Comment::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Comment { Table, Id, Text, PostId, UserId, CreatedAt, UpdatedAt }

#[derive(DeriveIden)]
enum Post { Table, Id }

#[derive(DeriveIden)]
enum User { Table, Id }
