//! Create `post` table.
//!
//! One flat row per listing. Job columns are filled only for `job` posts and
//! `provider` only for `service` posts; rating columns are never NULL.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Post::Table)
                    .if_not_exists()
                    .col(uuid(Post::Id).primary_key())
                    .col(string_len(Post::Title, 100).not_null())
                    .col(text(Post::Description).not_null())
                    .col(string_len(Post::PostType, 16).not_null())
                    .col(string_len(Post::Category, 128).not_null())
                    .col(string_len(Post::Location, 128).not_null())
                    .col(string_len(Post::ContactEmail, 255).not_null())
                    .col(string_len_null(Post::ContactPhone, 32))
                    .col(string_len(Post::DisplayContact, 16).not_null().default("email"))
                    .col(string_len_null(Post::Company, 255))
                    .col(string_len_null(Post::JobType, 32))
                    .col(string_len_null(Post::Salary, 128))
                    .col(text_null(Post::Requirements))
                    .col(string_len_null(Post::Provider, 255))
                    .col(double(Post::Rating).not_null().default(0.0))
                    .col(integer(Post::RatingCount).not_null().default(0))
                    .col(uuid(Post::UserId).not_null())
                    .col(timestamp_with_time_zone(Post::CreatedAt).not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_post_user")
                            .from(Post::Table, Post::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Post::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Post {
    Table,
    Id,
    Title,
    Description,
    PostType,
    Category,
    Location,
    ContactEmail,
    ContactPhone,
    DisplayContact,
    Company,
    JobType,
    Salary,
    Requirements,
    Provider,
    Rating,
    RatingCount,
    UserId,
    CreatedAt,
}

#[derive(DeriveIden)]
enum User { Table, Id }
