use sea_orm_migration::prelude::*;

use crate::m20240601_000002_create_posts::Posts;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Comments::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Comments::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Comments::PostSlug).string().not_null())
                    .col(ColumnDef::new(Comments::UserId).uuid().not_null())
                    .col(ColumnDef::new(Comments::Content).text().not_null())
                    .col(
                        ColumnDef::new(Comments::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_comments_post")
                            .from(Comments::Table, Comments::PostSlug)
                            .to(Posts::Table, Posts::Slug)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_comments_post_slug")
                    .table(Comments::Table)
                    .col(Comments::PostSlug)
                    .col(Comments::CreatedAt)
                    .to_owned(),
            )
            .await?;

        create_reaction_table(manager, PostLikes::Table, "post_likes").await?;
        create_reaction_table(manager, PostBookmarks::Table, "post_bookmarks").await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(PostBookmarks::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(PostLikes::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Comments::Table).to_owned())
            .await
    }
}

/// Likes and bookmarks share a shape: one row per `(post_slug, user_id)`.
async fn create_reaction_table<T>(
    manager: &SchemaManager<'_>,
    table: T,
    name: &str,
) -> Result<(), DbErr>
where
    T: IntoIden + Clone + 'static,
{
    manager
        .create_table(
            Table::create()
                .table(table.clone())
                .if_not_exists()
                .col(ColumnDef::new(Reaction::PostSlug).string().not_null())
                .col(ColumnDef::new(Reaction::UserId).uuid().not_null())
                .col(
                    ColumnDef::new(Reaction::CreatedAt)
                        .timestamp_with_time_zone()
                        .not_null()
                        .default(Expr::current_timestamp()),
                )
                .primary_key(
                    Index::create()
                        .col(Reaction::PostSlug)
                        .col(Reaction::UserId),
                )
                .foreign_key(
                    ForeignKey::create()
                        .name(format!("fk_{name}_post"))
                        .from(table, Reaction::PostSlug)
                        .to(Posts::Table, Posts::Slug)
                        .on_delete(ForeignKeyAction::Cascade),
                )
                .to_owned(),
        )
        .await
}

#[derive(DeriveIden)]
enum Comments {
    Table,
    Id,
    PostSlug,
    UserId,
    Content,
    CreatedAt,
}

#[derive(DeriveIden, Clone)]
enum PostLikes {
    Table,
}

#[derive(DeriveIden, Clone)]
enum PostBookmarks {
    Table,
}

/// Columns shared by the reaction tables.
#[derive(DeriveIden)]
enum Reaction {
    PostSlug,
    UserId,
    CreatedAt,
}
