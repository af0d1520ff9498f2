//! PostgreSQL repository implementations.

use std::sync::Arc;

use async_trait::async_trait;
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::sea_query::{Expr, Func, Query, SimpleExpr};
use sea_orm::{
    ColumnTrait, Condition, DbConn, EntityTrait, Order, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Select, Set, TransactionTrait,
};
use uuid::Uuid;

use folio_core::domain::{
    Category, Comment, Post, PostKey, PostListCriteria, Reaction, ReactionKind, SortField,
    SortOrder, Tag,
};
use folio_core::error::RepoError;
use folio_core::ports::{
    CategoryRepository, CommentRepository, PostRepository, ReactionRepository, Repositories,
    TagRepository,
};

use super::entity::category::{self, Entity as CategoryEntity};
use super::entity::comment::{self, Entity as CommentEntity};
use super::entity::post::{self, Entity as PostEntity};
use super::entity::tag::{self, Entity as TagEntity};
use super::entity::{post_bookmark, post_like, post_tag};
use super::postgres_base::{PostgresBaseRepository, map_db_err};

/// PostgreSQL post repository.
pub type PostgresPostRepository = PostgresBaseRepository<PostEntity>;

/// PostgreSQL category repository.
pub type PostgresCategoryRepository = PostgresBaseRepository<CategoryEntity>;

/// PostgreSQL tag repository (also owns the `post_tags` join table).
pub type PostgresTagRepository = PostgresBaseRepository<TagEntity>;

/// PostgreSQL comment repository.
pub type PostgresCommentRepository = PostgresBaseRepository<CommentEntity>;

/// Build the full repository set over one connection pool.
pub fn postgres_repositories(db: Arc<DbConn>) -> Repositories {
    Repositories {
        posts: Arc::new(PostgresPostRepository::shared(db.clone())),
        categories: Arc::new(PostgresCategoryRepository::shared(db.clone())),
        tags: Arc::new(PostgresTagRepository::shared(db.clone())),
        comments: Arc::new(PostgresCommentRepository::shared(db.clone())),
        reactions: Arc::new(PostgresReactionRepository::shared(db)),
    }
}

/// `%term%` in lowercase with LIKE metacharacters escaped.
fn like_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for c in term.to_lowercase().chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

fn lower_like(column: post::Column, pattern: &str) -> SimpleExpr {
    Expr::expr(Func::lower(Expr::col(column))).like(pattern)
}

fn search_condition(pattern: &str) -> Condition {
    Condition::any()
        .add(lower_like(post::Column::Title, pattern))
        .add(lower_like(post::Column::Excerpt, pattern))
        .add(lower_like(post::Column::Content, pattern))
}

fn published() -> Select<PostEntity> {
    PostEntity::find().filter(post::Column::Published.eq(true))
}

fn sort_column(field: SortField) -> post::Column {
    match field {
        SortField::PublishedAt => post::Column::PublishedAt,
        SortField::UpdatedAt => post::Column::UpdatedAt,
        SortField::Title => post::Column::Title,
        SortField::Views => post::Column::Views,
    }
}

fn sort_order(order: SortOrder) -> Order {
    match order {
        SortOrder::Asc => Order::Asc,
        SortOrder::Desc => Order::Desc,
    }
}

#[async_trait]
impl PostRepository for PostgresPostRepository {
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Post>, RepoError> {
        let result = PostEntity::find()
            .filter(post::Column::Slug.eq(slug))
            .one(self.conn())
            .await
            .map_err(map_db_err)?;

        Ok(result.map(Into::into))
    }

    async fn find_published_by_slug(&self, slug: &str) -> Result<Option<Post>, RepoError> {
        let result = published()
            .filter(post::Column::Slug.eq(slug))
            .one(self.conn())
            .await
            .map_err(map_db_err)?;

        Ok(result.map(Into::into))
    }

    async fn list_keys(&self) -> Result<Vec<PostKey>, RepoError> {
        let rows: Vec<(Uuid, String)> = PostEntity::find()
            .select_only()
            .column(post::Column::Id)
            .column(post::Column::Slug)
            .into_tuple()
            .all(self.conn())
            .await
            .map_err(map_db_err)?;

        Ok(rows
            .into_iter()
            .map(|(id, slug)| PostKey { id, slug })
            .collect())
    }

    async fn list_published(
        &self,
        criteria: &PostListCriteria,
    ) -> Result<(Vec<Post>, u64), RepoError> {
        let mut select = published();

        if let Some(category_id) = criteria.category_id {
            select = select.filter(post::Column::CategoryId.eq(category_id));
        }
        if let Some(tag_id) = criteria.tag_id {
            select = select.filter(
                post::Column::Id.in_subquery(
                    Query::select()
                        .column(post_tag::Column::PostId)
                        .from(post_tag::Entity)
                        .and_where(post_tag::Column::TagId.eq(tag_id))
                        .to_owned(),
                ),
            );
        }
        if let Some(featured) = criteria.featured {
            select = select.filter(post::Column::Featured.eq(featured));
        }
        if let Some(term) = &criteria.search {
            select = select.filter(search_condition(&like_pattern(term)));
        }

        let total = select.clone().count(self.conn()).await.map_err(map_db_err)?;
        // Nothing lies past the last row, and such offsets may not fit a BIGINT.
        if criteria.offset >= total {
            return Ok((Vec::new(), total));
        }

        let posts = select
            .order_by(
                sort_column(criteria.sort.field),
                sort_order(criteria.sort.order),
            )
            .order_by_asc(post::Column::Slug)
            .offset(criteria.offset)
            .limit(criteria.limit)
            .all(self.conn())
            .await
            .map_err(map_db_err)?;

        Ok((posts.into_iter().map(Into::into).collect(), total))
    }

    async fn find_featured(&self, limit: u64) -> Result<Vec<Post>, RepoError> {
        let result = published()
            .filter(post::Column::Featured.eq(true))
            .order_by_desc(post::Column::PublishedAt)
            .order_by_asc(post::Column::Slug)
            .limit(limit)
            .all(self.conn())
            .await
            .map_err(map_db_err)?;

        Ok(result.into_iter().map(Into::into).collect())
    }

    async fn find_related(
        &self,
        post_id: Uuid,
        category_id: Uuid,
        limit: u64,
    ) -> Result<Vec<Post>, RepoError> {
        let result = published()
            .filter(post::Column::CategoryId.eq(category_id))
            .filter(post::Column::Id.ne(post_id))
            .order_by_desc(post::Column::PublishedAt)
            .order_by_asc(post::Column::Slug)
            .limit(limit)
            .all(self.conn())
            .await
            .map_err(map_db_err)?;

        Ok(result.into_iter().map(Into::into).collect())
    }

    async fn search(&self, query: &str, limit: u64) -> Result<Vec<Post>, RepoError> {
        let pattern = like_pattern(query);
        let rank: SimpleExpr = Expr::case(lower_like(post::Column::Title, &pattern), 3)
            .case(lower_like(post::Column::Excerpt, &pattern), 2)
            .finally(1)
            .into();

        let result = published()
            .filter(search_condition(&pattern))
            .order_by(rank, Order::Desc)
            .order_by_desc(post::Column::PublishedAt)
            .order_by_asc(post::Column::Slug)
            .limit(limit)
            .all(self.conn())
            .await
            .map_err(map_db_err)?;

        Ok(result.into_iter().map(Into::into).collect())
    }

    async fn increment_views(&self, id: Uuid) -> Result<i64, RepoError> {
        // Single UPDATE ... RETURNING, so concurrent hits never lose a count.
        let updated = PostEntity::update_many()
            .col_expr(post::Column::Views, Expr::col(post::Column::Views).add(1))
            .filter(post::Column::Id.eq(id))
            .exec_with_returning(self.conn())
            .await
            .map_err(map_db_err)?;

        updated
            .first()
            .map(|model| model.views)
            .ok_or(RepoError::NotFound)
    }
}

#[async_trait]
impl CategoryRepository for PostgresCategoryRepository {
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Category>, RepoError> {
        let result = CategoryEntity::find()
            .filter(category::Column::Slug.eq(slug))
            .one(self.conn())
            .await
            .map_err(map_db_err)?;

        Ok(result.map(Into::into))
    }
}

#[async_trait]
impl TagRepository for PostgresTagRepository {
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Tag>, RepoError> {
        let result = TagEntity::find()
            .filter(tag::Column::Slug.eq(slug))
            .one(self.conn())
            .await
            .map_err(map_db_err)?;

        Ok(result.map(Into::into))
    }

    async fn find_by_post(&self, post_id: Uuid) -> Result<Vec<Tag>, RepoError> {
        let result = TagEntity::find()
            .inner_join(post_tag::Entity)
            .filter(post_tag::Column::PostId.eq(post_id))
            .order_by_asc(post_tag::Column::Position)
            .all(self.conn())
            .await
            .map_err(map_db_err)?;

        Ok(result.into_iter().map(Into::into).collect())
    }

    async fn replace_for_post(&self, post_id: Uuid, tag_ids: &[Uuid]) -> Result<(), RepoError> {
        let txn = self.conn().begin().await.map_err(map_db_err)?;

        post_tag::Entity::delete_many()
            .filter(post_tag::Column::PostId.eq(post_id))
            .exec(&txn)
            .await
            .map_err(map_db_err)?;

        if !tag_ids.is_empty() {
            let rows = tag_ids
                .iter()
                .enumerate()
                .map(|(position, tag_id)| post_tag::ActiveModel {
                    post_id: Set(post_id),
                    tag_id: Set(*tag_id),
                    position: Set(position as i32),
                });
            post_tag::Entity::insert_many(rows)
                .exec_without_returning(&txn)
                .await
                .map_err(map_db_err)?;
        }

        txn.commit().await.map_err(map_db_err)
    }

    async fn detach_post(&self, post_id: Uuid) -> Result<u64, RepoError> {
        let result = post_tag::Entity::delete_many()
            .filter(post_tag::Column::PostId.eq(post_id))
            .exec(self.conn())
            .await
            .map_err(map_db_err)?;

        Ok(result.rows_affected)
    }
}

#[async_trait]
impl CommentRepository for PostgresCommentRepository {
    async fn find_by_post(&self, post_slug: &str) -> Result<Vec<Comment>, RepoError> {
        let result = CommentEntity::find()
            .filter(comment::Column::PostSlug.eq(post_slug))
            .order_by_asc(comment::Column::CreatedAt)
            .all(self.conn())
            .await
            .map_err(map_db_err)?;

        Ok(result.into_iter().map(Into::into).collect())
    }

    async fn delete_by_post(&self, post_slug: &str) -> Result<u64, RepoError> {
        let result = CommentEntity::delete_many()
            .filter(comment::Column::PostSlug.eq(post_slug))
            .exec(self.conn())
            .await
            .map_err(map_db_err)?;

        Ok(result.rows_affected)
    }
}

/// PostgreSQL likes and bookmarks, one table per kind.
pub struct PostgresReactionRepository {
    db: Arc<DbConn>,
}

impl PostgresReactionRepository {
    pub fn new(db: DbConn) -> Self {
        Self::shared(Arc::new(db))
    }

    pub fn shared(db: Arc<DbConn>) -> Self {
        Self { db }
    }

    fn conn(&self) -> &DbConn {
        &self.db
    }
}

#[async_trait]
impl ReactionRepository for PostgresReactionRepository {
    async fn add(&self, reaction: Reaction) -> Result<(), RepoError> {
        let created_at: DateTimeWithTimeZone = reaction.created_at.into();
        match reaction.kind {
            ReactionKind::Like => {
                post_like::Entity::insert(post_like::ActiveModel {
                    post_slug: Set(reaction.post_slug),
                    user_id: Set(reaction.user_id),
                    created_at: Set(created_at),
                })
                .exec_without_returning(self.conn())
                .await
            }
            ReactionKind::Bookmark => {
                post_bookmark::Entity::insert(post_bookmark::ActiveModel {
                    post_slug: Set(reaction.post_slug),
                    user_id: Set(reaction.user_id),
                    created_at: Set(created_at),
                })
                .exec_without_returning(self.conn())
                .await
            }
        }
        .map_err(map_db_err)?;

        Ok(())
    }

    async fn remove(
        &self,
        kind: ReactionKind,
        post_slug: &str,
        user_id: Uuid,
    ) -> Result<bool, RepoError> {
        let result = match kind {
            ReactionKind::Like => {
                post_like::Entity::delete_many()
                    .filter(post_like::Column::PostSlug.eq(post_slug))
                    .filter(post_like::Column::UserId.eq(user_id))
                    .exec(self.conn())
                    .await
            }
            ReactionKind::Bookmark => {
                post_bookmark::Entity::delete_many()
                    .filter(post_bookmark::Column::PostSlug.eq(post_slug))
                    .filter(post_bookmark::Column::UserId.eq(user_id))
                    .exec(self.conn())
                    .await
            }
        }
        .map_err(map_db_err)?;

        Ok(result.rows_affected > 0)
    }

    async fn exists(
        &self,
        kind: ReactionKind,
        post_slug: &str,
        user_id: Uuid,
    ) -> Result<bool, RepoError> {
        let count = match kind {
            ReactionKind::Like => {
                post_like::Entity::find()
                    .filter(post_like::Column::PostSlug.eq(post_slug))
                    .filter(post_like::Column::UserId.eq(user_id))
                    .count(self.conn())
                    .await
            }
            ReactionKind::Bookmark => {
                post_bookmark::Entity::find()
                    .filter(post_bookmark::Column::PostSlug.eq(post_slug))
                    .filter(post_bookmark::Column::UserId.eq(user_id))
                    .count(self.conn())
                    .await
            }
        }
        .map_err(map_db_err)?;

        Ok(count > 0)
    }

    async fn count(&self, kind: ReactionKind, post_slug: &str) -> Result<u64, RepoError> {
        match kind {
            ReactionKind::Like => {
                post_like::Entity::find()
                    .filter(post_like::Column::PostSlug.eq(post_slug))
                    .count(self.conn())
                    .await
            }
            ReactionKind::Bookmark => {
                post_bookmark::Entity::find()
                    .filter(post_bookmark::Column::PostSlug.eq(post_slug))
                    .count(self.conn())
                    .await
            }
        }
        .map_err(map_db_err)
    }

    async fn delete_by_post(&self, post_slug: &str) -> Result<u64, RepoError> {
        let likes = post_like::Entity::delete_many()
            .filter(post_like::Column::PostSlug.eq(post_slug))
            .exec(self.conn())
            .await
            .map_err(map_db_err)?;
        let bookmarks = post_bookmark::Entity::delete_many()
            .filter(post_bookmark::Column::PostSlug.eq(post_slug))
            .exec(self.conn())
            .await
            .map_err(map_db_err)?;

        Ok(likes.rows_affected + bookmarks.rows_affected)
    }
}

#[cfg(test)]
mod tests {
    use super::like_pattern;

    #[test]
    fn test_like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("Brew"), "%brew%");
        assert_eq!(like_pattern("100%_done"), "%100\\%\\_done%");
    }
}
