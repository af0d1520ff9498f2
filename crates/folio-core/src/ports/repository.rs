use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{
    Category, Comment, Post, PostKey, PostListCriteria, Reaction, ReactionKind, Tag,
};
use crate::error::RepoError;

/// Generic repository trait defining standard CRUD operations.
#[async_trait]
pub trait BaseRepository<T, ID>: Send + Sync {
    /// Find an entity by its unique ID.
    async fn find_by_id(&self, id: ID) -> Result<Option<T>, RepoError>;

    /// Insert a new entity. Fails with `RepoError::Constraint` on a unique-key clash.
    async fn insert(&self, entity: T) -> Result<T, RepoError>;

    /// Overwrite an existing entity. Fails with `RepoError::NotFound` if it is gone.
    async fn update(&self, entity: T) -> Result<T, RepoError>;

    /// Delete an entity by its ID.
    async fn delete(&self, id: ID) -> Result<(), RepoError>;
}

#[async_trait]
pub trait CategoryRepository: BaseRepository<Category, Uuid> {
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Category>, RepoError>;
}

#[async_trait]
pub trait TagRepository: BaseRepository<Tag, Uuid> {
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Tag>, RepoError>;

    /// Tags of a post in the order they were attached.
    async fn find_by_post(&self, post_id: Uuid) -> Result<Vec<Tag>, RepoError>;

    /// Drop every association of `post_id`, then attach `tag_ids` in order.
    async fn replace_for_post(&self, post_id: Uuid, tag_ids: &[Uuid]) -> Result<(), RepoError>;

    /// Drop every association of `post_id`. Returns the number removed.
    async fn detach_post(&self, post_id: Uuid) -> Result<u64, RepoError>;
}

/// Post repository. Listing methods only ever return published posts.
#[async_trait]
pub trait PostRepository: BaseRepository<Post, Uuid> {
    /// Lookup regardless of publication state (used by the synchronizer).
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Post>, RepoError>;

    async fn find_published_by_slug(&self, slug: &str) -> Result<Option<Post>, RepoError>;

    /// Every persisted post, published or not.
    async fn list_keys(&self) -> Result<Vec<PostKey>, RepoError>;

    /// One page of matches plus the total number of matches. Any `offset`,
    /// including ones at or past the total, must yield an empty page.
    async fn list_published(
        &self,
        criteria: &PostListCriteria,
    ) -> Result<(Vec<Post>, u64), RepoError>;

    async fn find_featured(&self, limit: u64) -> Result<Vec<Post>, RepoError>;

    async fn find_related(
        &self,
        post_id: Uuid,
        category_id: Uuid,
        limit: u64,
    ) -> Result<Vec<Post>, RepoError>;

    /// Ranked case-insensitive search over title, excerpt and content.
    async fn search(&self, query: &str, limit: u64) -> Result<Vec<Post>, RepoError>;

    /// Atomically add one view and return the new count.
    async fn increment_views(&self, id: Uuid) -> Result<i64, RepoError>;
}

#[async_trait]
pub trait CommentRepository: BaseRepository<Comment, Uuid> {
    /// Comments of a post, oldest first.
    async fn find_by_post(&self, post_slug: &str) -> Result<Vec<Comment>, RepoError>;

    async fn delete_by_post(&self, post_slug: &str) -> Result<u64, RepoError>;
}

/// Likes and bookmarks. Keys are `(kind, post_slug, user_id)`.
#[async_trait]
pub trait ReactionRepository: Send + Sync {
    /// Fails with `RepoError::Constraint` when the reaction already exists.
    async fn add(&self, reaction: Reaction) -> Result<(), RepoError>;

    /// Returns whether a row was removed.
    async fn remove(
        &self,
        kind: ReactionKind,
        post_slug: &str,
        user_id: Uuid,
    ) -> Result<bool, RepoError>;

    async fn exists(
        &self,
        kind: ReactionKind,
        post_slug: &str,
        user_id: Uuid,
    ) -> Result<bool, RepoError>;

    async fn count(&self, kind: ReactionKind, post_slug: &str) -> Result<u64, RepoError>;

    /// Remove every reaction of either kind on a post.
    async fn delete_by_post(&self, post_slug: &str) -> Result<u64, RepoError>;
}

/// The full set of repositories the services work against.
#[derive(Clone)]
pub struct Repositories {
    pub posts: Arc<dyn PostRepository>,
    pub categories: Arc<dyn CategoryRepository>,
    pub tags: Arc<dyn TagRepository>,
    pub comments: Arc<dyn CommentRepository>,
    pub reactions: Arc<dyn ReactionRepository>,
}
