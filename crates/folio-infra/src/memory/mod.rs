//! In-memory post store - used when no database is configured, and by tests.
//!
//! Enforces the same unique keys as the PostgreSQL schema so services behave
//! identically against either backend. Data is lost on process restart.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use folio_core::domain::{
    Category, Comment, Post, PostKey, PostListCriteria, PostSort, Reaction, ReactionKind, Tag,
};
use folio_core::error::RepoError;
use folio_core::ports::{
    BaseRepository, CategoryRepository, CommentRepository, PostRepository, ReactionRepository,
    Repositories, TagRepository,
};

type ReactionKey = (ReactionKind, String, Uuid);

#[derive(Default)]
struct State {
    posts: HashMap<Uuid, Post>,
    categories: HashMap<Uuid, Category>,
    tags: HashMap<Uuid, Tag>,
    /// Post id to tag ids, in attachment order.
    post_tags: HashMap<Uuid, Vec<Uuid>>,
    /// Insertion order.
    comments: Vec<Comment>,
    reactions: HashMap<ReactionKey, DateTime<Utc>>,
}

impl State {
    fn has_post_slug(&self, slug: &str) -> bool {
        self.posts.values().any(|p| p.slug == slug)
    }
}

/// Row counts per table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreStats {
    pub posts: usize,
    pub categories: usize,
    pub tags: usize,
    pub post_tags: usize,
    pub comments: usize,
    pub reactions: usize,
}

#[derive(Default)]
pub struct InMemoryStore {
    state: RwLock<State>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn stats(&self) -> StoreStats {
        let state = self.state.read().await;
        StoreStats {
            posts: state.posts.len(),
            categories: state.categories.len(),
            tags: state.tags.len(),
            post_tags: state.post_tags.values().map(Vec::len).sum(),
            comments: state.comments.len(),
            reactions: state.reactions.len(),
        }
    }

    /// Hand the store out as the full repository set.
    pub fn repositories(self: Arc<Self>) -> Repositories {
        Repositories {
            posts: self.clone(),
            categories: self.clone(),
            tags: self.clone(),
            comments: self.clone(),
            reactions: self,
        }
    }
}

fn to_usize(n: u64) -> usize {
    usize::try_from(n).unwrap_or(usize::MAX)
}

fn page(mut posts: Vec<Post>, sort: &PostSort, offset: u64, limit: u64) -> Vec<Post> {
    posts.sort_by(|a, b| sort.compare(a, b));
    posts
        .into_iter()
        .skip(to_usize(offset))
        .take(to_usize(limit))
        .collect()
}

fn unique_violation(what: &str, value: &str) -> RepoError {
    RepoError::Constraint(format!("{what} '{value}' already exists"))
}

fn missing_parent(what: &str, value: &str) -> RepoError {
    RepoError::Query(format!("foreign key violation: no {what} '{value}'"))
}

#[async_trait]
impl BaseRepository<Post, Uuid> for InMemoryStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Post>, RepoError> {
        Ok(self.state.read().await.posts.get(&id).cloned())
    }

    async fn insert(&self, post: Post) -> Result<Post, RepoError> {
        let mut state = self.state.write().await;
        if state.posts.contains_key(&post.id) {
            return Err(unique_violation("post id", &post.id.to_string()));
        }
        if state.has_post_slug(&post.slug) {
            return Err(unique_violation("post slug", &post.slug));
        }
        state.posts.insert(post.id, post.clone());
        Ok(post)
    }

    async fn update(&self, post: Post) -> Result<Post, RepoError> {
        let mut state = self.state.write().await;
        if !state.posts.contains_key(&post.id) {
            return Err(RepoError::NotFound);
        }
        if state
            .posts
            .values()
            .any(|p| p.slug == post.slug && p.id != post.id)
        {
            return Err(unique_violation("post slug", &post.slug));
        }
        state.posts.insert(post.id, post.clone());
        Ok(post)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        let mut state = self.state.write().await;
        state.posts.remove(&id).ok_or(RepoError::NotFound)?;
        state.post_tags.remove(&id);
        Ok(())
    }
}

#[async_trait]
impl PostRepository for InMemoryStore {
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Post>, RepoError> {
        let state = self.state.read().await;
        Ok(state.posts.values().find(|p| p.slug == slug).cloned())
    }

    async fn find_published_by_slug(&self, slug: &str) -> Result<Option<Post>, RepoError> {
        let state = self.state.read().await;
        Ok(state
            .posts
            .values()
            .find(|p| p.published && p.slug == slug)
            .cloned())
    }

    async fn list_keys(&self) -> Result<Vec<PostKey>, RepoError> {
        let state = self.state.read().await;
        let mut keys: Vec<PostKey> = state.posts.values().map(Post::key).collect();
        keys.sort_by(|a, b| a.slug.cmp(&b.slug));
        Ok(keys)
    }

    async fn list_published(
        &self,
        criteria: &PostListCriteria,
    ) -> Result<(Vec<Post>, u64), RepoError> {
        let state = self.state.read().await;
        let needle = criteria.search.as_deref().map(str::to_lowercase);

        let matches: Vec<Post> = state
            .posts
            .values()
            .filter(|p| p.published)
            .filter(|p| criteria.category_id.is_none_or(|c| p.category_id == Some(c)))
            .filter(|p| {
                criteria.tag_id.is_none_or(|t| {
                    state
                        .post_tags
                        .get(&p.id)
                        .is_some_and(|tags| tags.contains(&t))
                })
            })
            .filter(|p| criteria.featured.is_none_or(|f| p.featured == f))
            .filter(|p| needle.as_deref().is_none_or(|n| p.search_rank(n).is_some()))
            .cloned()
            .collect();

        let total = matches.len() as u64;
        Ok((
            page(matches, &criteria.sort, criteria.offset, criteria.limit),
            total,
        ))
    }

    async fn find_featured(&self, limit: u64) -> Result<Vec<Post>, RepoError> {
        let state = self.state.read().await;
        let featured = state
            .posts
            .values()
            .filter(|p| p.published && p.featured)
            .cloned()
            .collect();
        Ok(page(featured, &PostSort::default(), 0, limit))
    }

    async fn find_related(
        &self,
        post_id: Uuid,
        category_id: Uuid,
        limit: u64,
    ) -> Result<Vec<Post>, RepoError> {
        let state = self.state.read().await;
        let related = state
            .posts
            .values()
            .filter(|p| p.published && p.id != post_id && p.category_id == Some(category_id))
            .cloned()
            .collect();
        Ok(page(related, &PostSort::default(), 0, limit))
    }

    async fn search(&self, query: &str, limit: u64) -> Result<Vec<Post>, RepoError> {
        let state = self.state.read().await;
        let needle = query.to_lowercase();
        let newest_first = PostSort::default();

        let mut hits: Vec<(u8, Post)> = state
            .posts
            .values()
            .filter(|p| p.published)
            .filter_map(|p| p.search_rank(&needle).map(|rank| (rank, p.clone())))
            .collect();
        hits.sort_by(|(ra, a), (rb, b)| rb.cmp(ra).then_with(|| newest_first.compare(a, b)));

        Ok(hits
            .into_iter()
            .take(to_usize(limit))
            .map(|(_, post)| post)
            .collect())
    }

    async fn increment_views(&self, id: Uuid) -> Result<i64, RepoError> {
        let mut state = self.state.write().await;
        let post = state.posts.get_mut(&id).ok_or(RepoError::NotFound)?;
        post.views += 1;
        Ok(post.views)
    }
}

#[async_trait]
impl BaseRepository<Category, Uuid> for InMemoryStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Category>, RepoError> {
        Ok(self.state.read().await.categories.get(&id).cloned())
    }

    async fn insert(&self, category: Category) -> Result<Category, RepoError> {
        let mut state = self.state.write().await;
        if state.categories.contains_key(&category.id) {
            return Err(unique_violation("category id", &category.id.to_string()));
        }
        if state.categories.values().any(|c| c.slug == category.slug) {
            return Err(unique_violation("category slug", &category.slug));
        }
        state.categories.insert(category.id, category.clone());
        Ok(category)
    }

    async fn update(&self, category: Category) -> Result<Category, RepoError> {
        let mut state = self.state.write().await;
        if !state.categories.contains_key(&category.id) {
            return Err(RepoError::NotFound);
        }
        if state
            .categories
            .values()
            .any(|c| c.slug == category.slug && c.id != category.id)
        {
            return Err(unique_violation("category slug", &category.slug));
        }
        state.categories.insert(category.id, category.clone());
        Ok(category)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        let mut state = self.state.write().await;
        state.categories.remove(&id).ok_or(RepoError::NotFound)?;
        // ON DELETE SET NULL
        for post in state.posts.values_mut() {
            if post.category_id == Some(id) {
                post.category_id = None;
            }
        }
        Ok(())
    }
}

#[async_trait]
impl CategoryRepository for InMemoryStore {
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Category>, RepoError> {
        let state = self.state.read().await;
        Ok(state.categories.values().find(|c| c.slug == slug).cloned())
    }
}

#[async_trait]
impl BaseRepository<Tag, Uuid> for InMemoryStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Tag>, RepoError> {
        Ok(self.state.read().await.tags.get(&id).cloned())
    }

    async fn insert(&self, tag: Tag) -> Result<Tag, RepoError> {
        let mut state = self.state.write().await;
        if state.tags.contains_key(&tag.id) {
            return Err(unique_violation("tag id", &tag.id.to_string()));
        }
        if state.tags.values().any(|t| t.slug == tag.slug) {
            return Err(unique_violation("tag slug", &tag.slug));
        }
        state.tags.insert(tag.id, tag.clone());
        Ok(tag)
    }

    async fn update(&self, tag: Tag) -> Result<Tag, RepoError> {
        let mut state = self.state.write().await;
        if !state.tags.contains_key(&tag.id) {
            return Err(RepoError::NotFound);
        }
        if state
            .tags
            .values()
            .any(|t| t.slug == tag.slug && t.id != tag.id)
        {
            return Err(unique_violation("tag slug", &tag.slug));
        }
        state.tags.insert(tag.id, tag.clone());
        Ok(tag)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        let mut state = self.state.write().await;
        state.tags.remove(&id).ok_or(RepoError::NotFound)?;
        for tag_ids in state.post_tags.values_mut() {
            tag_ids.retain(|t| *t != id);
        }
        Ok(())
    }
}

#[async_trait]
impl TagRepository for InMemoryStore {
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Tag>, RepoError> {
        let state = self.state.read().await;
        Ok(state.tags.values().find(|t| t.slug == slug).cloned())
    }

    async fn find_by_post(&self, post_id: Uuid) -> Result<Vec<Tag>, RepoError> {
        let state = self.state.read().await;
        let Some(tag_ids) = state.post_tags.get(&post_id) else {
            return Ok(Vec::new());
        };
        Ok(tag_ids
            .iter()
            .filter_map(|id| state.tags.get(id).cloned())
            .collect())
    }

    async fn replace_for_post(&self, post_id: Uuid, tag_ids: &[Uuid]) -> Result<(), RepoError> {
        let mut state = self.state.write().await;
        if !state.posts.contains_key(&post_id) {
            return Err(missing_parent("post", &post_id.to_string()));
        }
        if let Some(unknown) = tag_ids.iter().find(|id| !state.tags.contains_key(id)) {
            return Err(missing_parent("tag", &unknown.to_string()));
        }
        let mut seen = HashSet::new();
        if let Some(dup) = tag_ids.iter().find(|id| !seen.insert(**id)) {
            return Err(unique_violation("post tag", &dup.to_string()));
        }

        state.post_tags.insert(post_id, tag_ids.to_vec());
        Ok(())
    }

    async fn detach_post(&self, post_id: Uuid) -> Result<u64, RepoError> {
        let mut state = self.state.write().await;
        Ok(state
            .post_tags
            .remove(&post_id)
            .map_or(0, |ids| ids.len() as u64))
    }
}

#[async_trait]
impl BaseRepository<Comment, Uuid> for InMemoryStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Comment>, RepoError> {
        let state = self.state.read().await;
        Ok(state.comments.iter().find(|c| c.id == id).cloned())
    }

    async fn insert(&self, comment: Comment) -> Result<Comment, RepoError> {
        let mut state = self.state.write().await;
        if state.comments.iter().any(|c| c.id == comment.id) {
            return Err(unique_violation("comment id", &comment.id.to_string()));
        }
        if !state.has_post_slug(&comment.post_slug) {
            return Err(missing_parent("post", &comment.post_slug));
        }
        state.comments.push(comment.clone());
        Ok(comment)
    }

    async fn update(&self, comment: Comment) -> Result<Comment, RepoError> {
        let mut state = self.state.write().await;
        let slot = state
            .comments
            .iter_mut()
            .find(|c| c.id == comment.id)
            .ok_or(RepoError::NotFound)?;
        *slot = comment.clone();
        Ok(comment)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        let mut state = self.state.write().await;
        let before = state.comments.len();
        state.comments.retain(|c| c.id != id);
        if state.comments.len() == before {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }
}

#[async_trait]
impl CommentRepository for InMemoryStore {
    async fn find_by_post(&self, post_slug: &str) -> Result<Vec<Comment>, RepoError> {
        let state = self.state.read().await;
        let mut comments: Vec<Comment> = state
            .comments
            .iter()
            .filter(|c| c.post_slug == post_slug)
            .cloned()
            .collect();
        // Stable: same-instant comments keep insertion order.
        comments.sort_by_key(|c| c.created_at);
        Ok(comments)
    }

    async fn delete_by_post(&self, post_slug: &str) -> Result<u64, RepoError> {
        let mut state = self.state.write().await;
        let before = state.comments.len();
        state.comments.retain(|c| c.post_slug != post_slug);
        Ok((before - state.comments.len()) as u64)
    }
}

#[async_trait]
impl ReactionRepository for InMemoryStore {
    async fn add(&self, reaction: Reaction) -> Result<(), RepoError> {
        let mut state = self.state.write().await;
        if !state.has_post_slug(&reaction.post_slug) {
            return Err(missing_parent("post", &reaction.post_slug));
        }
        let key = (reaction.kind, reaction.post_slug, reaction.user_id);
        if state.reactions.contains_key(&key) {
            return Err(RepoError::Constraint(format!(
                "{} already recorded",
                reaction.kind.as_str()
            )));
        }
        state.reactions.insert(key, reaction.created_at);
        Ok(())
    }

    async fn remove(
        &self,
        kind: ReactionKind,
        post_slug: &str,
        user_id: Uuid,
    ) -> Result<bool, RepoError> {
        let mut state = self.state.write().await;
        Ok(state
            .reactions
            .remove(&(kind, post_slug.to_string(), user_id))
            .is_some())
    }

    async fn exists(
        &self,
        kind: ReactionKind,
        post_slug: &str,
        user_id: Uuid,
    ) -> Result<bool, RepoError> {
        let state = self.state.read().await;
        Ok(state
            .reactions
            .contains_key(&(kind, post_slug.to_string(), user_id)))
    }

    async fn count(&self, kind: ReactionKind, post_slug: &str) -> Result<u64, RepoError> {
        let state = self.state.read().await;
        Ok(state
            .reactions
            .keys()
            .filter(|(k, slug, _)| *k == kind && slug == post_slug)
            .count() as u64)
    }

    async fn delete_by_post(&self, post_slug: &str) -> Result<u64, RepoError> {
        let mut state = self.state.write().await;
        let before = state.reactions.len();
        state.reactions.retain(|(_, slug, _), _| slug != post_slug);
        Ok((before - state.reactions.len()) as u64)
    }
}
