//! Read side: listing, detail, featured, related and search.

use std::collections::HashMap;

use uuid::Uuid;

use crate::domain::{
    Category, DEFAULT_PAGE_SIZE, ListPostsQuery, MAX_PAGE_SIZE, Page, Pagination, Post,
    PostDetail, PostListCriteria, page_offset,
};
use crate::error::DomainError;
use crate::ports::Repositories;
use crate::slug::is_valid_slug;

/// Shortest search query that is executed.
pub const MIN_SEARCH_LEN: usize = 2;

/// Query service over published posts.
#[derive(Clone)]
pub struct PostQueryService {
    repos: Repositories,
}

impl PostQueryService {
    pub fn new(repos: Repositories) -> Self {
        Self { repos }
    }

    /// One page of published posts with category and tags attached.
    ///
    /// Unknown category or tag slugs yield an empty page, and so does a page
    /// past the end; neither is an error.
    pub async fn list_posts(&self, query: ListPostsQuery) -> Result<Page<PostDetail>, DomainError> {
        let page = query.page.unwrap_or(1);
        if page == 0 {
            return Err(DomainError::validation("page must be a positive integer"));
        }
        let limit = validate_limit(query.limit.unwrap_or(DEFAULT_PAGE_SIZE))?;
        let filters = query.filters;

        let category_id = match non_blank(filters.category_slug.as_deref()) {
            Some(slug) => match self.repos.categories.find_by_slug(slug).await? {
                Some(category) => Some(category.id),
                None => return Ok(Page::empty(page, limit)),
            },
            None => None,
        };

        let tag_id = match non_blank(filters.tag_slug.as_deref()) {
            Some(slug) => match self.repos.tags.find_by_slug(slug).await? {
                Some(tag) => Some(tag.id),
                None => return Ok(Page::empty(page, limit)),
            },
            None => None,
        };

        let criteria = PostListCriteria {
            category_id,
            tag_id,
            search: non_blank(filters.search.as_deref()).map(str::to_string),
            featured: filters.featured,
            sort: query.sort,
            offset: page_offset(page, limit),
            limit,
        };

        let (posts, total) = self.repos.posts.list_published(&criteria).await?;
        tracing::debug!(page, limit, total, returned = posts.len(), "Listed posts");

        Ok(Page {
            data: self.enrich(posts).await?,
            pagination: Pagination::new(page, limit, total),
        })
    }

    /// Published post by slug. A hit counts as one view.
    pub async fn get_post_by_slug(&self, slug: &str) -> Result<Option<PostDetail>, DomainError> {
        if !is_valid_slug(slug) {
            return Err(DomainError::validation(format!("invalid slug {slug:?}")));
        }

        let Some(mut post) = self.repos.posts.find_published_by_slug(slug).await? else {
            return Ok(None);
        };

        post.views = self.repos.posts.increment_views(post.id).await?;

        Ok(self.enrich(vec![post]).await?.pop())
    }

    pub async fn get_featured_posts(&self, limit: u64) -> Result<Vec<PostDetail>, DomainError> {
        let limit = validate_limit(limit)?;
        let posts = self.repos.posts.find_featured(limit).await?;
        self.enrich(posts).await
    }

    /// Other published posts in the same category, newest first.
    pub async fn get_related_posts(
        &self,
        post_id: Uuid,
        category_id: Option<Uuid>,
        limit: u64,
    ) -> Result<Vec<PostDetail>, DomainError> {
        let limit = validate_limit(limit)?;
        let Some(category_id) = category_id else {
            return Ok(Vec::new());
        };
        let posts = self
            .repos
            .posts
            .find_related(post_id, category_id, limit)
            .await?;
        self.enrich(posts).await
    }

    /// Ranked search. Queries shorter than [`MIN_SEARCH_LEN`] characters are rejected.
    pub async fn search_posts(
        &self,
        query: &str,
        limit: u64,
    ) -> Result<Vec<PostDetail>, DomainError> {
        let query = query.trim();
        if query.chars().count() < MIN_SEARCH_LEN {
            return Err(DomainError::validation(format!(
                "search query must be at least {MIN_SEARCH_LEN} characters"
            )));
        }
        let limit = validate_limit(limit)?;

        let posts = self.repos.posts.search(query, limit).await?;
        tracing::debug!(query, hits = posts.len(), "Searched posts");
        self.enrich(posts).await
    }

    async fn enrich(&self, posts: Vec<Post>) -> Result<Vec<PostDetail>, DomainError> {
        let mut categories: HashMap<Uuid, Option<Category>> = HashMap::new();
        let mut details = Vec::with_capacity(posts.len());

        for post in posts {
            let category = match post.category_id {
                Some(id) => {
                    if !categories.contains_key(&id) {
                        let found = self.repos.categories.find_by_id(id).await?;
                        categories.insert(id, found);
                    }
                    categories.get(&id).cloned().flatten()
                }
                None => None,
            };
            let tags = self.repos.tags.find_by_post(post.id).await?;
            details.push(PostDetail {
                post,
                category,
                tags,
            });
        }

        Ok(details)
    }
}

fn validate_limit(limit: u64) -> Result<u64, DomainError> {
    if (1..=MAX_PAGE_SIZE).contains(&limit) {
        Ok(limit)
    } else {
        Err(DomainError::validation(format!(
            "limit must be between 1 and {MAX_PAGE_SIZE}"
        )))
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
