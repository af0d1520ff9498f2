//! Listing filters, sort orders and the store-level criteria they resolve to.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Post;

pub const DEFAULT_PAGE_SIZE: u64 = 10;
pub const MAX_PAGE_SIZE: u64 = 100;

/// Caller-facing filters. Slugs are resolved to ids before reaching the store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostFilters {
    pub category_slug: Option<String>,
    pub tag_slug: Option<String>,
    pub search: Option<String>,
    pub featured: Option<bool>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortField {
    #[default]
    PublishedAt,
    UpdatedAt,
    Title,
    Views,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

/// Sort specification. Defaults to most recently published first.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PostSort {
    pub field: SortField,
    pub order: SortOrder,
}

impl PostSort {
    pub fn new(field: SortField, order: SortOrder) -> Self {
        Self { field, order }
    }

    /// Parse the `sort` query parameter used by the listing page.
    pub fn from_param(param: &str) -> Option<Self> {
        let sort = match param.trim().to_ascii_lowercase().as_str() {
            "" | "latest" | "newest" => Self::new(SortField::PublishedAt, SortOrder::Desc),
            "oldest" => Self::new(SortField::PublishedAt, SortOrder::Asc),
            "popular" => Self::new(SortField::Views, SortOrder::Desc),
            "title" => Self::new(SortField::Title, SortOrder::Asc),
            "updated" => Self::new(SortField::UpdatedAt, SortOrder::Desc),
            _ => return None,
        };
        Some(sort)
    }

    /// Ordering used by in-process stores. Ties fall back to slug ascending.
    pub fn compare(&self, a: &Post, b: &Post) -> Ordering {
        let primary = match self.field {
            SortField::PublishedAt => a.published_at.cmp(&b.published_at),
            SortField::UpdatedAt => a.updated_at.cmp(&b.updated_at),
            SortField::Title => a.title.cmp(&b.title),
            SortField::Views => a.views.cmp(&b.views),
        };
        let primary = match self.order {
            SortOrder::Asc => primary,
            SortOrder::Desc => primary.reverse(),
        };
        primary.then_with(|| a.slug.cmp(&b.slug))
    }
}

/// Input of `PostQueryService::list_posts`.
#[derive(Debug, Clone, Default)]
pub struct ListPostsQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    pub filters: PostFilters,
    pub sort: PostSort,
}

/// Fully resolved listing criteria handed to `PostRepository::list_published`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostListCriteria {
    pub category_id: Option<Uuid>,
    pub tag_id: Option<Uuid>,
    /// Trimmed, non-empty search term. Matching is case-insensitive.
    pub search: Option<String>,
    pub featured: Option<bool>,
    pub sort: PostSort,
    pub offset: u64,
    pub limit: u64,
}
