use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Category, DEFAULT_READING_TIME, Tag};

/// Post entity - one published tutorial.
///
/// `slug` is the file stem of the source document and the join key between
/// the content directory and the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: Uuid,
    pub slug: String,
    pub title: String,
    pub excerpt: String,
    pub content: String,
    pub featured_image: Option<String>,
    pub author: Option<String>,
    pub reading_time: i32,
    pub published: bool,
    pub featured: bool,
    pub category_id: Option<Uuid>,
    pub views: i64,
    pub published_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Post {
    /// Create an unpublished post with default counters, stamped with `now`.
    pub fn new(slug: String, title: String, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            slug,
            title,
            excerpt: String::new(),
            content: String::new(),
            featured_image: None,
            author: None,
            reading_time: DEFAULT_READING_TIME,
            published: false,
            featured: false,
            category_id: None,
            views: 0,
            published_at: now,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn key(&self) -> PostKey {
        PostKey {
            id: self.id,
            slug: self.slug.clone(),
        }
    }

    /// Relevance of this post for an already-lowercased search needle.
    ///
    /// Title hits score 3, excerpt 2, content 1; `None` when nothing matches.
    pub fn search_rank(&self, needle: &str) -> Option<u8> {
        if self.title.to_lowercase().contains(needle) {
            Some(3)
        } else if self.excerpt.to_lowercase().contains(needle) {
            Some(2)
        } else if self.content.to_lowercase().contains(needle) {
            Some(1)
        } else {
            None
        }
    }
}

/// Identity pair used by the synchronizer to find orphans.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PostKey {
    pub id: Uuid,
    pub slug: String,
}

/// A post enriched with its category and ordered tags.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostDetail {
    #[serde(flatten)]
    pub post: Post,
    pub category: Option<Category>,
    pub tags: Vec<Tag>,
}
