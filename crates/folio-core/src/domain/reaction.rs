use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The two per-user reactions a post can receive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReactionKind {
    Like,
    Bookmark,
}

impl ReactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReactionKind::Like => "like",
            ReactionKind::Bookmark => "bookmark",
        }
    }
}

/// A like or bookmark, keyed by `(kind, post_slug, user_id)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reaction {
    pub kind: ReactionKind,
    pub post_slug: String,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
}

/// Reaction counts for a post, plus the viewer's own state when known.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReactionSummary {
    pub likes: u64,
    pub bookmarks: u64,
    pub liked: bool,
    pub bookmarked: bool,
}
