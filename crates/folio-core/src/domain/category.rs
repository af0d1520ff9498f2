use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::slug::{fnv1a, slugify};

/// Label used when a document does not name a category.
pub const DEFAULT_CATEGORY: &str = "Uncategorized";

/// Display colours handed out to new categories.
pub const CATEGORY_PALETTE: [&str; 8] = [
    "#3B82F6", "#10B981", "#F59E0B", "#EF4444", "#8B5CF6", "#EC4899", "#14B8A6", "#F97316",
];

/// Category entity. Identity is name-derived: two names with the same slug are
/// the same category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: Uuid,
    pub slug: String,
    pub name: String,
    pub description: Option<String>,
    pub color: String,
}

impl Category {
    /// Create a category from a human-entered name.
    pub fn new(name: &str) -> Self {
        let name = name.trim();
        let slug = slugify(name);
        Self {
            id: Uuid::new_v4(),
            color: Self::color_for_slug(&slug).to_string(),
            slug,
            name: name.to_string(),
            description: None,
        }
    }

    /// Palette entry for a slug. Deterministic so re-runs and tests agree.
    pub fn color_for_slug(slug: &str) -> &'static str {
        CATEGORY_PALETTE[fnv1a(slug) as usize % CATEGORY_PALETTE.len()]
    }
}
