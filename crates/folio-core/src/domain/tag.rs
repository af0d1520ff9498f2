use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::slug::slugify;

/// Tag entity. Same name-derived identity rule as categories.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub id: Uuid,
    pub slug: String,
    pub name: String,
}

impl Tag {
    pub fn new(name: &str) -> Self {
        let name = name.trim();
        Self {
            id: Uuid::new_v4(),
            slug: slugify(name),
            name: name.to_string(),
        }
    }
}
