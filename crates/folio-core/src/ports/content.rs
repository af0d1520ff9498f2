use async_trait::async_trait;

use crate::domain::ContentDocument;

/// Read-only source of content documents, addressed by slug.
#[async_trait]
pub trait ContentSource: Send + Sync {
    /// Slugs of every document currently present. A missing source is empty, not an error.
    async fn slugs(&self) -> Result<Vec<String>, ContentError>;

    /// Load and parse one document.
    async fn load(&self, slug: &str) -> Result<ContentDocument, ContentError>;
}

/// Content source errors.
#[derive(Debug, thiserror::Error)]
pub enum ContentError {
    #[error("Content source unreadable: {0}")]
    Io(String),

    #[error("Document not found: {0}")]
    NotFound(String),

    #[error("Invalid slug: {0:?}")]
    InvalidSlug(String),

    #[error("Invalid front-matter in {file}: {reason}")]
    FrontMatter { file: String, reason: String },
}
