use async_trait::async_trait;
use std::time::Duration;

/// Cache trait - string-keyed store for serialized read-path responses.
#[async_trait]
pub trait Cache: Send + Sync {
    /// Get a value from the cache. Expired entries read as absent.
    async fn get(&self, key: &str) -> Option<String>;

    /// Set a value in the cache with optional TTL.
    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<(), CacheError>;
}

/// Cache operation errors.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("Operation failed: {0}")]
    Operation(String),
}
