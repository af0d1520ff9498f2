//! In-memory TTL cache. Expiry is measured against an injected [`Clock`].

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use tokio::sync::RwLock;

use folio_core::ports::{Cache, CacheError, Clock, SystemClock};

struct CacheEntry {
    value: String,
    expires_at: Option<DateTime<Utc>>,
}

/// In-memory cache using a HashMap behind an async RwLock.
///
/// Data is lost on process restart.
pub struct InMemoryCache {
    store: RwLock<HashMap<String, CacheEntry>>,
    clock: Arc<dyn Clock>,
}

impl InMemoryCache {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            store: RwLock::new(HashMap::new()),
            clock,
        }
    }

    fn is_expired(&self, entry: &CacheEntry) -> bool {
        entry
            .expires_at
            .is_some_and(|exp| self.clock.now() >= exp)
    }
}

impl Default for InMemoryCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Cache for InMemoryCache {
    async fn get(&self, key: &str) -> Option<String> {
        let store = self.store.read().await;
        let entry = store.get(key)?;

        if self.is_expired(entry) {
            drop(store);
            let mut store = self.store.write().await;
            // Re-check: another writer may have refreshed it in between.
            if store.get(key).is_some_and(|e| self.is_expired(e)) {
                store.remove(key);
            }
            return None;
        }

        Some(entry.value.clone())
    }

    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<(), CacheError> {
        let expires_at = match ttl {
            Some(ttl) => {
                let delta = TimeDelta::from_std(ttl)
                    .map_err(|e| CacheError::Operation(format!("ttl out of range: {e}")))?;
                Some(self.clock.now() + delta)
            }
            None => None,
        };

        let mut store = self.store.write().await;
        store.insert(
            key.to_string(),
            CacheEntry {
                value: value.to_string(),
                expires_at,
            },
        );

        Ok(())
    }
}
