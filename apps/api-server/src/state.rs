//! Application state - shared across all handlers.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;

use folio_core::ports::{Cache, Clock, IdentityVerifier, Repositories, SystemClock};
use folio_core::services::{EngagementService, PostQueryService};
use folio_infra::{InMemoryCache, InMemoryStore};

#[cfg(feature = "postgres")]
use folio_infra::{DatabaseConnections, postgres_repositories};

use crate::config::AppConfig;

/// Which post store the server is reading from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Postgres,
    Memory,
}

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub posts: PostQueryService,
    pub engagement: EngagementService,
    pub cache: Arc<dyn Cache>,
    /// `None` disables response caching.
    pub cache_ttl: Option<Duration>,
    /// `None` when no token secret is configured; authenticated routes then answer 401.
    pub verifier: Option<Arc<dyn IdentityVerifier>>,
    pub backend: StoreBackend,
    #[cfg(feature = "postgres")]
    pub db: Option<Arc<DatabaseConnections>>,
}

impl AppState {
    /// Build the application state, falling back to the in-memory store when the
    /// database is not configured or unreachable.
    pub async fn new(config: &AppConfig) -> Self {
        let verifier = build_verifier(config);

        #[cfg(feature = "postgres")]
        let state = match connect_postgres(config).await {
            Some(connections) => {
                let repos = postgres_repositories(connections.main.clone());
                let mut state = Self::with_repositories(
                    repos,
                    StoreBackend::Postgres,
                    config.cache_ttl,
                    verifier,
                );
                state.db = Some(Arc::new(connections));
                state
            }
            None => Self::in_memory(Arc::new(InMemoryStore::new()), config.cache_ttl, verifier),
        };

        #[cfg(not(feature = "postgres"))]
        let state = {
            tracing::info!("Running without postgres feature - using in-memory store");
            Self::in_memory(Arc::new(InMemoryStore::new()), config.cache_ttl, verifier)
        };

        tracing::info!(backend = ?state.backend, "Application state initialized");
        state
    }

    pub fn in_memory(
        store: Arc<InMemoryStore>,
        cache_ttl: Option<Duration>,
        verifier: Option<Arc<dyn IdentityVerifier>>,
    ) -> Self {
        Self::with_repositories(store.repositories(), StoreBackend::Memory, cache_ttl, verifier)
    }

    fn with_repositories(
        repos: Repositories,
        backend: StoreBackend,
        cache_ttl: Option<Duration>,
        verifier: Option<Arc<dyn IdentityVerifier>>,
    ) -> Self {
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);

        Self {
            posts: PostQueryService::new(repos.clone()),
            engagement: EngagementService::new(repos, clock.clone()),
            cache: Arc::new(InMemoryCache::with_clock(clock)),
            cache_ttl,
            verifier,
            backend,
            #[cfg(feature = "postgres")]
            db: None,
        }
    }
}

#[cfg(feature = "postgres")]
async fn connect_postgres(config: &AppConfig) -> Option<DatabaseConnections> {
    let Some(db_config) = &config.database else {
        tracing::warn!("DATABASE_URL not set. Running without database (in-memory mode).");
        return None;
    };

    match DatabaseConnections::init(db_config).await {
        Ok(connections) => Some(connections),
        Err(e) => {
            tracing::error!(error = %e, "Failed to connect to database. Using in-memory fallback.");
            None
        }
    }
}

#[cfg(feature = "auth")]
fn build_verifier(config: &AppConfig) -> Option<Arc<dyn IdentityVerifier>> {
    use folio_infra::{JwtConfig, JwtIdentityVerifier};

    let Some(auth) = &config.auth else {
        tracing::warn!("JWT_SECRET not set. Likes, bookmarks and comments are disabled.");
        return None;
    };

    Some(Arc::new(JwtIdentityVerifier::new(JwtConfig {
        secret: auth.jwt_secret.clone(),
        issuer: auth.jwt_issuer.clone(),
    })))
}

#[cfg(not(feature = "auth"))]
fn build_verifier(_config: &AppConfig) -> Option<Arc<dyn IdentityVerifier>> {
    tracing::info!("Running without auth feature - authenticated routes are disabled");
    None
}
