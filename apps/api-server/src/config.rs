//! Application configuration loaded from environment variables.

use std::env;
use std::time::Duration;

use folio_infra::DatabaseConfig;

/// Seconds a list or featured response stays cached when `CACHE_TTL_SECS` is unset.
const DEFAULT_CACHE_TTL_SECS: u64 = 60;

/// Application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub database: Option<DatabaseConfig>,
    /// `None` disables response caching.
    pub cache_ttl: Option<Duration>,
    pub auth: Option<AuthConfig>,
}

/// Shared secret of the external auth provider.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub jwt_issuer: Option<String>,
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let database = env::var("DATABASE_URL").ok().map(|url| {
            let mut config = DatabaseConfig::new(url);
            if let Some(max) = parse_var("DB_MAX_CONNECTIONS") {
                config.max_connections = max;
            }
            if let Some(min) = parse_var("DB_MIN_CONNECTIONS") {
                config.min_connections = min;
            }
            config
        });

        let cache_ttl_secs = parse_var("CACHE_TTL_SECS").unwrap_or(DEFAULT_CACHE_TTL_SECS);
        let cache_ttl = (cache_ttl_secs > 0).then(|| Duration::from_secs(cache_ttl_secs));

        let auth = env::var("JWT_SECRET")
            .ok()
            .filter(|s| !s.is_empty())
            .map(|jwt_secret| AuthConfig {
                jwt_secret,
                jwt_issuer: env::var("JWT_ISSUER").ok().filter(|s| !s.is_empty()),
            });

        Self {
            host: env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: parse_var("PORT").unwrap_or(8080),
            database,
            cache_ttl,
            auth,
        }
    }
}

fn parse_var<T: std::str::FromStr>(key: &str) -> Option<T> {
    let raw = env::var(key).ok()?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!(key, value = %raw, "Ignoring unparsable environment variable");
            None
        }
    }
}
