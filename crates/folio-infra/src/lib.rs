//! # Folio Infrastructure
//!
//! Concrete implementations of the ports defined in `folio-core`: the
//! filesystem content store, the PostgreSQL and in-memory post stores, the
//! response cache and bearer-token verification.
//!
//! ## Feature Flags
//!
//! - `full` (default) - All features enabled
//! - `minimal` - No external services, in-memory only
//! - `postgres` - PostgreSQL post store via SeaORM
//! - `auth` - JWT identity verification

pub mod cache;
pub mod content;
pub mod database;
pub mod memory;

#[cfg(feature = "auth")]
pub mod auth;

pub use cache::InMemoryCache;
pub use content::FsContentStore;
pub use database::DatabaseConfig;
pub use memory::{InMemoryStore, StoreStats};

#[cfg(feature = "postgres")]
pub use database::{DatabaseConnections, postgres_repositories};

#[cfg(feature = "auth")]
pub use auth::{JwtConfig, JwtIdentityVerifier};
