//! # Folio Core
//!
//! The domain layer of the Folio tutorial backend.
//! This crate holds the post/category/tag model, slug rules, the ports that
//! infrastructure implements, and the two services built on top of them:
//! content synchronization and post queries. It has zero infrastructure dependencies.

pub mod domain;
pub mod error;
pub mod ports;
pub mod services;
pub mod slug;

pub use error::DomainError;
