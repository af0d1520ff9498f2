//! Ports - trait definitions for external dependencies.
//! These are the "interfaces" that infrastructure must implement.

mod auth;
mod cache;
mod clock;
mod content;
mod repository;

pub use auth::{AuthError, IdentityVerifier, VerifiedIdentity};
pub use cache::{Cache, CacheError};
pub use clock::{Clock, SystemClock};
pub use content::{ContentError, ContentSource};
pub use repository::{
    BaseRepository, CategoryRepository, CommentRepository, PostRepository, ReactionRepository,
    Repositories, TagRepository,
};
