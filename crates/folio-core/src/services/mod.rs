//! Application services built on the ports.

mod engagement;
mod posts;
mod sync;

pub use engagement::EngagementService;
pub use posts::{MIN_SEARCH_LEN, PostQueryService};
pub use sync::{ContentSynchronizer, DocumentError, FailurePolicy, SyncError, SyncReport};
