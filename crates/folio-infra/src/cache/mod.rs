//! Response cache for the read path.

mod memory;

pub use memory::InMemoryCache;
