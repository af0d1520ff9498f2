//! # Folio Shared
//!
//! Request and response types of the public HTTP API. Kept free of domain
//! crates so a frontend can depend on it directly.

pub mod dto;
pub mod response;

pub use response::{ApiResponse, ErrorResponse};
