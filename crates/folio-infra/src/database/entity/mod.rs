//! SeaORM entities for the post store.

pub mod category;
pub mod comment;
pub mod post;
pub mod post_bookmark;
pub mod post_like;
pub mod post_tag;
pub mod tag;
