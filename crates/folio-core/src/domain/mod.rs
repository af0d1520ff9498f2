//! Domain entities - the core business objects.

mod category;
mod comment;
mod document;
mod pagination;
mod post;
mod query;
mod reaction;
mod tag;

pub use category::{CATEGORY_PALETTE, Category, DEFAULT_CATEGORY};
pub use comment::{Comment, MAX_COMMENT_LEN};
pub use document::{ContentDocument, DEFAULT_READING_TIME, FrontMatter};
pub use pagination::{Page, Pagination, page_offset};
pub use post::{Post, PostDetail, PostKey};
pub use query::{
    DEFAULT_PAGE_SIZE, ListPostsQuery, MAX_PAGE_SIZE, PostFilters, PostListCriteria, PostSort,
    SortField, SortOrder,
};
pub use reaction::{Reaction, ReactionKind, ReactionSummary};
pub use tag::Tag;
