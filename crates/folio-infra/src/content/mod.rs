//! Filesystem content store: `.md`/`.mdx` documents with YAML front-matter.

mod frontmatter;
mod fs;

pub use frontmatter::parse_document;
pub use fs::{CONTENT_EXTENSIONS, FsContentStore};
