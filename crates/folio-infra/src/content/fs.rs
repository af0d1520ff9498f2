use std::collections::HashSet;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use walkdir::WalkDir;

use folio_core::domain::ContentDocument;
use folio_core::ports::{ContentError, ContentSource};
use folio_core::slug::is_valid_slug;

use super::frontmatter::parse_document;

/// Extensions recognised as documents, in lookup priority order.
pub const CONTENT_EXTENSIONS: [&str; 2] = ["md", "mdx"];

/// Flat directory of front-matter documents. The file stem is the slug.
#[derive(Debug, Clone)]
pub struct FsContentStore {
    root: PathBuf,
}

impl FsContentStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[async_trait]
impl ContentSource for FsContentStore {
    async fn slugs(&self) -> Result<Vec<String>, ContentError> {
        let root = self.root.clone();
        tokio::task::spawn_blocking(move || scan_slugs(&root))
            .await
            .map_err(|e| ContentError::Io(e.to_string()))?
    }

    async fn load(&self, slug: &str) -> Result<ContentDocument, ContentError> {
        if !is_valid_slug(slug) {
            return Err(ContentError::InvalidSlug(slug.to_string()));
        }

        for ext in CONTENT_EXTENSIONS {
            let file_name = format!("{slug}.{ext}");
            let raw = match tokio::fs::read_to_string(self.root.join(&file_name)).await {
                Ok(raw) => raw,
                Err(e) if e.kind() == ErrorKind::NotFound => continue,
                Err(e) => return Err(ContentError::Io(format!("{file_name}: {e}"))),
            };

            let (front_matter, body) = parse_document(&file_name, &raw)?;
            return Ok(ContentDocument {
                slug: slug.to_string(),
                file_name,
                front_matter,
                body,
            });
        }

        Err(ContentError::NotFound(slug.to_string()))
    }
}

fn scan_slugs(root: &Path) -> Result<Vec<String>, ContentError> {
    if !root.exists() {
        tracing::warn!(dir = %root.display(), "Content directory missing; treating as empty");
        return Ok(Vec::new());
    }
    if !root.is_dir() {
        return Err(ContentError::Io(format!(
            "{} is not a directory",
            root.display()
        )));
    }

    let walker = WalkDir::new(root)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name();

    let mut seen = HashSet::new();
    let mut slugs = Vec::new();

    for entry in walker {
        let entry = entry.map_err(|e| ContentError::Io(e.to_string()))?;
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        let Some(stem) = document_stem(path) else {
            continue;
        };
        if !is_valid_slug(stem) {
            tracing::warn!(file = %path.display(), "Skipping document with unusable file name");
            continue;
        }
        if !seen.insert(stem.to_string()) {
            tracing::warn!(file = %path.display(), slug = stem, "Duplicate slug; keeping the first file");
            continue;
        }
        slugs.push(stem.to_string());
    }

    Ok(slugs)
}

/// Stem of a visible `.md`/`.mdx` file, `None` for anything else.
fn document_stem(path: &Path) -> Option<&str> {
    let ext = path.extension()?.to_str()?;
    if !CONTENT_EXTENSIONS.contains(&ext) {
        return None;
    }
    let stem = path.file_stem()?.to_str()?;
    (!stem.starts_with('.')).then_some(stem)
}
