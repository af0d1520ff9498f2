//! Content synchronization.
//!
//! Reconciles the content directory (source of truth) into the post store:
//!
//! ```text
//! ContentSource::slugs()
//!     │
//!     ├── for each slug: load → validate → upsert category → upsert post → replace tags
//!     │                  (a failure is logged and counted, the run continues)
//!     │
//!     └── persisted slugs not listed: comments → tag links → reactions → post
//! ```
//!
//! Runs are not guarded against each other; run at most one synchronizer at a time.

use std::collections::HashSet;
use std::sync::Arc;

use serde::Serialize;

use crate::domain::{Category, ContentDocument, DEFAULT_CATEGORY, Post, PostKey, Tag};
use crate::error::RepoError;
use crate::ports::{Clock, ContentError, ContentSource, Repositories};
use crate::slug::slugify;

/// What to do when the whole run fails (store unreachable, source unreadable).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Return the error to the caller.
    #[default]
    Propagate,
    /// Log a warning and report the run as aborted. Used for deployment builds
    /// where the sync must not block the release.
    Tolerate,
}

/// Outcome counters of one synchronization run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    pub created: usize,
    pub updated: usize,
    /// Documents rejected by validation.
    pub skipped: usize,
    /// Documents that failed to load or write.
    pub failed: usize,
    pub deleted: usize,
    pub delete_failed: usize,
    /// Set when a catastrophic failure was tolerated.
    pub aborted: Option<String>,
}

impl SyncReport {
    fn aborted(reason: String) -> Self {
        Self {
            aborted: Some(reason),
            ..Self::default()
        }
    }

    /// Some documents or orphans failed while the rest went through.
    pub fn is_partial(&self) -> bool {
        self.skipped + self.failed + self.delete_failed > 0
    }

    pub fn failures(&self) -> usize {
        self.skipped + self.failed + self.delete_failed
    }
}

/// Fatal synchronization errors. Per-document problems never surface here.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("Failed to list content documents: {0}")]
    Source(#[from] ContentError),

    #[error("Failed to read persisted posts: {0}")]
    Store(#[from] RepoError),
}

/// Failure of a single document.
#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    #[error("{0}")]
    Invalid(String),

    #[error(transparent)]
    Content(#[from] ContentError),

    #[error(transparent)]
    Store(#[from] RepoError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Upserted {
    Created,
    Updated,
}

/// Reconciles a `ContentSource` into the repositories.
pub struct ContentSynchronizer {
    repos: Repositories,
    clock: Arc<dyn Clock>,
}

impl ContentSynchronizer {
    pub fn new(repos: Repositories, clock: Arc<dyn Clock>) -> Self {
        Self { repos, clock }
    }

    /// Run once, applying `policy` to catastrophic failures.
    pub async fn run_with_policy(
        &self,
        source: &dyn ContentSource,
        policy: FailurePolicy,
    ) -> Result<SyncReport, SyncError> {
        match self.run(source).await {
            Ok(report) => Ok(report),
            Err(e) if policy == FailurePolicy::Tolerate => {
                tracing::warn!(
                    sync_aborted = true,
                    error = %e,
                    "Content synchronization aborted; continuing because failures are tolerated"
                );
                Ok(SyncReport::aborted(e.to_string()))
            }
            Err(e) => Err(e),
        }
    }

    /// Run once. An empty or missing source performs no writes at all.
    pub async fn run(&self, source: &dyn ContentSource) -> Result<SyncReport, SyncError> {
        let slugs = source.slugs().await?;
        if slugs.is_empty() {
            tracing::info!("No content documents found, skipping synchronization");
            return Ok(SyncReport::default());
        }

        let persisted = self.repos.posts.list_keys().await?;
        tracing::info!(
            documents = slugs.len(),
            persisted = persisted.len(),
            "Starting content synchronization"
        );

        let mut report = SyncReport::default();

        for slug in &slugs {
            let (file, outcome) = match source.load(slug).await {
                Ok(doc) => {
                    let file = doc.file_name.clone();
                    (file, self.sync_document(doc).await)
                }
                Err(e) => (slug.clone(), Err(e.into())),
            };

            match outcome {
                Ok(Upserted::Created) => {
                    tracing::debug!(file = %file, "Created post");
                    report.created += 1;
                }
                Ok(Upserted::Updated) => {
                    tracing::debug!(file = %file, "Updated post");
                    report.updated += 1;
                }
                Err(DocumentError::Invalid(reason)) => {
                    tracing::warn!(file = %file, reason = %reason, "Skipping invalid document");
                    report.skipped += 1;
                }
                Err(e) => {
                    tracing::error!(file = %file, error = %e, "Failed to synchronize document");
                    report.failed += 1;
                }
            }
        }

        // A listed document that failed is still present, so it is never an orphan.
        let listed: HashSet<&str> = slugs.iter().map(String::as_str).collect();
        for orphan in persisted.iter().filter(|k| !listed.contains(k.slug.as_str())) {
            match self.delete_orphan(orphan).await {
                Ok(()) => {
                    tracing::info!(slug = %orphan.slug, "Deleted post without source document");
                    report.deleted += 1;
                }
                Err(e) => {
                    tracing::error!(slug = %orphan.slug, error = %e, "Failed to delete orphaned post");
                    report.delete_failed += 1;
                }
            }
        }

        tracing::info!(
            created = report.created,
            updated = report.updated,
            skipped = report.skipped,
            failed = report.failed,
            deleted = report.deleted,
            delete_failed = report.delete_failed,
            "Content synchronization finished"
        );

        Ok(report)
    }

    async fn sync_document(&self, doc: ContentDocument) -> Result<Upserted, DocumentError> {
        let fm = &doc.front_matter;
        let title = fm
            .title()
            .ok_or_else(|| DocumentError::Invalid("missing required field `title`".into()))?
            .to_string();
        let excerpt = fm
            .description()
            .ok_or_else(|| DocumentError::Invalid("missing required field `description`".into()))?
            .to_string();
        let published_at = fm.published_at().map_err(DocumentError::Invalid)?;

        let category = self
            .resolve_category(fm.category().unwrap_or(DEFAULT_CATEGORY))
            .await?;
        let now = self.clock.now();

        let (post, outcome) = match self.repos.posts.find_by_slug(&doc.slug).await? {
            Some(mut post) => {
                post.title = title;
                if let Some(ts) = published_at {
                    post.published_at = ts;
                }
                post.updated_at = now;
                apply_document(&mut post, &doc, excerpt, category.id);
                (self.repos.posts.update(post).await?, Upserted::Updated)
            }
            None => {
                let mut post = Post::new(doc.slug.clone(), title, now);
                post.published_at = published_at.unwrap_or(now);
                apply_document(&mut post, &doc, excerpt, category.id);
                (self.repos.posts.insert(post).await?, Upserted::Created)
            }
        };

        let mut tag_ids = Vec::with_capacity(fm.tags.len());
        for name in normalize_tag_names(&fm.tags) {
            tag_ids.push(self.resolve_tag(name).await?.id);
        }
        self.repos.tags.replace_for_post(post.id, &tag_ids).await?;

        Ok(outcome)
    }

    /// Find by slug or create. Existing categories are left untouched.
    async fn resolve_category(&self, name: &str) -> Result<Category, RepoError> {
        let name = if slugify(name).is_empty() {
            DEFAULT_CATEGORY
        } else {
            name
        };
        let candidate = Category::new(name);

        if let Some(existing) = self.repos.categories.find_by_slug(&candidate.slug).await? {
            return Ok(existing);
        }

        let slug = candidate.slug.clone();
        match self.repos.categories.insert(candidate).await {
            Ok(created) => {
                tracing::info!(category = %created.slug, color = %created.color, "Created category");
                Ok(created)
            }
            // Lost a race with a concurrent insert; the row exists now.
            Err(RepoError::Constraint(_)) => self
                .repos
                .categories
                .find_by_slug(&slug)
                .await?
                .ok_or(RepoError::NotFound),
            Err(e) => Err(e),
        }
    }

    async fn resolve_tag(&self, name: &str) -> Result<Tag, RepoError> {
        let candidate = Tag::new(name);

        if let Some(existing) = self.repos.tags.find_by_slug(&candidate.slug).await? {
            return Ok(existing);
        }

        let slug = candidate.slug.clone();
        match self.repos.tags.insert(candidate).await {
            Ok(created) => Ok(created),
            Err(RepoError::Constraint(_)) => self
                .repos
                .tags
                .find_by_slug(&slug)
                .await?
                .ok_or(RepoError::NotFound),
            Err(e) => Err(e),
        }
    }

    /// Children first so foreign keys never dangle.
    async fn delete_orphan(&self, key: &PostKey) -> Result<(), RepoError> {
        self.repos.comments.delete_by_post(&key.slug).await?;
        self.repos.tags.detach_post(key.id).await?;
        self.repos.reactions.delete_by_post(&key.slug).await?;
        self.repos.posts.delete(key.id).await
    }
}

fn apply_document(post: &mut Post, doc: &ContentDocument, excerpt: String, category_id: uuid::Uuid) {
    let fm = &doc.front_matter;
    post.excerpt = excerpt;
    post.content = doc.body.clone();
    post.category_id = Some(category_id);
    post.published = true;
    post.featured = fm.featured;
    post.reading_time = fm.reading_time();
    post.author = fm.author().map(str::to_string);
    post.featured_image = fm.image().map(str::to_string);
}

/// Trimmed tag names, blank and duplicate slugs dropped, order kept.
fn normalize_tag_names(names: &[String]) -> Vec<&str> {
    let mut seen = HashSet::new();
    names
        .iter()
        .map(|n| n.trim())
        .filter(|n| {
            let slug = slugify(n);
            !slug.is_empty() && seen.insert(slug)
        })
        .collect()
}
