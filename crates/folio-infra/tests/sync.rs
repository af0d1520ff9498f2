//! Content synchronization against the filesystem store and the in-memory post store.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

use folio_core::domain::{Post, PostKey, PostListCriteria, ReactionKind};
use folio_core::error::RepoError;
use folio_core::ports::{BaseRepository, PostRepository, Repositories, SystemClock};
use folio_core::services::{
    ContentSynchronizer, EngagementService, FailurePolicy, SyncError, SyncReport,
};
use folio_infra::{FsContentStore, InMemoryStore, StoreStats};

fn doc(title: &str, category: Option<&str>, tags: &[&str]) -> String {
    let mut out = format!("---\ntitle: {title}\ndescription: About {title}\n");
    if let Some(category) = category {
        out.push_str(&format!("category: {category}\n"));
    }
    if !tags.is_empty() {
        out.push_str(&format!("tags: [{}]\n", tags.join(", ")));
    }
    out.push_str("---\n# Body\n");
    out
}

fn write(dir: &Path, name: &str, contents: &str) {
    fs::write(dir.join(name), contents).unwrap();
}

struct Harness {
    dir: tempfile::TempDir,
    store: Arc<InMemoryStore>,
    repos: Repositories,
    source: FsContentStore,
    sync: ContentSynchronizer,
}

impl Harness {
    fn new() -> Self {
        let store = Arc::new(InMemoryStore::new());
        Self::with_repos(store.clone(), store.repositories())
    }

    fn with_repos(store: Arc<InMemoryStore>, repos: Repositories) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let source = FsContentStore::new(dir.path());
        let sync = ContentSynchronizer::new(repos.clone(), Arc::new(SystemClock));
        Self {
            dir,
            store,
            repos,
            source,
            sync,
        }
    }

    fn path(&self) -> &Path {
        self.dir.path()
    }

    async fn stats(&self) -> StoreStats {
        self.store.stats().await
    }

    async fn tag_names(&self, slug: &str) -> Vec<String> {
        let post = self.repos.posts.find_by_slug(slug).await.unwrap().unwrap();
        self.repos
            .tags
            .find_by_post(post.id)
            .await
            .unwrap()
            .into_iter()
            .map(|t| t.name)
            .collect()
    }
}

#[tokio::test]
async fn test_second_run_updates_in_place() {
    let h = Harness::new();
    write(h.path(), "install-homebrew.md", &doc("Install Homebrew", Some("Mac"), &["cli"]));
    write(h.path(), "zsh-setup.mdx", &doc("Zsh Setup", Some("Mac"), &["shell", "cli"]));

    let first = h.sync.run(&h.source).await.unwrap();
    assert_eq!((first.created, first.updated, first.deleted), (2, 0, 0));
    let keys_before = h.repos.posts.list_keys().await.unwrap();
    let stats_before = h.stats().await;
    let zsh_before = h.repos.posts.find_by_slug("zsh-setup").await.unwrap().unwrap();

    let second = h.sync.run(&h.source).await.unwrap();
    assert_eq!((second.created, second.updated, second.deleted), (0, 2, 0));
    assert!(!second.is_partial());

    assert_eq!(h.repos.posts.list_keys().await.unwrap(), keys_before);
    assert_eq!(
        h.stats().await,
        StoreStats {
            posts: 2,
            categories: 1,
            tags: 2,
            post_tags: 3,
            ..Default::default()
        }
    );
    assert_eq!(h.stats().await, stats_before);

    let zsh_after = h.repos.posts.find_by_slug("zsh-setup").await.unwrap().unwrap();
    assert_eq!(zsh_after.title, zsh_before.title);
    assert_eq!(zsh_after.excerpt, zsh_before.excerpt);
    assert_eq!(zsh_after.content, zsh_before.content);
    assert_eq!(zsh_after.category_id, zsh_before.category_id);
    assert_eq!(zsh_after.published_at, zsh_before.published_at);
    assert_eq!(h.tag_names("zsh-setup").await, vec!["shell", "cli"]);

    let mac = h.repos.categories.find_by_slug("mac").await.unwrap().unwrap();
    let post = h.repos.posts.find_by_slug("install-homebrew").await.unwrap().unwrap();
    assert_eq!(post.category_id, Some(mac.id));
    assert!(post.published);
}

#[tokio::test]
async fn test_update_keeps_views_and_creation_time() {
    let h = Harness::new();
    write(h.path(), "a.md", &doc("First title", None, &[]));
    h.sync.run(&h.source).await.unwrap();

    let post = h.repos.posts.find_by_slug("a").await.unwrap().unwrap();
    h.repos.posts.increment_views(post.id).await.unwrap();
    h.repos.posts.increment_views(post.id).await.unwrap();

    write(h.path(), "a.md", &doc("Second title", None, &[]));
    h.sync.run(&h.source).await.unwrap();

    let updated = h.repos.posts.find_by_slug("a").await.unwrap().unwrap();
    assert_eq!(updated.id, post.id);
    assert_eq!(updated.title, "Second title");
    assert_eq!(updated.views, 2);
    assert_eq!(updated.created_at, post.created_at);
}

#[tokio::test]
async fn test_removed_documents_are_deleted_with_their_engagement() {
    let h = Harness::new();
    write(h.path(), "keep.md", &doc("Keep", None, &["x"]));
    write(h.path(), "gone.md", &doc("Gone", None, &["x"]));
    h.sync.run(&h.source).await.unwrap();

    let engagement = EngagementService::new(h.repos.clone(), Arc::new(SystemClock));
    let reader = Uuid::new_v4();
    engagement.add_comment("gone", reader, "Nice post").await.unwrap();
    engagement.react(ReactionKind::Like, "gone", reader).await.unwrap();
    engagement.react(ReactionKind::Bookmark, "gone", reader).await.unwrap();
    let gone = h.repos.posts.find_by_slug("gone").await.unwrap().unwrap();

    fs::remove_file(h.path().join("gone.md")).unwrap();
    let report = h.sync.run(&h.source).await.unwrap();

    assert_eq!((report.updated, report.deleted, report.delete_failed), (1, 1, 0));
    assert!(h.repos.posts.find_by_slug("gone").await.unwrap().is_none());
    assert!(h.repos.comments.find_by_post("gone").await.unwrap().is_empty());
    assert!(h.repos.tags.find_by_post(gone.id).await.unwrap().is_empty());
    assert_eq!(h.repos.reactions.count(ReactionKind::Like, "gone").await.unwrap(), 0);
    assert_eq!(h.repos.reactions.count(ReactionKind::Bookmark, "gone").await.unwrap(), 0);
    assert!(h.repos.posts.find_by_slug("keep").await.unwrap().is_some());
}

#[tokio::test]
async fn test_invalid_documents_are_skipped_not_fatal() {
    let h = Harness::new();
    write(h.path(), "good.md", &doc("Good", None, &[]));
    write(h.path(), "no-title.md", "---\ndescription: Missing title\n---\nbody");
    write(h.path(), "no-description.md", "---\ntitle: Missing description\n---\nbody");
    write(h.path(), "bad-date.md", "---\ntitle: T\ndescription: D\npublishedAt: someday\n---\n");
    write(h.path(), "broken-yaml.md", "---\ntitle: [oops\n---\nbody");

    let report = h.sync.run(&h.source).await.unwrap();

    assert_eq!(report.created, 1);
    assert_eq!(report.skipped, 3);
    assert_eq!(report.failed, 1);
    assert!(report.is_partial());
    assert_eq!(h.repos.posts.list_keys().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_invalid_document_does_not_orphan_its_post() {
    let h = Harness::new();
    write(h.path(), "a.md", &doc("A", None, &[]));
    h.sync.run(&h.source).await.unwrap();

    write(h.path(), "a.md", "---\ndescription: title removed\n---\n");
    let report = h.sync.run(&h.source).await.unwrap();

    assert_eq!((report.skipped, report.deleted), (1, 0));
    let post = h.repos.posts.find_by_slug("a").await.unwrap().unwrap();
    assert_eq!(post.title, "A");
}

#[tokio::test]
async fn test_tags_are_replaced_not_merged() {
    let h = Harness::new();
    write(h.path(), "a.md", &doc("A", None, &["alpha", "beta"]));
    h.sync.run(&h.source).await.unwrap();
    assert_eq!(h.tag_names("a").await, vec!["alpha", "beta"]);

    write(h.path(), "a.md", &doc("A", None, &["beta", "gamma"]));
    h.sync.run(&h.source).await.unwrap();
    assert_eq!(h.tag_names("a").await, vec!["beta", "gamma"]);

    // Detached tags stay available for other posts.
    assert!(h.repos.tags.find_by_slug("alpha").await.unwrap().is_some());
}

#[tokio::test]
async fn test_missing_category_uses_default() {
    let h = Harness::new();
    write(h.path(), "a.md", &doc("A", None, &[]));
    write(h.path(), "b.md", &doc("B", Some("\"!!!\""), &[]));
    h.sync.run(&h.source).await.unwrap();

    let default = h
        .repos
        .categories
        .find_by_slug("uncategorized")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(default.name, "Uncategorized");
    for slug in ["a", "b"] {
        let post = h.repos.posts.find_by_slug(slug).await.unwrap().unwrap();
        assert_eq!(post.category_id, Some(default.id));
    }
}

#[tokio::test]
async fn test_empty_source_performs_no_writes() {
    let h = Harness::new();
    write(h.path(), "a.md", &doc("A", None, &[]));
    h.sync.run(&h.source).await.unwrap();

    fs::remove_file(h.path().join("a.md")).unwrap();
    let report = h.sync.run(&h.source).await.unwrap();
    assert_eq!(report, SyncReport::default());
    assert!(h.repos.posts.find_by_slug("a").await.unwrap().is_some());

    let missing = FsContentStore::new(h.path().join("nope"));
    let report = h.sync.run(&missing).await.unwrap();
    assert_eq!(report, SyncReport::default());
    assert_eq!(h.repos.posts.list_keys().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_unreadable_source_follows_policy() {
    let h = Harness::new();
    write(h.path(), "not-a-dir", "plain file");
    let source = FsContentStore::new(h.path().join("not-a-dir"));

    let err = h
        .sync
        .run_with_policy(&source, FailurePolicy::Propagate)
        .await
        .unwrap_err();
    assert!(matches!(err, SyncError::Source(_)));

    let report = h
        .sync
        .run_with_policy(&source, FailurePolicy::Tolerate)
        .await
        .unwrap();
    assert!(report.aborted.is_some());
}

/// Post repository that can be told to fail, delegating everything else.
struct FlakyPosts {
    inner: Arc<InMemoryStore>,
    faults: Faults,
}

#[derive(Default)]
struct Faults {
    /// `list_keys` fails as if the database were down.
    unreachable: bool,
    /// Inserting this slug fails.
    reject_insert: Option<&'static str>,
    /// Deleting this slug fails.
    reject_delete: Option<&'static str>,
}

#[async_trait]
impl BaseRepository<Post, Uuid> for FlakyPosts {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Post>, RepoError> {
        BaseRepository::<Post, Uuid>::find_by_id(&*self.inner, id).await
    }

    async fn insert(&self, post: Post) -> Result<Post, RepoError> {
        if self.faults.reject_insert == Some(post.slug.as_str()) {
            return Err(RepoError::Query("value too long".into()));
        }
        BaseRepository::<Post, Uuid>::insert(&*self.inner, post).await
    }

    async fn update(&self, post: Post) -> Result<Post, RepoError> {
        BaseRepository::<Post, Uuid>::update(&*self.inner, post).await
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        if let Some(slug) = self.faults.reject_delete {
            let post = BaseRepository::<Post, Uuid>::find_by_id(&*self.inner, id).await?;
            if post.is_some_and(|p| p.slug == slug) {
                return Err(RepoError::Query("statement timeout".into()));
            }
        }
        BaseRepository::<Post, Uuid>::delete(&*self.inner, id).await
    }
}

#[async_trait]
impl PostRepository for FlakyPosts {
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Post>, RepoError> {
        PostRepository::find_by_slug(&*self.inner, slug).await
    }

    async fn find_published_by_slug(&self, slug: &str) -> Result<Option<Post>, RepoError> {
        self.inner.find_published_by_slug(slug).await
    }

    async fn list_keys(&self) -> Result<Vec<PostKey>, RepoError> {
        if self.faults.unreachable {
            return Err(RepoError::Connection("connection refused".into()));
        }
        self.inner.list_keys().await
    }

    async fn list_published(
        &self,
        criteria: &PostListCriteria,
    ) -> Result<(Vec<Post>, u64), RepoError> {
        self.inner.list_published(criteria).await
    }

    async fn find_featured(&self, limit: u64) -> Result<Vec<Post>, RepoError> {
        self.inner.find_featured(limit).await
    }

    async fn find_related(
        &self,
        post_id: Uuid,
        category_id: Uuid,
        limit: u64,
    ) -> Result<Vec<Post>, RepoError> {
        self.inner.find_related(post_id, category_id, limit).await
    }

    async fn search(&self, query: &str, limit: u64) -> Result<Vec<Post>, RepoError> {
        self.inner.search(query, limit).await
    }

    async fn increment_views(&self, id: Uuid) -> Result<i64, RepoError> {
        self.inner.increment_views(id).await
    }
}

fn flaky_harness(faults: Faults) -> Harness {
    let store = Arc::new(InMemoryStore::new());
    let mut repos = store.clone().repositories();
    repos.posts = Arc::new(FlakyPosts {
        inner: store.clone(),
        faults,
    });
    Harness::with_repos(store, repos)
}

#[tokio::test]
async fn test_unreachable_store_follows_policy() {
    let h = flaky_harness(Faults {
        unreachable: true,
        ..Default::default()
    });
    write(h.path(), "a.md", &doc("A", None, &[]));

    let err = h
        .sync
        .run_with_policy(&h.source, FailurePolicy::Propagate)
        .await
        .unwrap_err();
    assert!(matches!(err, SyncError::Store(RepoError::Connection(_))));

    let report = h
        .sync
        .run_with_policy(&h.source, FailurePolicy::Tolerate)
        .await
        .unwrap();
    assert!(report.aborted.unwrap().contains("connection refused"));
    assert_eq!(report.created, 0);
}

#[tokio::test]
async fn test_write_failure_only_affects_its_document() {
    let h = flaky_harness(Faults {
        reject_insert: Some("bad"),
        ..Default::default()
    });
    write(h.path(), "bad.md", &doc("Bad", None, &[]));
    write(h.path(), "good.md", &doc("Good", None, &[]));

    let report = h.sync.run(&h.source).await.unwrap();

    assert_eq!((report.created, report.failed), (1, 1));
    assert!(report.aborted.is_none());
    assert!(h.repos.posts.find_by_slug("good").await.unwrap().is_some());
    assert!(h.repos.posts.find_by_slug("bad").await.unwrap().is_none());
}

#[tokio::test]
async fn test_failed_orphan_delete_does_not_stop_cleanup() {
    let h = flaky_harness(Faults {
        reject_delete: Some("stuck"),
        ..Default::default()
    });
    write(h.path(), "keep.md", &doc("Keep", None, &[]));
    write(h.path(), "stuck.md", &doc("Stuck", None, &[]));
    write(h.path(), "gone.md", &doc("Gone", None, &[]));
    h.sync.run(&h.source).await.unwrap();

    fs::remove_file(h.path().join("stuck.md")).unwrap();
    fs::remove_file(h.path().join("gone.md")).unwrap();
    let report = h.sync.run(&h.source).await.unwrap();

    assert_eq!((report.deleted, report.delete_failed), (1, 1));
    assert!(report.is_partial());
    assert!(report.aborted.is_none());
    assert!(h.repos.posts.find_by_slug("gone").await.unwrap().is_none());
    assert!(h.repos.posts.find_by_slug("stuck").await.unwrap().is_some());
    assert!(h.repos.posts.find_by_slug("keep").await.unwrap().is_some());
}
