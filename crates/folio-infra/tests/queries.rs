//! Read-path and engagement services against the in-memory post store.

use std::sync::Arc;

use chrono::{TimeDelta, Utc};
use uuid::Uuid;

use folio_core::DomainError;
use folio_core::domain::{
    Category, ListPostsQuery, Post, PostFilters, PostSort, ReactionKind, SortField, SortOrder, Tag,
};
use folio_core::ports::{Repositories, SystemClock};
use folio_core::services::{EngagementService, PostQueryService};
use folio_infra::InMemoryStore;

struct Fixture {
    repos: Repositories,
    posts: PostQueryService,
    engagement: EngagementService,
}

impl Fixture {
    fn new() -> Self {
        let repos = Arc::new(InMemoryStore::new()).repositories();
        Self {
            posts: PostQueryService::new(repos.clone()),
            engagement: EngagementService::new(repos.clone(), Arc::new(SystemClock)),
            repos,
        }
    }

    async fn category(&self, name: &str) -> Category {
        self.repos.categories.insert(Category::new(name)).await.unwrap()
    }

    async fn tag(&self, name: &str) -> Tag {
        self.repos.tags.insert(Tag::new(name)).await.unwrap()
    }

    /// Published post, `age_days` old.
    async fn post(
        &self,
        slug: &str,
        title: &str,
        age_days: i64,
        category: Option<&Category>,
    ) -> Post {
        let at = Utc::now() - TimeDelta::days(age_days);
        let mut post = Post::new(slug.to_string(), title.to_string(), at);
        post.published = true;
        post.published_at = at;
        post.excerpt = format!("About {title}");
        post.category_id = category.map(|c| c.id);
        self.repos.posts.insert(post).await.unwrap()
    }
}

fn query(page: u64, limit: u64) -> ListPostsQuery {
    ListPostsQuery {
        page: Some(page),
        limit: Some(limit),
        ..Default::default()
    }
}

fn slugs<T>(items: &[T], slug: impl Fn(&T) -> &str) -> Vec<String> {
    items.iter().map(|i| slug(i).to_string()).collect()
}

#[tokio::test]
async fn test_pagination_reports_totals() {
    let f = Fixture::new();
    for i in 0..25 {
        f.post(&format!("post-{i:02}"), &format!("Post {i}"), i, None).await;
    }

    let page = f.posts.list_posts(query(3, 10)).await.unwrap();
    assert_eq!(page.data.len(), 5);
    assert_eq!(page.pagination.total, 25);
    assert_eq!(page.pagination.total_pages, 3);
    assert!(!page.pagination.has_next);
    assert!(page.pagination.has_prev);
    // Newest first: page 3 holds the five oldest.
    assert_eq!(page.data[0].post.slug, "post-20");

    let past_end = f.posts.list_posts(query(4, 10)).await.unwrap();
    assert!(past_end.data.is_empty());
    assert_eq!(past_end.pagination.total, 25);

    let defaults = f.posts.list_posts(ListPostsQuery::default()).await.unwrap();
    assert_eq!(defaults.pagination.limit, 10);
    assert_eq!(defaults.pagination.page, 1);
}

#[tokio::test]
async fn test_huge_page_is_empty_not_an_error() {
    let f = Fixture::new();
    for i in 0..3 {
        f.post(&format!("post-{i}"), &format!("Post {i}"), i, None).await;
    }

    for page in [100_000_000_000_000_000, u64::MAX] {
        let result = f.posts.list_posts(query(page, 100)).await.unwrap();
        assert!(result.data.is_empty());
        assert_eq!(result.pagination.page, page);
        assert_eq!(result.pagination.total, 3);
        assert_eq!(result.pagination.total_pages, 1);
        assert!(!result.pagination.has_next);
    }
}

#[tokio::test]
async fn test_invalid_paging_is_rejected() {
    let f = Fixture::new();
    for q in [query(0, 10), query(1, 0), query(1, 101)] {
        let err = f.posts.list_posts(q).await.unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }
}

#[tokio::test]
async fn test_unpublished_posts_are_invisible() {
    let f = Fixture::new();
    f.post("visible", "Visible", 0, None).await;
    let mut draft = Post::new("draft".into(), "Draft".into(), Utc::now());
    draft.featured = true;
    f.repos.posts.insert(draft).await.unwrap();

    let page = f.posts.list_posts(query(1, 10)).await.unwrap();
    assert_eq!(slugs(&page.data, |d| d.post.slug.as_str()), vec!["visible"]);
    assert!(f.posts.get_post_by_slug("draft").await.unwrap().is_none());
    assert!(f.posts.get_featured_posts(5).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_category_and_tag_filters() {
    let f = Fixture::new();
    let mac = f.category("Mac").await;
    let linux = f.category("Linux").await;
    let cli = f.tag("CLI").await;

    let brew = f.post("install-homebrew", "Install Homebrew", 1, Some(&mac)).await;
    f.post("mac-shortcuts", "Mac Shortcuts", 2, Some(&mac)).await;
    let apt = f.post("apt-basics", "APT Basics", 3, Some(&linux)).await;
    f.repos.tags.replace_for_post(brew.id, &[cli.id]).await.unwrap();
    f.repos.tags.replace_for_post(apt.id, &[cli.id]).await.unwrap();

    let by_category = |slug: &str| ListPostsQuery {
        filters: PostFilters {
            category_slug: Some(slug.to_string()),
            ..Default::default()
        },
        ..Default::default()
    };

    let page = f.posts.list_posts(by_category("mac")).await.unwrap();
    assert_eq!(
        slugs(&page.data, |d| d.post.slug.as_str()),
        vec!["install-homebrew", "mac-shortcuts"]
    );
    assert_eq!(page.data[0].category.as_ref().map(|c| c.name.as_str()), Some("Mac"));
    assert_eq!(page.data[0].tags, vec![cli.clone()]);

    let unknown = f.posts.list_posts(by_category("nope")).await.unwrap();
    assert!(unknown.data.is_empty());
    assert_eq!(unknown.pagination.total, 0);

    let tagged = f
        .posts
        .list_posts(ListPostsQuery {
            filters: PostFilters {
                tag_slug: Some("cli".into()),
                ..Default::default()
            },
            sort: PostSort::new(SortField::Title, SortOrder::Asc),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(
        slugs(&tagged.data, |d| d.post.slug.as_str()),
        vec!["apt-basics", "install-homebrew"]
    );
}

#[tokio::test]
async fn test_search_requires_two_characters() {
    let f = Fixture::new();
    f.post("install-homebrew", "Install Homebrew", 1, None).await;
    f.post("zsh", "Zsh", 0, None).await;

    for short in ["a", " b ", ""] {
        let err = f.posts.search_posts(short, 10).await.unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    let hits = f.posts.search_posts("  BREW ", 10).await.unwrap();
    assert_eq!(slugs(&hits, |d| d.post.slug.as_str()), vec!["install-homebrew"]);

    let listed = f
        .posts
        .list_posts(ListPostsQuery {
            filters: PostFilters {
                search: Some("zsh".into()),
                ..Default::default()
            },
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(listed.pagination.total, 1);
}

#[tokio::test]
async fn test_detail_counts_views() {
    let f = Fixture::new();
    f.post("a", "A", 0, None).await;

    let first = f.posts.get_post_by_slug("a").await.unwrap().unwrap();
    let second = f.posts.get_post_by_slug("a").await.unwrap().unwrap();
    assert_eq!((first.post.views, second.post.views), (1, 2));

    assert!(f.posts.get_post_by_slug("missing").await.unwrap().is_none());
    assert!(matches!(
        f.posts.get_post_by_slug("../etc/passwd").await,
        Err(DomainError::Validation(_))
    ));
}

#[tokio::test]
async fn test_featured_and_related() {
    let f = Fixture::new();
    let mac = f.category("Mac").await;
    let a = f.post("a", "A", 3, Some(&mac)).await;
    f.post("b", "B", 1, Some(&mac)).await;
    f.post("c", "C", 2, Some(&mac)).await;
    f.post("other", "Other", 0, None).await;

    let mut star = f.repos.posts.find_by_slug("c").await.unwrap().unwrap();
    star.featured = true;
    f.repos.posts.update(star).await.unwrap();

    let featured = f.posts.get_featured_posts(3).await.unwrap();
    assert_eq!(slugs(&featured, |d| d.post.slug.as_str()), vec!["c"]);

    let related = f.posts.get_related_posts(a.id, a.category_id, 5).await.unwrap();
    assert_eq!(slugs(&related, |d| d.post.slug.as_str()), vec!["b", "c"]);

    let none = f.posts.get_related_posts(a.id, None, 5).await.unwrap();
    assert!(none.is_empty());
}

#[tokio::test]
async fn test_reactions_are_unique_per_user() {
    let f = Fixture::new();
    f.post("a", "A", 0, None).await;
    let (ada, bob) = (Uuid::new_v4(), Uuid::new_v4());

    f.engagement.react(ReactionKind::Like, "a", ada).await.unwrap();
    let dup = f.engagement.react(ReactionKind::Like, "a", ada).await;
    assert!(matches!(dup, Err(DomainError::Duplicate(_))));
    f.engagement.react(ReactionKind::Like, "a", bob).await.unwrap();
    f.engagement.react(ReactionKind::Bookmark, "a", ada).await.unwrap();

    let summary = f.engagement.reaction_summary("a", Some(bob)).await.unwrap();
    assert_eq!((summary.likes, summary.bookmarks), (2, 1));
    assert!(summary.liked);
    assert!(!summary.bookmarked);

    assert!(f.engagement.unreact(ReactionKind::Like, "a", ada).await.unwrap());
    assert!(!f.engagement.unreact(ReactionKind::Like, "a", ada).await.unwrap());

    let anonymous = f.engagement.reaction_summary("a", None).await.unwrap();
    assert_eq!(anonymous.likes, 1);
    assert!(!anonymous.liked);

    let missing = f.engagement.react(ReactionKind::Like, "nope", ada).await;
    assert!(matches!(missing, Err(DomainError::NotFound { .. })));
}

#[tokio::test]
async fn test_views_via_engagement() {
    let f = Fixture::new();
    f.post("a", "A", 0, None).await;

    assert_eq!(f.engagement.record_view("a").await.unwrap(), 1);
    assert_eq!(f.engagement.record_view("a").await.unwrap(), 2);
    assert_eq!(f.engagement.view_count("a").await.unwrap(), 2);
}

#[tokio::test]
async fn test_comments_are_validated_and_ordered() {
    let f = Fixture::new();
    f.post("a", "A", 0, None).await;
    let user = Uuid::new_v4();

    let too_long = "x".repeat(2001);
    for bad in ["", "   ", too_long.as_str()] {
        let err = f.engagement.add_comment("a", user, bad).await.unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    let first = f.engagement.add_comment("a", user, "  First!  ").await.unwrap();
    assert_eq!(first.content, "First!");
    f.engagement.add_comment("a", user, &"y".repeat(2000)).await.unwrap();

    let comments = f.engagement.list_comments("a").await.unwrap();
    assert_eq!(comments.len(), 2);
    assert_eq!(comments[0].id, first.id);

    let missing = f.engagement.add_comment("nope", user, "hi").await;
    assert!(matches!(missing, Err(DomainError::NotFound { .. })));
}
