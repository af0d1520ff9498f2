//! Views, likes, bookmarks and comments on published posts.

use std::sync::Arc;

use uuid::Uuid;

use crate::domain::{Comment, MAX_COMMENT_LEN, Post, Reaction, ReactionKind, ReactionSummary};
use crate::error::DomainError;
use crate::ports::{Clock, Repositories};
use crate::slug::is_valid_slug;

#[derive(Clone)]
pub struct EngagementService {
    repos: Repositories,
    clock: Arc<dyn Clock>,
}

impl EngagementService {
    pub fn new(repos: Repositories, clock: Arc<dyn Clock>) -> Self {
        Self { repos, clock }
    }

    pub async fn record_view(&self, slug: &str) -> Result<i64, DomainError> {
        let post = self.published_post(slug).await?;
        Ok(self.repos.posts.increment_views(post.id).await?)
    }

    pub async fn view_count(&self, slug: &str) -> Result<i64, DomainError> {
        Ok(self.published_post(slug).await?.views)
    }

    /// Add a like or bookmark. A second identical reaction is a `Duplicate` error,
    /// which callers treat as "already in the desired state".
    pub async fn react(
        &self,
        kind: ReactionKind,
        slug: &str,
        user_id: Uuid,
    ) -> Result<(), DomainError> {
        let post = self.published_post(slug).await?;
        self.repos
            .reactions
            .add(Reaction {
                kind,
                post_slug: post.slug,
                user_id,
                created_at: self.clock.now(),
            })
            .await?;
        tracing::debug!(kind = kind.as_str(), slug, %user_id, "Reaction added");
        Ok(())
    }

    /// Remove a like or bookmark. Returns `false` when there was nothing to remove.
    pub async fn unreact(
        &self,
        kind: ReactionKind,
        slug: &str,
        user_id: Uuid,
    ) -> Result<bool, DomainError> {
        let post = self.published_post(slug).await?;
        Ok(self.repos.reactions.remove(kind, &post.slug, user_id).await?)
    }

    pub async fn reaction_summary(
        &self,
        slug: &str,
        viewer: Option<Uuid>,
    ) -> Result<ReactionSummary, DomainError> {
        let post = self.published_post(slug).await?;
        let reactions = &self.repos.reactions;

        let mut summary = ReactionSummary {
            likes: reactions.count(ReactionKind::Like, &post.slug).await?,
            bookmarks: reactions.count(ReactionKind::Bookmark, &post.slug).await?,
            ..Default::default()
        };
        if let Some(user_id) = viewer {
            summary.liked = reactions
                .exists(ReactionKind::Like, &post.slug, user_id)
                .await?;
            summary.bookmarked = reactions
                .exists(ReactionKind::Bookmark, &post.slug, user_id)
                .await?;
        }
        Ok(summary)
    }

    pub async fn list_comments(&self, slug: &str) -> Result<Vec<Comment>, DomainError> {
        let post = self.published_post(slug).await?;
        Ok(self.repos.comments.find_by_post(&post.slug).await?)
    }

    pub async fn add_comment(
        &self,
        slug: &str,
        user_id: Uuid,
        content: &str,
    ) -> Result<Comment, DomainError> {
        let content = content.trim();
        if content.is_empty() {
            return Err(DomainError::validation("comment must not be empty"));
        }
        if content.chars().count() > MAX_COMMENT_LEN {
            return Err(DomainError::validation(format!(
                "comment must be at most {MAX_COMMENT_LEN} characters"
            )));
        }

        let post = self.published_post(slug).await?;
        let comment = Comment::new(post.slug, user_id, content.to_string(), self.clock.now());
        Ok(self.repos.comments.insert(comment).await?)
    }

    async fn published_post(&self, slug: &str) -> Result<Post, DomainError> {
        if !is_valid_slug(slug) {
            return Err(DomainError::validation(format!("invalid slug {slug:?}")));
        }
        self.repos
            .posts
            .find_published_by_slug(slug)
            .await?
            .ok_or_else(|| DomainError::not_found("post", slug))
    }
}
