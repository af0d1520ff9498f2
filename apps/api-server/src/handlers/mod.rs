//! HTTP handlers and route configuration.

mod engagement;
mod health;
mod posts;

use actix_web::{HttpResponse, http::header::ContentType, web};
use serde::Serialize;

use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

/// Configure all application routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.app_data(
        web::QueryConfig::default()
            .error_handler(|err, _req| AppError::BadRequest(err.to_string()).into()),
    )
    .app_data(
        web::JsonConfig::default()
            .limit(16 * 1024)
            .error_handler(|err, _req| AppError::BadRequest(err.to_string()).into()),
    )
    .service(
        web::scope("/api")
            .route("/health", web::get().to(health::health_check))
            .service(
                web::scope("/posts")
                    .route("", web::get().to(posts::list_posts))
                    // Fixed segments before `{slug}`.
                    .route("/featured", web::get().to(posts::featured_posts))
                    .route("/search", web::get().to(posts::search_posts))
                    .route("/{slug}", web::get().to(posts::get_post))
                    .route("/{slug}/views", web::get().to(engagement::view_count))
                    .route("/{slug}/views", web::post().to(engagement::record_view))
                    .route("/{slug}/reactions", web::get().to(engagement::reactions))
                    .route("/{slug}/like", web::post().to(engagement::like))
                    .route("/{slug}/like", web::delete().to(engagement::unlike))
                    .route("/{slug}/bookmark", web::post().to(engagement::bookmark))
                    .route("/{slug}/bookmark", web::delete().to(engagement::unbookmark))
                    .route("/{slug}/comments", web::get().to(engagement::list_comments))
                    .route("/{slug}/comments", web::post().to(engagement::add_comment)),
            ),
    );
}

/// Cached response body for `key`, if caching is on and the entry is fresh.
async fn cached_json(state: &AppState, key: &str) -> Option<HttpResponse> {
    state.cache_ttl?;
    let body = state.cache.get(key).await?;
    tracing::debug!(key, "Cache hit");
    Some(
        HttpResponse::Ok()
            .content_type(ContentType::json())
            .body(body),
    )
}

/// Serialize `body` once, store it under `key` and return it.
async fn cache_and_respond<T: Serialize>(
    state: &AppState,
    key: &str,
    body: &T,
) -> AppResult<HttpResponse> {
    let json = serde_json::to_string(body)?;

    if let Some(ttl) = state.cache_ttl {
        if let Err(e) = state.cache.set(key, &json, Some(ttl)).await {
            tracing::warn!(key, error = %e, "Failed to cache response");
        }
    }

    Ok(HttpResponse::Ok()
        .content_type(ContentType::json())
        .body(json))
}

#[cfg(test)]
pub(crate) mod test_support {
    //! Shared fixtures for handler tests.

    use std::sync::Arc;
    use std::time::Duration;

    use chrono::{TimeDelta, Utc};
    use uuid::Uuid;

    use folio_core::domain::{Category, Post};
    use folio_core::ports::{AuthError, IdentityVerifier, VerifiedIdentity};
    use folio_infra::InMemoryStore;

    use crate::state::AppState;

    /// Accepts `Bearer user:<uuid>`.
    pub struct StaticVerifier;

    impl IdentityVerifier for StaticVerifier {
        fn verify(&self, token: &str) -> Result<VerifiedIdentity, AuthError> {
            let id = token
                .strip_prefix("user:")
                .and_then(|id| Uuid::parse_str(id).ok())
                .ok_or_else(|| AuthError::InvalidToken("unknown test token".into()))?;
            Ok(VerifiedIdentity {
                user_id: id,
                name: None,
            })
        }
    }

    pub fn bearer(user: Uuid) -> (&'static str, String) {
        ("Authorization", format!("Bearer user:{user}"))
    }

    pub fn state(store: Arc<InMemoryStore>) -> AppState {
        AppState::in_memory(
            store,
            Some(Duration::from_secs(60)),
            Some(Arc::new(StaticVerifier)),
        )
    }

    /// Insert a published post `age_days` old.
    pub async fn seed_post(
        store: &Arc<InMemoryStore>,
        slug: &str,
        title: &str,
        age_days: i64,
        category: Option<&Category>,
    ) -> Post {
        let repos = store.clone().repositories();
        let at = Utc::now() - TimeDelta::days(age_days);
        let mut post = Post::new(slug.to_string(), title.to_string(), at);
        post.published = true;
        post.published_at = at;
        post.excerpt = format!("About {title}");
        post.category_id = category.map(|c| c.id);
        repos.posts.insert(post).await.unwrap()
    }

    pub async fn seed_category(store: &Arc<InMemoryStore>, name: &str) -> Category {
        let repos = store.clone().repositories();
        repos.categories.insert(Category::new(name)).await.unwrap()
    }
}
