//! Views, likes, bookmarks and comments.

use actix_web::{HttpResponse, web};

use folio_core::domain::ReactionKind;
use folio_shared::ApiResponse;
use folio_shared::dto::{CommentRequest, ViewCountResponse};

use crate::middleware::auth::{Identity, OptionalIdentity};
use crate::middleware::error::AppResult;
use crate::state::AppState;

/// GET /api/posts/{slug}/views
pub async fn view_count(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let slug = path.into_inner();
    let views = state.engagement.view_count(&slug).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(ViewCountResponse { slug, views })))
}

/// POST /api/posts/{slug}/views
pub async fn record_view(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let slug = path.into_inner();
    let views = state.engagement.record_view(&slug).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(ViewCountResponse { slug, views })))
}

/// GET /api/posts/{slug}/reactions
///
/// Counts are public; `liked`/`bookmarked` are only set for a signed-in reader.
pub async fn reactions(
    state: web::Data<AppState>,
    path: web::Path<String>,
    identity: OptionalIdentity,
) -> AppResult<HttpResponse> {
    let viewer = identity.0.map(|i| i.user_id);
    let summary = state
        .engagement
        .reaction_summary(&path.into_inner(), viewer)
        .await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(summary)))
}

async fn add_reaction(
    state: &AppState,
    kind: ReactionKind,
    slug: &str,
    identity: &Identity,
) -> AppResult<HttpResponse> {
    state.engagement.react(kind, slug, identity.user_id).await?;
    let summary = state
        .engagement
        .reaction_summary(slug, Some(identity.user_id))
        .await?;
    Ok(HttpResponse::Created().json(ApiResponse::ok(summary)))
}

async fn remove_reaction(
    state: &AppState,
    kind: ReactionKind,
    slug: &str,
    identity: &Identity,
) -> AppResult<HttpResponse> {
    let removed = state.engagement.unreact(kind, slug, identity.user_id).await?;
    let summary = state
        .engagement
        .reaction_summary(slug, Some(identity.user_id))
        .await?;
    let response = if removed {
        ApiResponse::ok(summary)
    } else {
        ApiResponse::ok_with_message(summary, format!("no {} to remove", kind.as_str()))
    };
    Ok(HttpResponse::Ok().json(response))
}

/// POST /api/posts/{slug}/like - 409 when already liked.
pub async fn like(
    state: web::Data<AppState>,
    path: web::Path<String>,
    identity: Identity,
) -> AppResult<HttpResponse> {
    add_reaction(&state, ReactionKind::Like, &path.into_inner(), &identity).await
}

/// DELETE /api/posts/{slug}/like
pub async fn unlike(
    state: web::Data<AppState>,
    path: web::Path<String>,
    identity: Identity,
) -> AppResult<HttpResponse> {
    remove_reaction(&state, ReactionKind::Like, &path.into_inner(), &identity).await
}

/// POST /api/posts/{slug}/bookmark - 409 when already bookmarked.
pub async fn bookmark(
    state: web::Data<AppState>,
    path: web::Path<String>,
    identity: Identity,
) -> AppResult<HttpResponse> {
    add_reaction(&state, ReactionKind::Bookmark, &path.into_inner(), &identity).await
}

/// DELETE /api/posts/{slug}/bookmark
pub async fn unbookmark(
    state: web::Data<AppState>,
    path: web::Path<String>,
    identity: Identity,
) -> AppResult<HttpResponse> {
    remove_reaction(&state, ReactionKind::Bookmark, &path.into_inner(), &identity).await
}

/// GET /api/posts/{slug}/comments
pub async fn list_comments(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let comments = state.engagement.list_comments(&path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(comments)))
}

/// POST /api/posts/{slug}/comments
pub async fn add_comment(
    state: web::Data<AppState>,
    path: web::Path<String>,
    identity: Identity,
    body: web::Json<CommentRequest>,
) -> AppResult<HttpResponse> {
    let slug = path.into_inner();
    let comment = state
        .engagement
        .add_comment(&slug, identity.user_id, &body.content)
        .await?;

    tracing::info!(
        slug = %slug,
        user = %identity.user_id,
        name = identity.name.as_deref().unwrap_or("anonymous"),
        "Comment added"
    );

    Ok(HttpResponse::Created().json(ApiResponse::ok(comment)))
}
