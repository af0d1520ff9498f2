//! Post listing, detail, featured and search endpoints.

use actix_web::{HttpRequest, HttpResponse, web};
use serde::Serialize;

use folio_core::domain::{ListPostsQuery, PostDetail, PostFilters, PostSort};
use folio_shared::ApiResponse;
use folio_shared::dto::{LimitParams, ListPostsParams, SearchParams};

use super::{cache_and_respond, cached_json};
use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

const DEFAULT_FEATURED_LIMIT: u64 = 3;
const DEFAULT_RELATED_LIMIT: u64 = 3;
const DEFAULT_SEARCH_LIMIT: u64 = 10;

/// Detail page payload: the post plus others from its category.
#[derive(Serialize)]
pub struct PostPage {
    #[serde(flatten)]
    pub post: PostDetail,
    pub related: Vec<PostDetail>,
}

/// GET /api/posts?category=&tag=&search=&featured=&sort=&page=&limit=
pub async fn list_posts(
    state: web::Data<AppState>,
    req: HttpRequest,
    params: web::Query<ListPostsParams>,
) -> AppResult<HttpResponse> {
    let cache_key = format!("posts:list:{}", req.query_string());
    if let Some(hit) = cached_json(&state, &cache_key).await {
        return Ok(hit);
    }

    let params = params.into_inner();
    let sort = match params.sort.as_deref() {
        Some(raw) => PostSort::from_param(raw)
            .ok_or_else(|| AppError::BadRequest(format!("unknown sort '{raw}'")))?,
        None => PostSort::default(),
    };

    let page = state
        .posts
        .list_posts(ListPostsQuery {
            page: params.page,
            limit: params.limit,
            filters: PostFilters {
                category_slug: params.category,
                tag_slug: params.tag,
                search: params.search,
                featured: params.featured,
            },
            sort,
        })
        .await?;

    cache_and_respond(&state, &cache_key, &ApiResponse::ok(page)).await
}

/// GET /api/posts/featured?limit=
pub async fn featured_posts(
    state: web::Data<AppState>,
    params: web::Query<LimitParams>,
) -> AppResult<HttpResponse> {
    let limit = params.limit.unwrap_or(DEFAULT_FEATURED_LIMIT);
    let cache_key = format!("posts:featured:{limit}");
    if let Some(hit) = cached_json(&state, &cache_key).await {
        return Ok(hit);
    }

    let posts = state.posts.get_featured_posts(limit).await?;
    cache_and_respond(&state, &cache_key, &ApiResponse::ok(posts)).await
}

/// GET /api/posts/search?q=&limit=
pub async fn search_posts(
    state: web::Data<AppState>,
    params: web::Query<SearchParams>,
) -> AppResult<HttpResponse> {
    let limit = params.limit.unwrap_or(DEFAULT_SEARCH_LIMIT);
    let posts = state.posts.search_posts(&params.q, limit).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(posts)))
}

/// GET /api/posts/{slug}
///
/// Counts as a view; never cached.
pub async fn get_post(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let slug = path.into_inner();
    let post = state
        .posts
        .get_post_by_slug(&slug)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("post '{slug}' not found")))?;

    let related = state
        .posts
        .get_related_posts(post.post.id, post.post.category_id, DEFAULT_RELATED_LIMIT)
        .await?;

    Ok(HttpResponse::Ok().json(ApiResponse::ok(PostPage { post, related })))
}
