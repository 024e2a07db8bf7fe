//! Tag views over the cached posts.

use actix_web::{HttpResponse, web};

use quill_shared::ApiResponse;
use quill_shared::dto::{PostResponse, TagsResponse};

use super::posts::to_response;
use crate::state::AppState;

/// GET /api/tags
pub async fn list(state: web::Data<AppState>) -> HttpResponse {
    let tags = state.posts.tags().await.into_iter().collect();

    HttpResponse::Ok().json(ApiResponse::ok(TagsResponse { tags }))
}

/// GET /api/tags/{tag}/posts
pub async fn posts(state: web::Data<AppState>, path: web::Path<String>) -> HttpResponse {
    let posts: Vec<PostResponse> = state
        .posts
        .with_tag(&path)
        .await
        .into_iter()
        .map(to_response)
        .collect();

    HttpResponse::Ok().json(ApiResponse::ok(posts))
}
