//! Post handlers.

use actix_web::{HttpResponse, web};

use quill_core::domain::{Post, PostDraft, parse_tags};
use quill_shared::ApiResponse;
use quill_shared::dto::{PostResponse, WritePostRequest};

use crate::middleware::auth::Identity;
use crate::middleware::error::AppResult;
use crate::state::AppState;

pub(crate) fn to_response(post: Post) -> PostResponse {
    PostResponse {
        id: post.id,
        title: post.title,
        text: post.text,
        mood: post.mood,
        tags: post.tags,
        date_created: post.date_created,
        date_edited: post.date_edited,
    }
}

fn to_draft(req: WritePostRequest) -> PostDraft {
    PostDraft {
        title: req.title,
        text: req.text,
        mood: req.mood,
        tags: parse_tags(&req.tags),
    }
}

/// GET /api/posts - newest first
pub async fn list(state: web::Data<AppState>) -> HttpResponse {
    let posts: Vec<PostResponse> = state
        .posts
        .list_newest_first()
        .await
        .into_iter()
        .map(to_response)
        .collect();

    HttpResponse::Ok().json(ApiResponse::ok(posts))
}

/// GET /api/posts/{id}
pub async fn get(state: web::Data<AppState>, path: web::Path<String>) -> AppResult<HttpResponse> {
    let id = Post::parse_id(&path)?;
    let post = state.posts.get(id).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::ok(to_response(post))))
}

/// POST /api/posts
pub async fn create(
    state: web::Data<AppState>,
    identity: Identity,
    body: web::Json<WritePostRequest>,
) -> AppResult<HttpResponse> {
    let now = state.clock.now();
    let post = Post::new(state.posts.next_id(now), to_draft(body.into_inner()), now);

    let saved = state.posts.create(post).await?;
    tracing::debug!(post_id = saved.id, user = %identity.username, "Created via API");

    Ok(HttpResponse::Created().json(ApiResponse::ok(to_response(saved))))
}

/// PUT /api/posts/{id}
pub async fn update(
    state: web::Data<AppState>,
    _identity: Identity,
    path: web::Path<String>,
    body: web::Json<WritePostRequest>,
) -> AppResult<HttpResponse> {
    let id = Post::parse_id(&path)?;
    let existing = state.posts.get(id).await?;
    let revised = existing.revised(to_draft(body.into_inner()), state.clock.now());

    let saved = state.posts.update(id, revised).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::ok(to_response(saved))))
}

/// DELETE /api/posts/{id}
pub async fn delete(
    state: web::Data<AppState>,
    _identity: Identity,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let id = Post::parse_id(&path)?;
    state.posts.delete(id).await?;

    Ok(HttpResponse::NoContent().finish())
}

#[cfg(test)]
mod tests {
    use actix_web::http::StatusCode;
    use actix_web::{App, test};
    use chrono::Duration;
    use serde_json::{Value, json};

    use crate::handlers::configure_routes;
    use crate::state::test_support;

    #[actix_web::test]
    async fn test_create_edit_delete() {
        let (state, clock) = test_support::state().await;
        let cookie = test_support::owner_cookie(&state);
        let app = test::init_service(
            App::new()
                .app_data(actix_web::web::Data::new(state))
                .configure(configure_routes),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/api/posts")
            .cookie(cookie.clone())
            .set_json(json!({
                "title": "Hello",
                "text": "First post",
                "mood": "cheerful",
                "tags": " rust, , web "
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let body: Value = test::read_body_json(resp).await;
        let created = &body["data"];
        assert_eq!(created["tags"], json!(["rust", "web"]));
        assert_eq!(created["date_created"], "Mar 9, 2024");
        let id = created["id"].as_i64().unwrap();

        clock.advance(Duration::days(2));
        let req = test::TestRequest::put()
            .uri(&format!("/api/posts/{id}"))
            .cookie(cookie.clone())
            .set_json(json!({"title": "Hello again", "text": "Edited"}))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["data"]["title"], "Hello again");
        assert_eq!(body["data"]["date_created"], "Mar 9, 2024");
        assert_eq!(body["data"]["date_edited"], "Mar 11, 2024");
        assert_eq!(body["data"]["tags"], json!([]));

        let req = test::TestRequest::delete()
            .uri(&format!("/api/posts/{id}"))
            .cookie(cookie)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NO_CONTENT);

        let req = test::TestRequest::get()
            .uri(&format!("/api/posts/{id}"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn test_list_is_newest_first() {
        let (state, clock) = test_support::state().await;
        let cookie = test_support::owner_cookie(&state);
        let app = test::init_service(
            App::new()
                .app_data(actix_web::web::Data::new(state))
                .configure(configure_routes),
        )
        .await;

        for title in ["older", "newer"] {
            let req = test::TestRequest::post()
                .uri("/api/posts")
                .cookie(cookie.clone())
                .set_json(json!({"title": title, "text": "x"}))
                .to_request();
            test::call_service(&app, req).await;
            clock.advance(Duration::days(1));
        }

        let req = test::TestRequest::get().uri("/api/posts").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;

        let titles: Vec<&str> = body["data"]
            .as_array()
            .unwrap()
            .iter()
            .map(|p| p["title"].as_str().unwrap())
            .collect();
        assert_eq!(titles, vec!["newer", "older"]);
    }

    #[actix_web::test]
    async fn test_writes_require_login() {
        let (state, _) = test_support::state().await;
        let app = test::init_service(
            App::new()
                .app_data(actix_web::web::Data::new(state))
                .configure(configure_routes),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/api/posts")
            .set_json(json!({"title": "t", "text": "x"}))
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn test_non_numeric_id_is_bad_request() {
        let (state, _) = test_support::state().await;
        let app = test::init_service(
            App::new()
                .app_data(actix_web::web::Data::new(state))
                .configure(configure_routes),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/api/posts/latest")
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn test_edit_unknown_post_is_not_found() {
        let (state, _) = test_support::state().await;
        let cookie = test_support::owner_cookie(&state);
        let app = test::init_service(
            App::new()
                .app_data(actix_web::web::Data::new(state))
                .configure(configure_routes),
        )
        .await;

        let req = test::TestRequest::put()
            .uri("/api/posts/42")
            .cookie(cookie)
            .set_json(json!({"title": "t", "text": "x"}))
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }
}
