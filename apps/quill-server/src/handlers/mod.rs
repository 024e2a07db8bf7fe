//! HTTP handlers and route configuration.

mod auth;
mod health;
mod posts;
mod tags;

use actix_web::web;

/// Configure all application routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            // Public routes
            .route("/health", web::get().to(health::health_check))
            .service(
                web::scope("/posts")
                    .route("", web::get().to(posts::list))
                    .route("", web::post().to(posts::create))
                    .route("/{id}", web::get().to(posts::get))
                    .route("/{id}", web::put().to(posts::update))
                    .route("/{id}", web::delete().to(posts::delete)),
            )
            .service(
                web::scope("/tags")
                    .route("", web::get().to(tags::list))
                    .route("/{tag}/posts", web::get().to(tags::posts)),
            )
            // Auth routes
            .service(
                web::scope("/auth")
                    .route("/login", web::post().to(auth::login))
                    .route("/totp", web::post().to(auth::totp))
                    .route("/logout", web::post().to(auth::logout))
                    .route("/session", web::get().to(auth::session)),
            ),
    );
}
