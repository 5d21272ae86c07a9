//! HTTP handlers and route configuration.

mod health;
mod posts;
mod subscribers;

use actix_web::web;

/// Configure all application routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health::health_check))
        .service(
            web::scope("/posts")
                .route("", web::get().to(posts::list_posts))
                .route("", web::post().to(posts::create_post))
                .route(
                    "/process-scheduled",
                    web::post().to(posts::process_scheduled),
                )
                .route(
                    "/process-scheduled",
                    web::get().to(posts::preview_scheduled),
                )
                .route("/slug/{slug}", web::get().to(posts::get_post_by_slug))
                .route("/{id}", web::get().to(posts::get_post))
                .route("/{id}", web::put().to(posts::update_post))
                .route("/{id}", web::delete().to(posts::delete_post)),
        )
        .service(
            web::scope("/subscribers")
                .route("", web::get().to(subscribers::list_subscribers))
                .route("", web::post().to(subscribers::subscribe)),
        );
}
