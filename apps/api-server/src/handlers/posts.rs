//! Post handlers - CRUD, slug lookup, and the publication workflow trigger.

use actix_web::{HttpResponse, web};
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

use quill_core::domain::{Post, slugify};
use quill_core::ports::{Job, JobQueue};
use quill_shared::MessageResponse;
use quill_shared::dto::{
    CreatePostRequest, DuePostsResponse, PostResponse, ProcessScheduledResponse,
    UpdatePostRequest,
};

use crate::background::NEWSLETTER_DISPATCH_JOB;
use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListPostsQuery {
    #[serde(default)]
    pub include_unpublished: bool,
}

fn field_error(field: &str, message: &str) -> serde_json::Value {
    serde_json::json!({ "field": field, "message": message })
}

/// GET /posts
pub async fn list_posts(
    state: web::Data<AppState>,
    query: web::Query<ListPostsQuery>,
) -> AppResult<HttpResponse> {
    let posts = if query.include_unpublished {
        state.posts.list_all().await?
    } else {
        state.posts.list_live(Utc::now()).await?
    };

    let response: Vec<PostResponse> = posts.into_iter().map(Into::into).collect();
    Ok(HttpResponse::Ok().json(response))
}

/// POST /posts
pub async fn create_post(
    state: web::Data<AppState>,
    body: web::Json<CreatePostRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();

    let mut details = Vec::new();
    if req.title.trim().is_empty() {
        details.push(field_error("title", "Title is required"));
    }
    if req.content.trim().is_empty() {
        details.push(field_error("content", "Content is required"));
    }

    let slug = match &req.slug {
        Some(slug) if slug.trim().is_empty() => {
            details.push(field_error("slug", "Slug is required"));
            String::new()
        }
        Some(slug) => slug.trim().to_string(),
        None => slugify(&req.title),
    };
    if !details.is_empty() {
        return Err(AppError::Validation(details));
    }

    let now = Utc::now();
    let mut post = Post::new(req.title.trim().to_string(), req.content, slug);
    post.published = req.published;
    post.scheduled_at = req.scheduled_at;

    // Publishing without a schedule goes live immediately; a scheduled
    // post keeps published_at unset until the workflow claims it.
    if post.published && post.scheduled_at.is_none() {
        post.published_at = Some(now);
    }

    let created = state.posts.save(post).await?;
    Ok(HttpResponse::Created().json(PostResponse::from(created)))
}

/// GET /posts/{id}
pub async fn get_post(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let id = path.into_inner();
    let post = state
        .posts
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Post not found".to_string()))?;

    Ok(HttpResponse::Ok().json(PostResponse::from(post)))
}

/// PUT /posts/{id}
pub async fn update_post(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
    body: web::Json<UpdatePostRequest>,
) -> AppResult<HttpResponse> {
    let id = path.into_inner();
    let req = body.into_inner();

    let mut post = state
        .posts
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Post not found".to_string()))?;

    let mut details = Vec::new();
    if matches!(&req.title, Some(t) if t.trim().is_empty()) {
        details.push(field_error("title", "Title is required"));
    }
    if matches!(&req.content, Some(c) if c.trim().is_empty()) {
        details.push(field_error("content", "Content is required"));
    }
    if matches!(&req.slug, Some(s) if s.trim().is_empty()) {
        details.push(field_error("slug", "Slug is required"));
    }
    if !details.is_empty() {
        return Err(AppError::Validation(details));
    }

    let was_published = post.published;
    let now = Utc::now();

    if let Some(title) = req.title {
        post.title = title.trim().to_string();
    }
    if let Some(content) = req.content {
        post.content = content;
    }
    if let Some(slug) = req.slug {
        post.slug = slug.trim().to_string();
    }
    if let Some(published) = req.published {
        post.published = published;
    }
    if let Some(scheduled_at) = req.scheduled_at {
        post.scheduled_at = scheduled_at;
    }
    post.updated_at = now;

    let is_being_published = post.published && !was_published;

    // published_at is set at most once, and only when the post actually
    // goes live now; a future schedule is left for the workflow.
    if is_being_published && post.published_at.is_none() && post.is_live(now) {
        post.published_at = Some(now);
    }

    let updated = state.posts.save(post).await?;

    if is_being_published && updated.scheduled_at.is_none() {
        tracing::info!(title = %updated.title, "Queueing newsletter for published post");

        let job = Job::new(
            NEWSLETTER_DISPATCH_JOB,
            serde_json::json!({ "postId": updated.id }),
        );

        // Fire-and-forget: the response never waits on or reflects the
        // dispatch outcome.
        if let Err(e) = state.jobs.enqueue(job).await {
            tracing::error!(error = %e, "Failed to enqueue newsletter dispatch");
        }
    }

    Ok(HttpResponse::Ok().json(PostResponse::from(updated)))
}

/// DELETE /posts/{id}
pub async fn delete_post(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let id = path.into_inner();

    state
        .posts
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Post not found".to_string()))?;

    state.posts.delete(id).await?;

    Ok(HttpResponse::Ok().json(MessageResponse::new("Post deleted successfully")))
}

/// GET /posts/slug/{slug}
pub async fn get_post_by_slug(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let slug = path.into_inner();
    let post = state
        .posts
        .find_live_by_slug(&slug, Utc::now())
        .await?
        .ok_or_else(|| AppError::NotFound("Post not found".to_string()))?;

    Ok(HttpResponse::Ok().json(PostResponse::from(post)))
}

/// POST /posts/process-scheduled
pub async fn process_scheduled(state: web::Data<AppState>) -> AppResult<HttpResponse> {
    let run = state.publication.process_scheduled_posts().await?;

    Ok(HttpResponse::Ok().json(ProcessScheduledResponse {
        message: format!("Processed {} scheduled posts", run.found),
        results: run.outcomes,
    }))
}

/// GET /posts/process-scheduled - read-only preview of due posts.
pub async fn preview_scheduled(state: web::Data<AppState>) -> AppResult<HttpResponse> {
    let due = state.posts.find_due(Utc::now()).await?;

    Ok(HttpResponse::Ok().json(DuePostsResponse {
        message: format!("Found {} posts ready to be published", due.len()),
        posts: due.into_iter().map(Into::into).collect(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::configure_routes;
    use actix_web::{App, test};
    use chrono::{Duration, Utc};
    use quill_core::publication::PostOutcome;
    use quill_shared::ErrorResponse;

    macro_rules! service {
        ($state:expr) => {
            test::init_service(
                App::new()
                    .app_data(web::Data::new($state))
                    .configure(configure_routes),
            )
            .await
        };
    }

    #[actix_web::test]
    async fn create_published_post_sets_published_at() {
        let app = service!(AppState::in_memory());

        let req = test::TestRequest::post()
            .uri("/posts")
            .set_json(serde_json::json!({
                "title": "Hello World",
                "content": "Body",
                "published": true
            }))
            .to_request();

        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 201);

        let post: PostResponse = test::read_body_json(resp).await;
        assert_eq!(post.slug, "hello-world");
        assert!(post.published_at.is_some());
    }

    #[actix_web::test]
    async fn future_schedule_leaves_published_at_unset() {
        let app = service!(AppState::in_memory());

        let req = test::TestRequest::post()
            .uri("/posts")
            .set_json(serde_json::json!({
                "title": "Later",
                "content": "Body",
                "published": true,
                "scheduledAt": Utc::now() + Duration::days(1)
            }))
            .to_request();

        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 201);

        let post: PostResponse = test::read_body_json(resp).await;
        assert!(post.published_at.is_none());
        assert!(post.scheduled_at.is_some());
    }

    #[actix_web::test]
    async fn create_rejects_missing_fields() {
        let app = service!(AppState::in_memory());

        let req = test::TestRequest::post()
            .uri("/posts")
            .set_json(serde_json::json!({ "title": "", "content": "" }))
            .to_request();

        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 400);

        let body: ErrorResponse = test::read_body_json(resp).await;
        assert_eq!(body.error, "Validation failed");
        assert_eq!(body.details.unwrap().len(), 2);
    }

    #[actix_web::test]
    async fn unpublished_slug_is_404() {
        let state = AppState::in_memory();
        let app = service!(state.clone());

        let req = test::TestRequest::post()
            .uri("/posts")
            .set_json(serde_json::json!({ "title": "Draft", "content": "Body" }))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), 201);

        let req = test::TestRequest::get().uri("/posts/slug/draft").to_request();
        assert_eq!(test::call_service(&app, req).await.status(), 404);
    }

    #[actix_web::test]
    async fn list_hides_drafts_by_default() {
        let app = service!(AppState::in_memory());

        for (title, published) in [("Live", true), ("Draft", false)] {
            let req = test::TestRequest::post()
                .uri("/posts")
                .set_json(serde_json::json!({
                    "title": title,
                    "content": "Body",
                    "published": published
                }))
                .to_request();
            assert_eq!(test::call_service(&app, req).await.status(), 201);
        }

        let req = test::TestRequest::get().uri("/posts").to_request();
        let posts: Vec<PostResponse> =
            test::call_and_read_body_json(&app, req).await;
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].title, "Live");

        let req = test::TestRequest::get()
            .uri("/posts?includeUnpublished=true")
            .to_request();
        let posts: Vec<PostResponse> =
            test::call_and_read_body_json(&app, req).await;
        assert_eq!(posts.len(), 2);
    }

    #[actix_web::test]
    async fn delete_missing_post_is_404() {
        let app = service!(AppState::in_memory());

        let req = test::TestRequest::delete()
            .uri(&format!("/posts/{}", Uuid::new_v4()))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), 404);
    }

    #[actix_web::test]
    async fn process_scheduled_publishes_due_post_once() {
        let app = service!(AppState::in_memory());

        let req = test::TestRequest::post()
            .uri("/posts")
            .set_json(serde_json::json!({
                "title": "Due",
                "content": "Body",
                "published": true,
                "scheduledAt": Utc::now() - Duration::days(1)
            }))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), 201);

        let req = test::TestRequest::post()
            .uri("/posts/process-scheduled")
            .to_request();
        let run: ProcessScheduledResponse = test::call_and_read_body_json(&app, req).await;
        assert_eq!(run.results.len(), 1);
        assert!(matches!(run.results[0], PostOutcome::Success { .. }));

        // Idempotent: the second run finds nothing due.
        let req = test::TestRequest::post()
            .uri("/posts/process-scheduled")
            .to_request();
        let run: ProcessScheduledResponse = test::call_and_read_body_json(&app, req).await;
        assert!(run.results.is_empty());
        assert_eq!(run.message, "Processed 0 scheduled posts");
    }

    #[actix_web::test]
    async fn preview_does_not_mutate() {
        let app = service!(AppState::in_memory());

        let req = test::TestRequest::post()
            .uri("/posts")
            .set_json(serde_json::json!({
                "title": "Due",
                "content": "Body",
                "published": true,
                "scheduledAt": Utc::now() - Duration::hours(1)
            }))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), 201);

        for _ in 0..2 {
            let req = test::TestRequest::get()
                .uri("/posts/process-scheduled")
                .to_request();
            let preview: DuePostsResponse = test::call_and_read_body_json(&app, req).await;
            assert_eq!(preview.posts.len(), 1);
        }
    }
}
