//! Subscriber handlers - newsletter signup and the active-subscriber list.

use actix_web::{HttpResponse, web};

use quill_core::domain::Subscriber;
use quill_shared::dto::{SubscribeRequest, SubscriberResponse};

use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

/// GET /subscribers
pub async fn list_subscribers(state: web::Data<AppState>) -> AppResult<HttpResponse> {
    let subscribers = state.subscribers.find_active().await?;

    let response: Vec<SubscriberResponse> = subscribers.into_iter().map(Into::into).collect();
    Ok(HttpResponse::Ok().json(response))
}

/// POST /subscribers
pub async fn subscribe(
    state: web::Data<AppState>,
    body: web::Json<SubscribeRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();

    let mut details = Vec::new();
    let email = req.email.trim().to_string();
    if email.is_empty() || !email.contains('@') {
        details.push(serde_json::json!({
            "field": "email",
            "message": "Please enter a valid email address"
        }));
    }
    if matches!(&req.name, Some(name) if name.trim().is_empty()) {
        details.push(serde_json::json!({
            "field": "name",
            "message": "Name is required"
        }));
    }
    if !details.is_empty() {
        return Err(AppError::Validation(details));
    }

    if let Some(existing) = state.subscribers.find_by_email(&email).await? {
        if existing.is_active {
            return Err(AppError::BadRequest(
                "Email is already subscribed to our newsletter".to_string(),
            ));
        }

        // Reactivate the existing record in place rather than duplicating it.
        let reactivated = Subscriber {
            is_active: true,
            name: req.name.or(existing.name),
            ..existing
        };
        let saved = state.subscribers.save(reactivated).await?;
        return Ok(HttpResponse::Created().json(SubscriberResponse::from(saved)));
    }

    let subscriber = Subscriber::new(email, req.name);
    let saved = state.subscribers.save(subscriber).await?;

    Ok(HttpResponse::Created().json(SubscriberResponse::from(saved)))
}
