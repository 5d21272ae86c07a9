//! Error handling - maps application failures to `{error, details?}` responses.

use std::fmt;

use actix_web::{HttpResponse, ResponseError, http::StatusCode};

use quill_core::error::RepoError;
use quill_shared::ErrorResponse;

/// Result type alias for handlers.
pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug)]
pub enum AppError {
    NotFound(String),
    BadRequest(String),
    /// Field-level validation failures, rendered into `details`.
    Validation(Vec<serde_json::Value>),
    Internal(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::NotFound(msg) => write!(f, "not found: {msg}"),
            AppError::BadRequest(msg) => write!(f, "bad request: {msg}"),
            AppError::Validation(details) => write!(f, "validation failed: {details:?}"),
            AppError::Internal(msg) => write!(f, "internal error: {msg}"),
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) | AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let body = match self {
            AppError::NotFound(message) | AppError::BadRequest(message) => {
                ErrorResponse::new(message)
            }
            AppError::Validation(details) => ErrorResponse::validation_failed(details.clone()),
            AppError::Internal(detail) => {
                // The caller only sees a generic message; the detail stays
                // in the server log.
                tracing::error!("Internal error: {}", detail);
                ErrorResponse::new("Internal server error")
            }
        };

        HttpResponse::build(self.status_code()).json(body)
    }
}

impl From<RepoError> for AppError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::NotFound => AppError::NotFound("Resource not found".to_string()),
            RepoError::Constraint(msg) => AppError::BadRequest(msg),
            RepoError::Connection(msg) | RepoError::Query(msg) => {
                tracing::error!("Store error: {}", msg);
                AppError::Internal("Database error".to_string())
            }
        }
    }
}
