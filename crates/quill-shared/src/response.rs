//! Standardized API response envelopes.
//!
//! Success responses return the resource (or a message/result envelope)
//! directly; every error response uses the `{error, details?}` shape.

use serde::{Deserialize, Serialize};

/// Simple message envelope for operations with no resource to return.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Error envelope: a human-readable summary plus optional structured
/// details (field-level validation messages, for example).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<serde_json::Value>>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: Vec<serde_json::Value>) -> Self {
        self.details = Some(details);
        self
    }

    pub fn validation_failed(details: Vec<serde_json::Value>) -> Self {
        Self::new("Validation failed").with_details(details)
    }
}
