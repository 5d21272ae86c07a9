//! # Quill Shared
//!
//! Request/response types shared between the API surface and any client.

pub mod dto;
pub mod response;

pub use response::{ErrorResponse, MessageResponse};
