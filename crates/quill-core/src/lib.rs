//! # Quill Core
//!
//! The domain layer of the Quill blog/newsletter backend.
//! This crate contains pure business logic with zero infrastructure dependencies.

pub mod domain;
pub mod error;
pub mod newsletter;
pub mod ports;
pub mod publication;

pub use error::RepoError;
