//! # Quill Infrastructure
//!
//! Adapters behind the ports defined in `quill-core`: database
//! repositories, the mailer, and the job queue.
//!
//! With the `postgres` feature (on by default via `full`) the
//! repositories run against SeaORM; without it only the in-memory
//! implementations are built.

pub mod database;
pub mod jobs;
pub mod mailer;

pub use database::{DatabaseConnections, InMemoryPostRepository, InMemorySubscriberRepository};
pub use jobs::InMemoryJobQueue;
pub use mailer::LoggingMailer;

#[cfg(feature = "postgres")]
pub use database::{PostgresPostRepository, PostgresSubscriberRepository};
