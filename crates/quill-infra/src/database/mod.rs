//! Database adapters - Postgres repositories and the in-memory store.

mod connections;

pub mod memory;

#[cfg(feature = "postgres")]
mod postgres_base;
#[cfg(feature = "postgres")]
pub mod postgres_repo;

#[cfg(feature = "postgres")]
pub mod entity;

pub use connections::{DatabaseConfig, DatabaseConnections};
pub use memory::{InMemoryPostRepository, InMemorySubscriberRepository};

#[cfg(feature = "postgres")]
pub use postgres_repo::{PostgresPostRepository, PostgresSubscriberRepository};

#[cfg(feature = "postgres")]
#[cfg(test)]
mod tests;
