use thiserror::Error;

/// Errors surfaced by repository implementations.
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("store connection failed: {0}")]
    Connection(String),

    #[error("query failed: {0}")]
    Query(String),

    #[error("not found")]
    NotFound,

    #[error("constraint violated: {0}")]
    Constraint(String),
}
