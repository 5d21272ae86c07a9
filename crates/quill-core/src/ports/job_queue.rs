//! Job queue port - abstraction over background job backends.

use std::future::Future;
use std::pin::Pin;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A unit of background work.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: Uuid,
    /// Routing key, e.g. `newsletter.dispatch`.
    pub kind: String,
    pub payload: serde_json::Value,
    /// How many times this job has been handed to a worker.
    pub attempts: u32,
    pub max_attempts: u32,
    pub created_at: DateTime<Utc>,
}

impl Job {
    pub fn new(kind: impl Into<String>, payload: serde_json::Value) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind: kind.into(),
            payload,
            attempts: 0,
            max_attempts: 3,
            created_at: Utc::now(),
        }
    }
}

/// What the handler decided about a job.
#[derive(Debug)]
pub enum JobResult {
    Success,
    /// Transient failure; run again unless attempts are exhausted.
    Retry(String),
    /// Permanent failure; drop the job.
    Failed(String),
}

/// Boxed future returned by job handlers.
pub type JobHandlerFuture = Pin<Box<dyn Future<Output = JobResult> + Send>>;

#[derive(Debug, thiserror::Error)]
pub enum JobQueueError {
    #[error("Queue is full")]
    QueueFull,

    #[error("Failed to enqueue job: {0}")]
    Enqueue(String),
}

/// Snapshot of queue counters.
#[derive(Debug, Clone, Default)]
pub struct QueueStats {
    pub pending: usize,
    pub processing: usize,
    pub completed: usize,
    pub failed: usize,
}

/// Background job queue.
///
/// Not object safe (`start_worker` is generic); hold implementations
/// concretely.
#[async_trait]
pub trait JobQueue: Send + Sync {
    async fn enqueue(&self, job: Job) -> Result<(), JobQueueError>;

    /// Spawn workers that feed queued jobs to `handler`.
    async fn start_worker<F>(&self, handler: F) -> Result<(), JobQueueError>
    where
        F: Fn(Job) -> JobHandlerFuture + Send + Sync + 'static;

    async fn stats(&self) -> Result<QueueStats, JobQueueError>;
}
