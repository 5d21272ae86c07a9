//! In-memory job queue.
//!
//! Jobs live on an mpsc channel consumed by local worker tasks. Anything
//! still queued is lost on restart.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{Mutex, mpsc};

use quill_core::ports::{Job, JobHandlerFuture, JobQueue, JobQueueError, JobResult, QueueStats};

#[derive(Debug, Clone)]
pub struct InMemoryJobQueueConfig {
    /// Maximum number of queued jobs (0 = unlimited).
    pub max_size: usize,
    pub workers: usize,
}

impl Default for InMemoryJobQueueConfig {
    fn default() -> Self {
        Self {
            max_size: 10_000,
            workers: 2,
        }
    }
}

impl InMemoryJobQueueConfig {
    pub fn from_env() -> Self {
        let default = Self::default();
        Self {
            max_size: std::env::var("JOB_QUEUE_MAX_SIZE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(default.max_size),
            workers: std::env::var("JOB_QUEUE_WORKERS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(default.workers),
        }
    }
}

#[derive(Default)]
struct Counters {
    pending: AtomicUsize,
    processing: AtomicUsize,
    completed: AtomicUsize,
    failed: AtomicUsize,
}

/// Channel-backed job queue with local workers.
pub struct InMemoryJobQueue {
    config: InMemoryJobQueueConfig,
    counters: Arc<Counters>,
    tx: mpsc::Sender<Job>,
    rx: Arc<Mutex<mpsc::Receiver<Job>>>,
}

impl InMemoryJobQueue {
    pub fn new(config: InMemoryJobQueueConfig) -> Self {
        let (tx, rx) = mpsc::channel(config.max_size.max(100));
        Self {
            config,
            counters: Arc::new(Counters::default()),
            tx,
            rx: Arc::new(Mutex::new(rx)),
        }
    }

    pub fn from_env() -> Self {
        Self::new(InMemoryJobQueueConfig::from_env())
    }
}

impl Default for InMemoryJobQueue {
    fn default() -> Self {
        Self::new(InMemoryJobQueueConfig::default())
    }
}

fn retry_delay(attempts: u32) -> Duration {
    // Exponential backoff, capped so a stuck job cannot sleep forever.
    Duration::from_millis(50u64 << attempts.min(6))
}

#[async_trait]
impl JobQueue for InMemoryJobQueue {
    async fn enqueue(&self, job: Job) -> Result<(), JobQueueError> {
        if self.config.max_size > 0
            && self.counters.pending.load(Ordering::Relaxed) >= self.config.max_size
        {
            return Err(JobQueueError::QueueFull);
        }

        self.counters.pending.fetch_add(1, Ordering::Relaxed);
        self.tx
            .send(job)
            .await
            .map_err(|e| JobQueueError::Enqueue(e.to_string()))?;

        tracing::debug!(
            queued = self.counters.pending.load(Ordering::Relaxed),
            "Job enqueued"
        );
        Ok(())
    }

    async fn start_worker<F>(&self, handler: F) -> Result<(), JobQueueError>
    where
        F: Fn(Job) -> JobHandlerFuture + Send + Sync + 'static,
    {
        let handler = Arc::new(handler);

        for worker in 0..self.config.workers {
            let handler = handler.clone();
            let rx = self.rx.clone();
            let tx = self.tx.clone();
            let counters = self.counters.clone();

            tokio::spawn(async move {
                tracing::info!(worker, "Job worker started");

                loop {
                    let next = {
                        let mut rx = rx.lock().await;
                        rx.recv().await
                    };
                    let Some(mut job) = next else {
                        tracing::info!(worker, "Job queue closed, worker exiting");
                        break;
                    };

                    counters.pending.fetch_sub(1, Ordering::Relaxed);
                    counters.processing.fetch_add(1, Ordering::Relaxed);
                    job.attempts += 1;

                    tracing::debug!(worker, job_id = %job.id, kind = %job.kind, "Processing job");
                    let verdict = handler(job.clone()).await;
                    counters.processing.fetch_sub(1, Ordering::Relaxed);

                    match verdict {
                        JobResult::Success => {
                            counters.completed.fetch_add(1, Ordering::Relaxed);
                            tracing::debug!(job_id = %job.id, "Job completed");
                        }
                        JobResult::Retry(reason) if job.attempts < job.max_attempts => {
                            tracing::warn!(
                                job_id = %job.id,
                                attempt = job.attempts,
                                reason = %reason,
                                "Job failed, will retry"
                            );
                            counters.pending.fetch_add(1, Ordering::Relaxed);

                            let tx = tx.clone();
                            let delay = retry_delay(job.attempts);
                            tokio::spawn(async move {
                                tokio::time::sleep(delay).await;
                                if tx.send(job).await.is_err() {
                                    tracing::error!("Retry dropped, queue closed");
                                }
                            });
                        }
                        JobResult::Retry(reason) => {
                            counters.failed.fetch_add(1, Ordering::Relaxed);
                            tracing::error!(
                                job_id = %job.id,
                                attempts = job.attempts,
                                reason = %reason,
                                "Job failed after max retries"
                            );
                        }
                        JobResult::Failed(reason) => {
                            counters.failed.fetch_add(1, Ordering::Relaxed);
                            tracing::error!(job_id = %job.id, reason = %reason, "Job failed permanently");
                        }
                    }
                }
            });
        }

        Ok(())
    }

    async fn stats(&self) -> Result<QueueStats, JobQueueError> {
        Ok(QueueStats {
            pending: self.counters.pending.load(Ordering::Relaxed),
            processing: self.counters.processing.load(Ordering::Relaxed),
            completed: self.counters.completed.load(Ordering::Relaxed),
            failed: self.counters.failed.load(Ordering::Relaxed),
        })
    }
}
