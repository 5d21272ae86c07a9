//! Background processing - the publication cron job and the newsletter
//! dispatch worker.

mod scheduler;

pub use scheduler::{Scheduler, SchedulerConfig};

use std::str::FromStr;

use quill_core::ports::{JobQueue, JobQueueError, JobResult};
use uuid::Uuid;

use crate::state::AppState;

/// Job type of a queued newsletter dispatch.
pub const NEWSLETTER_DISPATCH_JOB: &str = "newsletter.dispatch";

/// Start the queue worker that performs fire-and-forget newsletter
/// dispatches. Failures never reach any HTTP caller; they land in the log
/// and the alert sink.
pub async fn start_dispatch_worker(state: &AppState) -> Result<(), JobQueueError> {
    let posts = state.posts.clone();
    let publication = state.publication.clone();

    state
        .jobs
        .start_worker(move |job| {
            let posts = posts.clone();
            let publication = publication.clone();

            Box::pin(async move {
                if job.kind != NEWSLETTER_DISPATCH_JOB {
                    return JobResult::Failed(format!("Unknown job kind: {}", job.kind));
                }

                let Some(post_id) = job
                    .payload
                    .get("postId")
                    .and_then(|v| v.as_str())
                    .and_then(|s| Uuid::from_str(s).ok())
                else {
                    return JobResult::Failed("Missing or invalid postId in payload".to_string());
                };

                let post = match posts.find_by_id(post_id).await {
                    Ok(Some(post)) => post,
                    Ok(None) => {
                        // Deleted between publish and dispatch; nothing to send.
                        return JobResult::Failed(format!("Post {} no longer exists", post_id));
                    }
                    Err(e) => return JobResult::Retry(e.to_string()),
                };

                match publication.dispatch_for_post(&post).await {
                    Ok(report) => {
                        tracing::info!(
                            title = %post.title,
                            sent = report.sent,
                            failed = report.failed,
                            "Newsletter sent for published post"
                        );
                        JobResult::Success
                    }
                    Err(e) => {
                        tracing::error!(
                            title = %post.title,
                            error = %e,
                            "Newsletter dispatch failed"
                        );
                        JobResult::Retry(e.to_string())
                    }
                }
            })
        })
        .await
}

/// Register the periodic publication run on the scheduler.
pub async fn register_publication_job(
    scheduler: &Scheduler,
    config: &SchedulerConfig,
    state: &AppState,
) -> Result<(), tokio_cron_scheduler::JobSchedulerError> {
    let publication = state.publication.clone();

    scheduler
        .add_cron(&config.publish_cron, move || {
            let publication = publication.clone();
            async move {
                match publication.process_scheduled_posts().await {
                    Ok(run) => {
                        if run.found > 0 {
                            tracing::info!(
                                found = run.found,
                                "Scheduled publication run finished"
                            );
                        }
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "Scheduled publication run failed");
                    }
                }
            }
        })
        .await?;

    Ok(())
}
