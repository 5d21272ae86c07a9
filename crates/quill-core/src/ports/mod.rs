//! Ports - trait definitions for external dependencies.
//! These are the "interfaces" that infrastructure must implement.

mod job_queue;
mod mailer;
mod repository;

pub use job_queue::{Job, JobHandlerFuture, JobQueue, JobQueueError, JobResult, QueueStats};
pub use mailer::{Email, Mailer, MailerError};
pub use repository::{BaseRepository, PostRepository, SubscriberRepository};
