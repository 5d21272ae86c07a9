//! Application state - shared across all handlers.

use std::sync::Arc;

use quill_core::ports::{Mailer, PostRepository, SubscriberRepository};
use quill_core::publication::PublicationService;
use quill_infra::database::{InMemoryPostRepository, InMemorySubscriberRepository};
use quill_infra::jobs::InMemoryJobQueue;
use quill_infra::mailer::LoggingMailer;

#[cfg(feature = "postgres")]
use quill_infra::database::{
    DatabaseConnections, PostgresPostRepository, PostgresSubscriberRepository,
};

use crate::config::AppConfig;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub posts: Arc<dyn PostRepository>,
    pub subscribers: Arc<dyn SubscriberRepository>,
    pub mailer: Arc<dyn Mailer>,
    pub jobs: Arc<InMemoryJobQueue>,
    pub publication: Arc<PublicationService>,
}

impl AppState {
    /// Build the application state with appropriate implementations.
    pub async fn new(config: &AppConfig) -> Self {
        #[cfg(feature = "postgres")]
        let (posts, subscribers): (Arc<dyn PostRepository>, Arc<dyn SubscriberRepository>) = {
            if let Some(db_config) = &config.database {
                match DatabaseConnections::init(db_config).await {
                    Ok(connections) => (
                        Arc::new(PostgresPostRepository::new(connections.main.clone())),
                        Arc::new(PostgresSubscriberRepository::new(connections.main.clone())),
                    ),
                    Err(e) => {
                        tracing::error!(
                            "Failed to connect to database: {}. Using in-memory fallback.",
                            e
                        );
                        (
                            Arc::new(InMemoryPostRepository::new()),
                            Arc::new(InMemorySubscriberRepository::new()),
                        )
                    }
                }
            } else {
                tracing::warn!("DATABASE_URL not set. Running without database (in-memory mode).");
                (
                    Arc::new(InMemoryPostRepository::new()),
                    Arc::new(InMemorySubscriberRepository::new()),
                )
            }
        };

        #[cfg(not(feature = "postgres"))]
        let (posts, subscribers): (Arc<dyn PostRepository>, Arc<dyn SubscriberRepository>) = {
            tracing::info!("Running without postgres feature - using in-memory repositories");
            (
                Arc::new(InMemoryPostRepository::new()),
                Arc::new(InMemorySubscriberRepository::new()),
            )
        };

        let mailer: Arc<dyn Mailer> = Arc::new(LoggingMailer::from_env());
        let jobs = Arc::new(InMemoryJobQueue::from_env());

        let publication = Arc::new(PublicationService::new(
            posts.clone(),
            subscribers.clone(),
            mailer.clone(),
            config.app_url.clone(),
        ));

        tracing::info!("Application state initialized");

        Self {
            posts,
            subscribers,
            mailer,
            jobs,
            publication,
        }
    }

    /// In-memory state for handler tests.
    #[cfg(test)]
    pub fn in_memory() -> Self {
        let posts: Arc<dyn PostRepository> = Arc::new(InMemoryPostRepository::new());
        let subscribers: Arc<dyn SubscriberRepository> =
            Arc::new(InMemorySubscriberRepository::new());
        let mailer: Arc<dyn Mailer> =
            Arc::new(LoggingMailer::new(Default::default()));
        let jobs = Arc::new(InMemoryJobQueue::default());

        let publication = Arc::new(PublicationService::new(
            posts.clone(),
            subscribers.clone(),
            mailer.clone(),
            "http://localhost:3000".to_string(),
        ));

        Self {
            posts,
            subscribers,
            mailer,
            jobs,
            publication,
        }
    }
}
