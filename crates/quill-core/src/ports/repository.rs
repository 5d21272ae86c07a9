use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::{Post, Subscriber};
use crate::error::RepoError;

/// Generic repository trait defining standard CRUD operations.
#[async_trait]
pub trait BaseRepository<T, ID>: Send + Sync {
    /// Find an entity by its unique ID.
    async fn find_by_id(&self, id: ID) -> Result<Option<T>, RepoError>;

    /// Save an entity (create or update).
    async fn save(&self, entity: T) -> Result<T, RepoError>;

    /// Delete an entity by its ID.
    async fn delete(&self, id: ID) -> Result<(), RepoError>;
}

/// Post repository with publication-aware queries.
#[async_trait]
pub trait PostRepository: BaseRepository<Post, Uuid> {
    /// List posts live to readers at `now` (published and past any
    /// scheduled time), newest publication first.
    async fn list_live(&self, now: DateTime<Utc>) -> Result<Vec<Post>, RepoError>;

    /// List every post regardless of publication state.
    async fn list_all(&self) -> Result<Vec<Post>, RepoError>;

    /// Find a post by its unique slug, live posts only.
    async fn find_live_by_slug(
        &self,
        slug: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<Post>, RepoError>;

    /// Posts due for publication at `now`: published-flagged, scheduled
    /// time passed, publication time still unset.
    async fn find_due(&self, now: DateTime<Utc>) -> Result<Vec<Post>, RepoError>;

    /// Claim a due post for publication with a single conditional update:
    /// sets `published_at = now` and clears `scheduled_at` only when
    /// `published_at` is still unset. Returns the updated post, or `None`
    /// when a concurrent run already claimed it.
    async fn claim_for_publication(
        &self,
        id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Option<Post>, RepoError>;
}

/// Subscriber repository.
#[async_trait]
pub trait SubscriberRepository: BaseRepository<Subscriber, Uuid> {
    /// Find a subscriber by email, active or not.
    async fn find_by_email(&self, email: &str) -> Result<Option<Subscriber>, RepoError>;

    /// Active subscribers, newest first.
    async fn find_active(&self) -> Result<Vec<Subscriber>, RepoError>;
}
