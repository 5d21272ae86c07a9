//! In-memory repository implementations.
//!
//! Used as the fallback when no database is configured, and as the
//! substitutable store in tests. State is lost on restart.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use quill_core::domain::{Post, Subscriber};
use quill_core::error::RepoError;
use quill_core::ports::{BaseRepository, PostRepository, SubscriberRepository};

/// In-memory post repository.
#[derive(Default, Clone)]
pub struct InMemoryPostRepository {
    store: Arc<RwLock<HashMap<Uuid, Post>>>,
}

impl InMemoryPostRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BaseRepository<Post, Uuid> for InMemoryPostRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Post>, RepoError> {
        Ok(self.store.read().await.get(&id).cloned())
    }

    async fn save(&self, entity: Post) -> Result<Post, RepoError> {
        let mut store = self.store.write().await;

        // Same uniqueness rule the database enforces with an index.
        if store
            .values()
            .any(|p| p.slug == entity.slug && p.id != entity.id)
        {
            return Err(RepoError::Constraint("Entity already exists".to_string()));
        }

        store.insert(entity.id, entity.clone());
        Ok(entity)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        if self.store.write().await.remove(&id).is_none() {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }
}

#[async_trait]
impl PostRepository for InMemoryPostRepository {
    async fn list_live(&self, now: DateTime<Utc>) -> Result<Vec<Post>, RepoError> {
        let store = self.store.read().await;
        let mut posts: Vec<Post> = store.values().filter(|p| p.is_live(now)).cloned().collect();
        posts.sort_by(|a, b| b.published_at.cmp(&a.published_at));
        Ok(posts)
    }

    async fn list_all(&self) -> Result<Vec<Post>, RepoError> {
        let store = self.store.read().await;
        let mut posts: Vec<Post> = store.values().cloned().collect();
        posts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(posts)
    }

    async fn find_live_by_slug(
        &self,
        slug: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<Post>, RepoError> {
        let store = self.store.read().await;
        Ok(store
            .values()
            .find(|p| p.slug == slug && p.is_live(now))
            .cloned())
    }

    async fn find_due(&self, now: DateTime<Utc>) -> Result<Vec<Post>, RepoError> {
        let store = self.store.read().await;
        let mut posts: Vec<Post> = store.values().filter(|p| p.is_due(now)).cloned().collect();
        posts.sort_by(|a, b| a.scheduled_at.cmp(&b.scheduled_at));
        Ok(posts)
    }

    async fn claim_for_publication(
        &self,
        id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Option<Post>, RepoError> {
        let mut store = self.store.write().await;

        let Some(post) = store.get_mut(&id) else {
            return Ok(None);
        };
        if post.published_at.is_some() {
            return Ok(None);
        }

        post.published_at = Some(now);
        post.scheduled_at = None;
        post.updated_at = now;
        Ok(Some(post.clone()))
    }
}

/// In-memory subscriber repository.
#[derive(Default, Clone)]
pub struct InMemorySubscriberRepository {
    store: Arc<RwLock<HashMap<Uuid, Subscriber>>>,
}

impl InMemorySubscriberRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BaseRepository<Subscriber, Uuid> for InMemorySubscriberRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Subscriber>, RepoError> {
        Ok(self.store.read().await.get(&id).cloned())
    }

    async fn save(&self, entity: Subscriber) -> Result<Subscriber, RepoError> {
        let mut store = self.store.write().await;

        if store
            .values()
            .any(|s| s.email == entity.email && s.id != entity.id)
        {
            return Err(RepoError::Constraint("Entity already exists".to_string()));
        }

        store.insert(entity.id, entity.clone());
        Ok(entity)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        if self.store.write().await.remove(&id).is_none() {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }
}

#[async_trait]
impl SubscriberRepository for InMemorySubscriberRepository {
    async fn find_by_email(&self, email: &str) -> Result<Option<Subscriber>, RepoError> {
        let store = self.store.read().await;
        Ok(store.values().find(|s| s.email == email).cloned())
    }

    async fn find_active(&self) -> Result<Vec<Subscriber>, RepoError> {
        let store = self.store.read().await;
        let mut subs: Vec<Subscriber> = store.values().filter(|s| s.is_active).cloned().collect();
        subs.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(subs)
    }
}
