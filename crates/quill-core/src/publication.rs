//! Scheduled-post publication workflow.
//!
//! Finds posts whose scheduled time has passed, claims each one with a
//! conditional update, and dispatches the newsletter for every claimed
//! post. Per-post failures are collected as data, never raised.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::Post;
use crate::error::RepoError;
use crate::newsletter::{self, DispatchReport};
use crate::ports::{Mailer, PostRepository, SubscriberRepository};

/// Per-post outcome of a publication run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum PostOutcome {
    /// State transition and dispatch both completed.
    Success {
        post_id: Uuid,
        title: String,
        email_results: DispatchReport,
    },
    /// The post was published but the dispatch step errored; the post
    /// stays published.
    PublishedButEmailFailed {
        post_id: Uuid,
        title: String,
        error: String,
    },
    /// The state transition itself failed; the post is left unchanged.
    Failed {
        post_id: Uuid,
        title: String,
        error: String,
    },
}

/// Result of one publication run: how many due posts were found, plus the
/// ordered per-post outcomes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublicationRun {
    pub found: usize,
    pub outcomes: Vec<PostOutcome>,
}

/// Publication workflow over injected store, subscriber store, and mailer.
pub struct PublicationService {
    posts: Arc<dyn PostRepository>,
    subscribers: Arc<dyn SubscriberRepository>,
    mailer: Arc<dyn Mailer>,
    base_url: String,
}

impl PublicationService {
    pub fn new(
        posts: Arc<dyn PostRepository>,
        subscribers: Arc<dyn SubscriberRepository>,
        mailer: Arc<dyn Mailer>,
        base_url: String,
    ) -> Self {
        Self {
            posts,
            subscribers,
            mailer,
            base_url,
        }
    }

    /// Publish every due post and notify subscribers.
    pub async fn process_scheduled_posts(&self) -> Result<PublicationRun, RepoError> {
        self.process_scheduled_posts_at(Utc::now()).await
    }

    /// Same as [`process_scheduled_posts`](Self::process_scheduled_posts),
    /// with an explicit clock for tests.
    pub async fn process_scheduled_posts_at(
        &self,
        now: DateTime<Utc>,
    ) -> Result<PublicationRun, RepoError> {
        let due = self.posts.find_due(now).await?;

        tracing::info!(count = due.len(), "Found scheduled posts ready to be published");

        let mut outcomes = Vec::with_capacity(due.len());

        for post in &due {
            match self.posts.claim_for_publication(post.id, now).await {
                Ok(Some(published)) => {
                    tracing::info!(title = %published.title, "Published scheduled post");

                    match self.dispatch_for_post(&published).await {
                        Ok(report) => outcomes.push(PostOutcome::Success {
                            post_id: published.id,
                            title: published.title.clone(),
                            email_results: report,
                        }),
                        Err(e) => {
                            tracing::error!(
                                title = %published.title,
                                error = %e,
                                "Newsletter dispatch failed for published post"
                            );
                            outcomes.push(PostOutcome::PublishedButEmailFailed {
                                post_id: published.id,
                                title: published.title.clone(),
                                error: e.to_string(),
                            });
                        }
                    }
                }
                Ok(None) => {
                    // Lost the claim to a concurrent run; nothing to do here.
                    tracing::debug!(post_id = %post.id, "Post already claimed, skipping");
                }
                Err(e) => {
                    tracing::error!(
                        post_id = %post.id,
                        error = %e,
                        "Failed to publish scheduled post"
                    );
                    outcomes.push(PostOutcome::Failed {
                        post_id: post.id,
                        title: post.title.clone(),
                        error: e.to_string(),
                    });
                }
            }
        }

        Ok(PublicationRun {
            found: due.len(),
            outcomes,
        })
    }

    /// Send the newsletter for a single post to all active subscribers.
    /// Used both by the workflow and by the queued dispatch job.
    pub async fn dispatch_for_post(&self, post: &Post) -> Result<DispatchReport, RepoError> {
        let subscribers = self.subscribers.find_active().await?;

        if subscribers.is_empty() {
            tracing::info!("No subscribers found, skipping newsletter send");
            return Ok(DispatchReport::default());
        }

        Ok(newsletter::send_newsletter(&*self.mailer, post, &subscribers, &self.base_url).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Subscriber;
    use crate::ports::{BaseRepository, Email, MailerError};
    use async_trait::async_trait;
    use chrono::Duration;
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakePostRepo {
        posts: Mutex<Vec<Post>>,
        fail_claims: bool,
        // Claims for this id report a concurrent winner.
        deny_claim: Option<Uuid>,
    }

    #[async_trait]
    impl BaseRepository<Post, Uuid> for FakePostRepo {
        async fn find_by_id(&self, id: Uuid) -> Result<Option<Post>, RepoError> {
            Ok(self.posts.lock().unwrap().iter().find(|p| p.id == id).cloned())
        }

        async fn save(&self, entity: Post) -> Result<Post, RepoError> {
            let mut posts = self.posts.lock().unwrap();
            posts.retain(|p| p.id != entity.id);
            posts.push(entity.clone());
            Ok(entity)
        }

        async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
            self.posts.lock().unwrap().retain(|p| p.id != id);
            Ok(())
        }
    }

    #[async_trait]
    impl PostRepository for FakePostRepo {
        async fn list_live(&self, now: DateTime<Utc>) -> Result<Vec<Post>, RepoError> {
            Ok(self
                .posts
                .lock()
                .unwrap()
                .iter()
                .filter(|p| p.is_live(now))
                .cloned()
                .collect())
        }

        async fn list_all(&self) -> Result<Vec<Post>, RepoError> {
            Ok(self.posts.lock().unwrap().clone())
        }

        async fn find_live_by_slug(
            &self,
            slug: &str,
            now: DateTime<Utc>,
        ) -> Result<Option<Post>, RepoError> {
            Ok(self
                .posts
                .lock()
                .unwrap()
                .iter()
                .find(|p| p.slug == slug && p.is_live(now))
                .cloned())
        }

        async fn find_due(&self, now: DateTime<Utc>) -> Result<Vec<Post>, RepoError> {
            Ok(self
                .posts
                .lock()
                .unwrap()
                .iter()
                .filter(|p| p.is_due(now))
                .cloned()
                .collect())
        }

        async fn claim_for_publication(
            &self,
            id: Uuid,
            now: DateTime<Utc>,
        ) -> Result<Option<Post>, RepoError> {
            if self.fail_claims {
                return Err(RepoError::Query("update failed".into()));
            }
            if self.deny_claim == Some(id) {
                return Ok(None);
            }
            let mut posts = self.posts.lock().unwrap();
            let Some(post) = posts.iter_mut().find(|p| p.id == id) else {
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

    #[derive(Default)]
    struct FakeSubscriberRepo {
        subscribers: Mutex<Vec<Subscriber>>,
        fail_reads: bool,
    }

    #[async_trait]
    impl BaseRepository<Subscriber, Uuid> for FakeSubscriberRepo {
        async fn find_by_id(&self, id: Uuid) -> Result<Option<Subscriber>, RepoError> {
            Ok(self
                .subscribers
                .lock()
                .unwrap()
                .iter()
                .find(|s| s.id == id)
                .cloned())
        }

        async fn save(&self, entity: Subscriber) -> Result<Subscriber, RepoError> {
            let mut subs = self.subscribers.lock().unwrap();
            subs.retain(|s| s.id != entity.id);
            subs.push(entity.clone());
            Ok(entity)
        }

        async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
            self.subscribers.lock().unwrap().retain(|s| s.id != id);
            Ok(())
        }
    }

    #[async_trait]
    impl SubscriberRepository for FakeSubscriberRepo {
        async fn find_by_email(&self, email: &str) -> Result<Option<Subscriber>, RepoError> {
            Ok(self
                .subscribers
                .lock()
                .unwrap()
                .iter()
                .find(|s| s.email == email)
                .cloned())
        }

        async fn find_active(&self) -> Result<Vec<Subscriber>, RepoError> {
            if self.fail_reads {
                return Err(RepoError::Connection("store offline".into()));
            }
            Ok(self
                .subscribers
                .lock()
                .unwrap()
                .iter()
                .filter(|s| s.is_active)
                .cloned()
                .collect())
        }
    }

    struct OkMailer;

    #[async_trait]
    impl Mailer for OkMailer {
        async fn send(&self, _email: &Email) -> Result<(), MailerError> {
            Ok(())
        }
    }

    fn scheduled_post(title: &str, scheduled_at: DateTime<Utc>) -> Post {
        let mut post = Post::new(title.into(), "content".into(), title.to_lowercase());
        post.published = true;
        post.scheduled_at = Some(scheduled_at);
        post
    }

    fn service(
        posts: Arc<FakePostRepo>,
        subscribers: Arc<FakeSubscriberRepo>,
    ) -> PublicationService {
        PublicationService::new(
            posts,
            subscribers,
            Arc::new(OkMailer),
            "http://localhost:3000".into(),
        )
    }

    #[tokio::test]
    async fn publishes_only_due_posts() {
        let now = Utc::now();
        let posts = Arc::new(FakePostRepo::default());
        let due = scheduled_post("Due", now - Duration::days(1));
        let future = scheduled_post("Future", now + Duration::days(1));
        let due_id = due.id;
        posts.posts.lock().unwrap().extend([due, future]);

        let subs = Arc::new(FakeSubscriberRepo::default());
        subs.subscribers
            .lock()
            .unwrap()
            .push(Subscriber::new("a@example.com".into(), None));

        let svc = service(posts.clone(), subs);
        let run = svc.process_scheduled_posts_at(now).await.unwrap();

        assert_eq!(run.found, 1);
        assert_eq!(run.outcomes.len(), 1);
        match &run.outcomes[0] {
            PostOutcome::Success {
                post_id,
                email_results,
                ..
            } => {
                assert_eq!(*post_id, due_id);
                assert_eq!(email_results.sent, 1);
                assert_eq!(email_results.failed, 0);
            }
            other => panic!("unexpected outcome: {other:?}"),
        }

        let stored = posts.find_by_id(due_id).await.unwrap().unwrap();
        assert_eq!(stored.published_at, Some(now));
        assert!(stored.scheduled_at.is_none());
    }

    #[tokio::test]
    async fn second_run_finds_nothing() {
        let now = Utc::now();
        let posts = Arc::new(FakePostRepo::default());
        posts
            .posts
            .lock()
            .unwrap()
            .push(scheduled_post("Due", now - Duration::hours(2)));

        let svc = service(posts, Arc::new(FakeSubscriberRepo::default()));

        let first = svc.process_scheduled_posts_at(now).await.unwrap();
        assert_eq!(first.found, 1);

        let second = svc.process_scheduled_posts_at(now).await.unwrap();
        assert_eq!(second.found, 0);
        assert!(second.outcomes.is_empty());
    }

    #[tokio::test]
    async fn subscriber_store_failure_yields_published_but_email_failed() {
        let now = Utc::now();
        let posts = Arc::new(FakePostRepo::default());
        let due = scheduled_post("Due", now - Duration::hours(1));
        let due_id = due.id;
        posts.posts.lock().unwrap().push(due);

        let subs = Arc::new(FakeSubscriberRepo {
            fail_reads: true,
            ..Default::default()
        });

        let svc = service(posts.clone(), subs);
        let run = svc.process_scheduled_posts_at(now).await.unwrap();

        assert!(matches!(
            run.outcomes[0],
            PostOutcome::PublishedButEmailFailed { post_id, .. } if post_id == due_id
        ));

        // The post stays published despite the dispatch failure.
        let stored = posts.find_by_id(due_id).await.unwrap().unwrap();
        assert!(stored.published_at.is_some());
    }

    #[tokio::test]
    async fn claim_failure_leaves_post_unchanged() {
        let now = Utc::now();
        let posts = Arc::new(FakePostRepo {
            fail_claims: true,
            ..Default::default()
        });
        let due = scheduled_post("Due", now - Duration::hours(1));
        let due_id = due.id;
        posts.posts.lock().unwrap().push(due);

        let svc = service(posts.clone(), Arc::new(FakeSubscriberRepo::default()));
        let run = svc.process_scheduled_posts_at(now).await.unwrap();

        assert!(matches!(
            run.outcomes[0],
            PostOutcome::Failed { post_id, .. } if post_id == due_id
        ));

        let stored = posts.find_by_id(due_id).await.unwrap().unwrap();
        assert!(stored.published_at.is_none());
        assert!(stored.scheduled_at.is_some());
    }

    #[tokio::test]
    async fn lost_claim_is_skipped_without_blocking_later_posts() {
        let now = Utc::now();
        let contested = scheduled_post("Contested", now - Duration::hours(3));
        let survivor = scheduled_post("Survivor", now - Duration::hours(2));
        let survivor_id = survivor.id;

        let posts = Arc::new(FakePostRepo {
            deny_claim: Some(contested.id),
            ..Default::default()
        });
        posts.posts.lock().unwrap().extend([contested, survivor]);

        let svc = service(posts.clone(), Arc::new(FakeSubscriberRepo::default()));
        let run = svc.process_scheduled_posts_at(now).await.unwrap();

        // Both posts were due, but the lost claim produces no outcome and
        // the second post is still processed.
        assert_eq!(run.found, 2);
        assert_eq!(run.outcomes.len(), 1);
        assert!(matches!(
            run.outcomes[0],
            PostOutcome::Success { post_id, .. } if post_id == survivor_id
        ));
    }
}
