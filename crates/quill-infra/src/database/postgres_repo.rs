//! PostgreSQL repository implementations.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::sea_query::Expr;
use sea_orm::{ColumnTrait, Condition, EntityTrait, QueryFilter, QueryOrder};
use uuid::Uuid;

use quill_core::domain::{Post, Subscriber};
use quill_core::error::RepoError;
use quill_core::ports::{PostRepository, SubscriberRepository};

use super::entity::post::{self, Entity as PostEntity};
use super::entity::subscriber::{self, Entity as SubscriberEntity};
use super::postgres_base::PostgresBaseRepository;

/// PostgreSQL post repository.
pub type PostgresPostRepository = PostgresBaseRepository<PostEntity>;

/// PostgreSQL subscriber repository.
pub type PostgresSubscriberRepository = PostgresBaseRepository<SubscriberEntity>;

/// Filter matching posts that are live to readers at `now`.
fn live_filter(now: DateTimeWithTimeZone) -> Condition {
    Condition::all()
        .add(post::Column::Published.eq(true))
        .add(
            Condition::any()
                .add(post::Column::ScheduledAt.is_null())
                .add(post::Column::ScheduledAt.lte(now)),
        )
}

#[async_trait]
impl PostRepository for PostgresPostRepository {
    async fn list_live(&self, now: DateTime<Utc>) -> Result<Vec<Post>, RepoError> {
        let result = PostEntity::find()
            .filter(live_filter(now.into()))
            .order_by_desc(post::Column::PublishedAt)
            .all(&self.db)
            .await
            .map_err(|e| RepoError::Query(e.to_string()))?;

        Ok(result.into_iter().map(Into::into).collect())
    }

    async fn list_all(&self) -> Result<Vec<Post>, RepoError> {
        let result = PostEntity::find()
            .order_by_desc(post::Column::CreatedAt)
            .all(&self.db)
            .await
            .map_err(|e| RepoError::Query(e.to_string()))?;

        Ok(result.into_iter().map(Into::into).collect())
    }

    async fn find_live_by_slug(
        &self,
        slug: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<Post>, RepoError> {
        let result = PostEntity::find()
            .filter(post::Column::Slug.eq(slug))
            .filter(live_filter(now.into()))
            .one(&self.db)
            .await
            .map_err(|e| RepoError::Query(e.to_string()))?;

        Ok(result.map(Into::into))
    }

    async fn find_due(&self, now: DateTime<Utc>) -> Result<Vec<Post>, RepoError> {
        let now_tz: DateTimeWithTimeZone = now.into();
        let result = PostEntity::find()
            .filter(post::Column::Published.eq(true))
            .filter(post::Column::ScheduledAt.lte(now_tz))
            .filter(post::Column::PublishedAt.is_null())
            .all(&self.db)
            .await
            .map_err(|e| RepoError::Query(e.to_string()))?;

        Ok(result.into_iter().map(Into::into).collect())
    }

    async fn claim_for_publication(
        &self,
        id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Option<Post>, RepoError> {
        let now_tz: DateTimeWithTimeZone = now.into();

        // Single conditional update: the claim succeeds only while
        // published_at is still unset, so concurrent runs cannot both win.
        let update = PostEntity::update_many()
            .col_expr(post::Column::PublishedAt, Expr::value(Some(now_tz)))
            .col_expr(
                post::Column::ScheduledAt,
                Expr::value(Option::<DateTimeWithTimeZone>::None),
            )
            .col_expr(post::Column::UpdatedAt, Expr::value(now_tz))
            .filter(post::Column::Id.eq(id))
            .filter(post::Column::PublishedAt.is_null())
            .exec(&self.db)
            .await
            .map_err(|e| RepoError::Query(e.to_string()))?;

        if update.rows_affected == 0 {
            return Ok(None);
        }

        let claimed = PostEntity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(|e| RepoError::Query(e.to_string()))?;

        Ok(claimed.map(Into::into))
    }
}

#[async_trait]
impl SubscriberRepository for PostgresSubscriberRepository {
    async fn find_by_email(&self, email: &str) -> Result<Option<Subscriber>, RepoError> {
        let result = SubscriberEntity::find()
            .filter(subscriber::Column::Email.eq(email))
            .one(&self.db)
            .await
            .map_err(|e| RepoError::Query(e.to_string()))?;

        Ok(result.map(Into::into))
    }

    async fn find_active(&self) -> Result<Vec<Subscriber>, RepoError> {
        let result = SubscriberEntity::find()
            .filter(subscriber::Column::IsActive.eq(true))
            .order_by_desc(subscriber::Column::CreatedAt)
            .all(&self.db)
            .await
            .map_err(|e| RepoError::Query(e.to_string()))?;

        Ok(result.into_iter().map(Into::into).collect())
    }
}
