//! Data Transfer Objects - request/response types for the API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use quill_core::domain::{Post, Subscriber};
use quill_core::publication::PostOutcome;

/// Request to create a post. A missing slug is derived from the title.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePostRequest {
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub published: bool,
    #[serde(default)]
    pub scheduled_at: Option<DateTime<Utc>>,
}

/// Request to update a post. Absent fields are left untouched; an explicit
/// `"scheduledAt": null` clears the schedule.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePostRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub published: Option<bool>,
    #[serde(default, deserialize_with = "double_option")]
    pub scheduled_at: Option<Option<DateTime<Utc>>>,
}

/// Distinguishes an absent field (outer `None`) from an explicit `null`
/// (inner `None`).
fn double_option<'de, T, D>(de: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Deserialize::deserialize(de).map(Some)
}

/// Request to subscribe to the newsletter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubscribeRequest {
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
}

/// A post as returned by the API.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostResponse {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub slug: String,
    pub published: bool,
    pub scheduled_at: Option<DateTime<Utc>>,
    pub published_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Post> for PostResponse {
    fn from(post: Post) -> Self {
        Self {
            id: post.id,
            title: post.title,
            content: post.content,
            slug: post.slug,
            published: post.published,
            scheduled_at: post.scheduled_at,
            published_at: post.published_at,
            created_at: post.created_at,
            updated_at: post.updated_at,
        }
    }
}

/// A subscriber as returned by the API.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriberResponse {
    pub id: Uuid,
    pub email: String,
    pub name: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl From<Subscriber> for SubscriberResponse {
    fn from(subscriber: Subscriber) -> Self {
        Self {
            id: subscriber.id,
            email: subscriber.email,
            name: subscriber.name,
            is_active: subscriber.is_active,
            created_at: subscriber.created_at,
        }
    }
}

/// Response of the publication workflow endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessScheduledResponse {
    pub message: String,
    pub results: Vec<PostOutcome>,
}

/// Summary of a due post, used by the read-only preview endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DuePostSummary {
    pub id: Uuid,
    pub title: String,
    pub scheduled_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<Post> for DuePostSummary {
    fn from(post: Post) -> Self {
        Self {
            id: post.id,
            title: post.title,
            scheduled_at: post.scheduled_at,
            created_at: post.created_at,
        }
    }
}

/// Response of the read-only due-posts preview.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DuePostsResponse {
    pub message: String,
    pub posts: Vec<DuePostSummary>,
}
