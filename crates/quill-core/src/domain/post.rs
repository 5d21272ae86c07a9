use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Post entity - a blog article with draft/scheduled/published states.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
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

impl Post {
    /// Create a new draft post.
    pub fn new(title: String, content: String, slug: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            title,
            content,
            slug,
            published: false,
            scheduled_at: None,
            published_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// A post is live to readers only when it is flagged published and any
    /// scheduled time has already passed.
    pub fn is_live(&self, now: DateTime<Utc>) -> bool {
        self.published && self.scheduled_at.is_none_or(|at| at <= now)
    }

    /// A post is due for publication when it is published-flagged, its
    /// scheduled time has passed, and it has not actually been published yet.
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.published
            && self.scheduled_at.is_some_and(|at| at <= now)
            && self.published_at.is_none()
    }
}

/// Derive a URL slug from a post title: lowercase, whitespace runs become a
/// single hyphen, everything outside `[a-z0-9_-]` is dropped.
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut last_hyphen = false;

    for ch in title.trim().chars() {
        if ch.is_whitespace() {
            if !last_hyphen {
                slug.push('-');
                last_hyphen = true;
            }
        } else if ch.is_ascii_alphanumeric() || ch == '-' || ch == '_' {
            slug.push(ch.to_ascii_lowercase());
            last_hyphen = ch == '-';
        }
    }

    slug.trim_matches('-').to_string()
}
