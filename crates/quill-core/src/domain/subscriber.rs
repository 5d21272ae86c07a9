use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Subscriber entity - an email recipient of newsletter notifications.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subscriber {
    pub id: Uuid,
    pub email: String,
    pub name: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl Subscriber {
    /// Create a new active subscriber with generated ID and timestamp.
    pub fn new(email: String, name: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            email,
            name,
            is_active: true,
            created_at: Utc::now(),
        }
    }
}
