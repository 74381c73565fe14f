// src/models/announcement.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Represents the 'announcements' table in the database.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Announcement {
    pub id: i64,
    /// Sanitized HTML.
    pub content: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
    /// No expiry when absent.
    pub expires_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl Announcement {
    pub fn is_active(&self, now: chrono::DateTime<chrono::Utc>) -> bool {
        self.expires_at.is_none_or(|expires| expires > now)
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateAnnouncementRequest {
    #[validate(length(min = 1, max = 2000, message = "Announcement content is required."))]
    pub content: String,
    pub expires_at: Option<chrono::DateTime<chrono::Utc>>,
}
