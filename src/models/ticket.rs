// src/models/ticket.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// A support ticket opened by a user against a course.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Ticket {
    pub id: i64,
    pub course_id: i64,
    pub issuer_id: i64,
    pub issuer_username: String,
    pub title: String,
    pub description: String,
    pub resolved: bool,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub resolved_at: Option<chrono::DateTime<chrono::Utc>>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateTicketRequest {
    #[validate(length(min = 1, max = 200, message = "Ticket title is required."))]
    pub title: String,
    #[validate(length(min = 1, max = 5000, message = "Ticket description is required."))]
    pub description: String,
}
