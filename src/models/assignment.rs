// src/models/assignment.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Represents the 'assignments' table in the database.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Assignment {
    pub id: i64,
    pub course_id: i64,
    pub title: String,
    pub description: String,
    pub due_date: chrono::DateTime<chrono::Utc>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateAssignmentRequest {
    pub course_id: i64,
    #[validate(length(min = 1, max = 200, message = "Assignment title is required."))]
    pub title: String,
    #[validate(length(max = 5000))]
    pub description: String,
    pub due_date: chrono::DateTime<chrono::Utc>,
}

/// Message published to the assignment notification queue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentNotification {
    pub assignment_id: i64,
    pub course_id: i64,
    pub course_name: String,
    pub assignment_title: String,
    pub assignment_description: String,
    pub teacher_name: String,
    pub due_date: chrono::DateTime<chrono::Utc>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}
