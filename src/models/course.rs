// src/models/course.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Represents the 'courses' table in the database.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Course {
    pub id: i64,
    pub name: String,
    pub description: String,
    /// Creator's user id. Cleared if the creator is deleted.
    pub created_by: Option<i64>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// Minimal creator info embedded in course responses.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct CreatorInfo {
    pub id: i64,
    pub username: String,
    pub full_name: String,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct LessonInfo {
    pub id: i64,
    pub title: String,
}

/// Course as returned to clients, with counts aggregated from the join tables.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseResponse {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub categories: Vec<String>,
    pub created_on: chrono::DateTime<chrono::Utc>,
    pub created_by: Option<CreatorInfo>,
    pub participant_count: i64,
    pub completed_count: i64,
    pub lessons_count: i64,
    pub lessons: Vec<LessonInfo>,
}

/// DTO for creating a course.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateCourseRequest {
    #[validate(length(min = 1, max = 200, message = "Course name is required!"))]
    pub name: String,
    #[validate(length(min = 1, max = 5000, message = "Course description is required!"))]
    pub description: String,
    #[validate(length(min = 1, message = "At least one category is required!"))]
    pub categories: Vec<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateCourseNameRequest {
    #[validate(length(min = 1, max = 200, message = "Course name is required!"))]
    pub name: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateCourseDescriptionRequest {
    #[validate(length(min = 1, max = 5000, message = "Course description is required!"))]
    pub description: String,
}

/// Represents the 'lessons' table in the database.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Lesson {
    pub id: i64,
    pub course_id: i64,
    pub title: String,
    /// Sanitized HTML.
    pub content: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateLessonRequest {
    #[validate(length(min = 1, max = 200, message = "Lesson title is required!"))]
    pub title: String,
    #[validate(length(min = 1, max = 100000, message = "Lesson content is required!"))]
    pub content: String,
}

/// Represents the 'student_results' table. Rows are append-only.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentResult {
    pub id: i64,
    pub course_id: i64,
    pub user_id: i64,
    pub percentage: i64,
    /// Seconds spent on the attempt.
    pub elapsed_time: i64,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// High-score row joined with the username.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HighScoreEntry {
    pub username: String,
    pub percentage: i64,
    pub elapsed_time: i64,
    pub created_at: chrono::DateTime<chrono::Utc>,
}
