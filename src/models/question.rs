// src/models/question.rs

use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use validator::Validate;

/// Represents the 'questions' table in the database.
/// A question belongs to exactly one course's pool.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub id: i64,
    pub course_id: i64,

    /// The text shown to the student.
    pub question_title: String,

    /// Expected answer, compared case-sensitively.
    pub correct_answer: String,

    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// DTO for sending a question to a student (excludes the answer).
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicQuestion {
    pub id: i64,
    pub question_title: String,
}

impl From<Question> for PublicQuestion {
    fn from(q: Question) -> Self {
        Self {
            id: q.id,
            question_title: q.question_title,
        }
    }
}

/// DTO for adding a question to a course pool.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateQuestionRequest {
    #[validate(length(min = 1, max = 1000))]
    pub question_title: String,
    #[validate(length(min = 1, max = 500))]
    pub correct_answer: String,
}

/// `?courseId=` query parameter shared by question and quiz routes.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseParam {
    pub course_id: i64,
}
