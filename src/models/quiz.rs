// src/models/quiz.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::models::question::{PublicQuestion, Question};

/// Represents the 'quizzes' table. A course has at most one quiz.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Quiz {
    pub id: i64,
    pub course_id: i64,
    pub title: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// Body of quiz create and update requests.
///
/// A non-empty `selected_question_ids` wins over `number_of_questions`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizRequest {
    pub title: String,
    #[serde(default)]
    pub number_of_questions: u32,
    #[serde(default)]
    pub selected_question_ids: Option<Vec<i64>>,
}

/// Quiz with its ordered questions, answers included. Authors only.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizDetails {
    pub id: i64,
    pub course_id: i64,
    pub title: String,
    pub questions: Vec<Question>,
}

/// What a student sees before taking a course quiz.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseQuizResponse {
    pub quiz_id: Option<i64>,
    pub course_id: i64,
    pub quiz_questions: Vec<PublicQuestion>,
}

/// One submitted answer.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Response {
    pub question_id: i64,
    pub answer: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizSubmissionRequest {
    pub answers: Vec<Response>,
    /// Seconds spent on the attempt.
    #[serde(default)]
    pub elapsed_time: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitParams {
    pub course_id: i64,
    pub quiz_id: i64,
}

/// Outcome of a graded submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizResult {
    pub score: u32,
    pub total_questions: u32,
    pub percentage: u32,
}
