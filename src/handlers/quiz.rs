// src/handlers/quiz.rs

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::json;
use sqlx::SqlitePool;

use crate::{
    error::AppError,
    models::{
        question::{CourseParam, PublicQuestion},
        quiz::{CourseQuizResponse, QuizDetails, QuizRequest, QuizSubmissionRequest, SubmitParams},
    },
    services::{activity::log_activity, course::ensure_course_exists, quiz},
    utils::jwt::Claims,
};

/// Creates the course quiz from selected ids or a random sample of the pool.
/// Replaces the quiz the course already had.
pub async fn create_quiz(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Query(params): Query<CourseParam>,
    Json(payload): Json<QuizRequest>,
) -> Result<impl IntoResponse, AppError> {
    let created = quiz::create_quiz(&pool, params.course_id, &payload).await?;
    log_activity(&pool, "Quiz created", &claims.username).await;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "id": created.id, "message": "Quiz created successfully" })),
    ))
}

/// Retitles the quiz and replaces its questions. Requires explicit ids.
pub async fn update_quiz(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Path(quiz_id): Path<i64>,
    Query(params): Query<CourseParam>,
    Json(payload): Json<QuizRequest>,
) -> Result<impl IntoResponse, AppError> {
    quiz::update_quiz(&pool, quiz_id, params.course_id, &payload).await?;
    log_activity(&pool, "Quiz updated", &claims.username).await;

    Ok(Json(json!({ "message": "Quiz updated successfully" })))
}

/// Quiz with answers. Authors only.
pub async fn get_quiz_details(
    State(pool): State<SqlitePool>,
    Path(quiz_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let found = quiz::find_quiz(&pool, quiz_id).await?;
    let questions = quiz::quiz_questions(&pool, found.id).await?;

    Ok(Json(QuizDetails {
        id: found.id,
        course_id: found.course_id,
        title: found.title,
        questions,
    }))
}

/// What a student sees before taking the quiz: answers are stripped.
pub async fn get_course_quiz(
    State(pool): State<SqlitePool>,
    Path(course_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    ensure_course_exists(&pool, course_id).await?;

    let (quiz_id, questions) = match quiz::find_course_quiz(&pool, course_id).await? {
        Some(found) => (Some(found.id), quiz::quiz_questions(&pool, found.id).await?),
        None => (None, Vec::new()),
    };

    Ok(Json(CourseQuizResponse {
        quiz_id,
        course_id,
        quiz_questions: questions.into_iter().map(PublicQuestion::from).collect(),
    }))
}

/// Grades a submission, records the attempt and completes the course.
pub async fn submit_quiz(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Query(params): Query<SubmitParams>,
    Json(payload): Json<QuizSubmissionRequest>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;

    let result = quiz::submit(&pool, user_id, params.course_id, params.quiz_id, &payload).await?;
    log_activity(&pool, "Quiz submitted", &claims.username).await;

    tracing::info!(
        "User {} scored {}/{} on quiz {}",
        claims.username,
        result.score,
        result.total_questions,
        params.quiz_id
    );

    Ok(Json(result))
}
