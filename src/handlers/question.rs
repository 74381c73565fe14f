// src/handlers/question.rs

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use serde_json::json;
use sqlx::SqlitePool;
use validator::Validate;

use crate::{
    error::AppError,
    models::question::{CourseParam, CreateQuestionRequest},
    services::{activity::log_activity, course::ensure_course_exists, quiz::course_pool},
    utils::jwt::Claims,
};

/// The course's question pool, answers included.
pub async fn list_course_questions(
    State(pool): State<SqlitePool>,
    Path(course_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    ensure_course_exists(&pool, course_id).await?;
    Ok(Json(course_pool(&pool, course_id).await?))
}

pub async fn create_question(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Query(params): Query<CourseParam>,
    Json(payload): Json<CreateQuestionRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    ensure_course_exists(&pool, params.course_id).await?;

    let id = sqlx::query(
        r#"
        INSERT INTO questions (course_id, question_title, correct_answer, created_at)
        VALUES (?, ?, ?, ?)
        "#,
    )
    .bind(params.course_id)
    .bind(&payload.question_title)
    .bind(&payload.correct_answer)
    .bind(Utc::now())
    .execute(&pool)
    .await?
    .last_insert_rowid();

    log_activity(&pool, "Question created", &claims.username).await;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "id": id, "message": "Question created successfully" })),
    ))
}

/// Removes the question from the course pool. Quiz memberships go with it
/// through the `quiz_questions` foreign key.
pub async fn delete_question(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Path(question_id): Path<i64>,
    Query(params): Query<CourseParam>,
) -> Result<impl IntoResponse, AppError> {
    let result = sqlx::query("DELETE FROM questions WHERE id = ? AND course_id = ?")
        .bind(question_id)
        .bind(params.course_id)
        .execute(&pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::not_found("Question", question_id));
    }

    log_activity(&pool, "Question deleted", &claims.username).await;

    Ok(Json(json!({ "message": "Question deleted successfully" })))
}
