// src/handlers/instructor.rs

use axum::{
    Extension, Json,
    extract::State,
    response::IntoResponse,
};
use serde_json::json;
use sqlx::SqlitePool;

use crate::{
    error::AppError,
    models::course::CourseResponse,
    services::course,
    utils::jwt::Claims,
};

const CREATED_COURSES: &str = r#"
    SELECT id, name, description, created_by, created_at
    FROM courses
    WHERE created_by = ?
    ORDER BY id
"#;

async fn own_courses(pool: &SqlitePool, claims: &Claims) -> Result<Vec<CourseResponse>, AppError> {
    course::query_responses(pool, CREATED_COURSES, Some(claims.user_id()?)).await
}

/// Courses created by the caller.
pub async fn list_courses(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(own_courses(&pool, &claims).await?))
}

/// The caller's courses with participant and completion totals.
pub async fn dashboard(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let courses = own_courses(&pool, &claims).await?;
    let participants: i64 = courses.iter().map(|c| c.participant_count).sum();
    let completions: i64 = courses.iter().map(|c| c.completed_count).sum();

    Ok(Json(json!({
        "courses": courses,
        "participants": participants,
        "completions": completions,
    })))
}
