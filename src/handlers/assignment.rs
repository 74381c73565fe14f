// src/handlers/assignment.rs

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use serde_json::json;
use sqlx::SqlitePool;
use validator::Validate;

use crate::{
    error::AppError,
    models::assignment::{Assignment, AssignmentNotification, CreateAssignmentRequest},
    services::{activity::log_activity, course, user},
    state::AppState,
    utils::jwt::Claims,
};

const ASSIGNMENT_COLUMNS: &str = "id, course_id, title, description, due_date, created_at";

/// Assignments due in the future, soonest first, capped at `limit`.
pub async fn upcoming_assignments(
    pool: &SqlitePool,
    limit: usize,
) -> Result<Vec<Assignment>, AppError> {
    let now = Utc::now();
    let mut assignments = sqlx::query_as::<_, Assignment>(&format!(
        "SELECT {} FROM assignments",
        ASSIGNMENT_COLUMNS
    ))
    .fetch_all(pool)
    .await?;

    assignments.retain(|a| a.due_date > now);
    assignments.sort_by_key(|a| a.due_date);
    assignments.truncate(limit);
    Ok(assignments)
}

/// Assignments of the courses the caller has started.
pub async fn list_my_assignments(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let assignments = sqlx::query_as::<_, Assignment>(
        r#"
        SELECT a.id, a.course_id, a.title, a.description, a.due_date, a.created_at
        FROM assignments a
        JOIN user_started_courses s ON s.course_id = a.course_id
        WHERE s.user_id = ?
        ORDER BY a.due_date
        "#,
    )
    .bind(claims.user_id()?)
    .fetch_all(&pool)
    .await?;

    Ok(Json(assignments))
}

pub async fn list_course_assignments(
    State(pool): State<SqlitePool>,
    Path(course_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let assignments = sqlx::query_as::<_, Assignment>(&format!(
        "SELECT {} FROM assignments WHERE course_id = ? ORDER BY due_date",
        ASSIGNMENT_COLUMNS
    ))
    .bind(course_id)
    .fetch_all(&pool)
    .await?;

    Ok(Json(assignments))
}

pub async fn get_assignment(
    State(pool): State<SqlitePool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let assignment = sqlx::query_as::<_, Assignment>(&format!(
        "SELECT {} FROM assignments WHERE id = ?",
        ASSIGNMENT_COLUMNS
    ))
    .bind(id)
    .fetch_optional(&pool)
    .await?
    .ok_or_else(|| AppError::not_found("Assignment", id))?;

    let course = course::find_course(&pool, assignment.course_id).await?;

    Ok(Json(json!({
        "assignment": assignment,
        "courseName": course.name,
    })))
}

/// Stores the assignment and queues a notification for the course's students.
/// A failed publish is logged and does not fail the request.
pub async fn create_assignment(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CreateAssignmentRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let course = course::find_course(&state.pool, payload.course_id).await?;
    let teacher = user::find_user(&state.pool, claims.user_id()?).await?;
    let now = Utc::now();

    let id = sqlx::query(
        r#"
        INSERT INTO assignments (course_id, title, description, due_date, created_at)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(course.id)
    .bind(&payload.title)
    .bind(&payload.description)
    .bind(payload.due_date)
    .bind(now)
    .execute(&state.pool)
    .await?
    .last_insert_rowid();

    let notification = AssignmentNotification {
        assignment_id: id,
        course_id: course.id,
        course_name: course.name,
        assignment_title: payload.title.clone(),
        assignment_description: payload.description.clone(),
        teacher_name: teacher.full_name(),
        due_date: payload.due_date,
        created_at: now,
    };

    if let Err(e) = state.notifier.publish(&notification).await {
        tracing::error!("Failed to publish notification for assignment {}: {}", id, e);
    }

    log_activity(&state.pool, "New assignment created", &claims.username).await;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "id": id, "message": "Assignment created successfully" })),
    ))
}

pub async fn delete_assignment(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let result = sqlx::query("DELETE FROM assignments WHERE id = ?")
        .bind(id)
        .execute(&pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::not_found("Assignment", id));
    }

    log_activity(&pool, "Deleted assignment", &claims.username).await;

    Ok(Json(json!({ "message": "Assignment deleted successfully" })))
}
