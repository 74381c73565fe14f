// src/handlers/user.rs

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    response::IntoResponse,
};
use sqlx::SqlitePool;

use crate::{
    error::AppError,
    models::{
        role::Role,
        user::{CertificateResponse, UserSearchParams},
    },
    services::{enrollment, user},
    utils::jwt::Claims,
};

/// Profile of the caller.
pub async fn get_profile(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let found = user::find_user(&pool, claims.user_id()?).await?;
    Ok(Json(user::to_response(&pool, found).await?))
}

pub async fn get_user(
    State(pool): State<SqlitePool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let found = user::find_user(&pool, id).await?;
    Ok(Json(user::to_response(&pool, found).await?))
}

pub async fn get_user_by_username(
    State(pool): State<SqlitePool>,
    Path(username): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let found = user::find_by_username(&pool, &username)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User '{}' not found", username)))?;

    Ok(Json(user::to_response(&pool, found).await?))
}

pub async fn list_instructors(State(pool): State<SqlitePool>) -> Result<impl IntoResponse, AppError> {
    let instructors = user::with_role(&pool, Role::Instructor).await?;
    Ok(Json(user::to_responses(&pool, instructors).await?))
}

/// Usernames containing the query (case-insensitive), excluding the caller.
pub async fn search_users(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Query(params): Query<UserSearchParams>,
) -> Result<impl IntoResponse, AppError> {
    let usernames: Vec<String> = sqlx::query_scalar(
        r#"
        SELECT username
        FROM users
        WHERE username <> ? AND instr(lower(username), lower(?)) > 0
        ORDER BY username
        "#,
    )
    .bind(&claims.username)
    .bind(params.query.trim())
    .fetch_all(&pool)
    .await?;

    Ok(Json(usernames))
}

/// Ids of the courses the user has started but not completed.
pub async fn enrolled_courses(
    State(pool): State<SqlitePool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    user::find_user(&pool, id).await?;
    Ok(Json(enrollment::started_course_ids(&pool, id).await?))
}

pub async fn user_certificates(
    State(pool): State<SqlitePool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    user::find_user(&pool, id).await?;

    let certificates = sqlx::query_as::<_, CertificateResponse>(
        r#"
        SELECT ce.id, ce.course_id, c.name AS course_name, ce.issued_at
        FROM certificates ce
        JOIN courses c ON c.id = ce.course_id
        WHERE ce.user_id = ?
        ORDER BY ce.issued_at
        "#,
    )
    .bind(id)
    .fetch_all(&pool)
    .await?;

    Ok(Json(certificates))
}
