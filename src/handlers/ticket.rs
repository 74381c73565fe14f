// src/handlers/ticket.rs

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
    models::{
        question::CourseParam,
        ticket::{CreateTicketRequest, Ticket},
    },
    services::{activity::log_activity, course::ensure_course_exists},
    utils::jwt::Claims,
};

const TICKET_SELECT: &str = r#"
    SELECT t.id, t.course_id, t.issuer_id, u.username AS issuer_username,
           t.title, t.description, t.resolved, t.created_at, t.resolved_at
    FROM tickets t
    JOIN users u ON u.id = t.issuer_id
"#;

/// Open tickets first, then newest.
pub async fn list_tickets(State(pool): State<SqlitePool>) -> Result<impl IntoResponse, AppError> {
    let tickets = sqlx::query_as::<_, Ticket>(&format!(
        "{} ORDER BY t.resolved ASC, t.id DESC",
        TICKET_SELECT
    ))
    .fetch_all(&pool)
    .await?;

    Ok(Json(tickets))
}

pub async fn create_ticket(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Query(params): Query<CourseParam>,
    Json(payload): Json<CreateTicketRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    ensure_course_exists(&pool, params.course_id).await?;

    let id = sqlx::query(
        r#"
        INSERT INTO tickets (course_id, issuer_id, title, description, resolved, created_at)
        VALUES (?, ?, ?, ?, 0, ?)
        "#,
    )
    .bind(params.course_id)
    .bind(claims.user_id()?)
    .bind(&payload.title)
    .bind(&payload.description)
    .bind(Utc::now())
    .execute(&pool)
    .await?
    .last_insert_rowid();

    log_activity(&pool, "Ticket opened", &claims.username).await;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "id": id, "message": "Ticket created successfully" })),
    ))
}

/// Marks a ticket resolved. Resolving twice keeps the first resolution time.
pub async fn resolve_ticket(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    sqlx::query("UPDATE tickets SET resolved = 1, resolved_at = ? WHERE id = ? AND resolved = 0")
        .bind(Utc::now())
        .bind(id)
        .execute(&pool)
        .await?;

    let ticket = sqlx::query_as::<_, Ticket>(&format!("{} WHERE t.id = ?", TICKET_SELECT))
        .bind(id)
        .fetch_optional(&pool)
        .await?
        .ok_or_else(|| AppError::not_found("Ticket", id))?;

    log_activity(&pool, "Ticket resolved", &claims.username).await;

    Ok(Json(json!({
        "message": "Ticket resolved successfully",
        "ticket": ticket,
    })))
}
