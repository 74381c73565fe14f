// src/handlers/announcement.rs

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
    config::MAX_ACTIVE_ANNOUNCEMENTS,
    error::AppError,
    models::announcement::{Announcement, CreateAnnouncementRequest},
    services::activity::log_activity,
    utils::{html::clean_html, jwt::Claims},
};

/// Announcements that have not expired yet, newest first.
pub async fn active_announcements(pool: &SqlitePool) -> Result<Vec<Announcement>, AppError> {
    let now = Utc::now();
    let announcements = sqlx::query_as::<_, Announcement>(
        "SELECT id, content, created_at, expires_at FROM announcements ORDER BY created_at DESC, id DESC",
    )
    .fetch_all(pool)
    .await?;

    Ok(announcements
        .into_iter()
        .filter(|a| a.is_active(now))
        .collect())
}

pub async fn list_announcements(
    State(pool): State<SqlitePool>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(active_announcements(&pool).await?))
}

/// Active announcement bodies only, for tickers.
pub async fn list_announcement_strings(
    State(pool): State<SqlitePool>,
) -> Result<impl IntoResponse, AppError> {
    let contents: Vec<String> = active_announcements(&pool)
        .await?
        .into_iter()
        .map(|a| a.content)
        .collect();

    Ok(Json(contents))
}

/// Admin only. Rejected once the active limit is reached.
///
/// Inserts first, then counts the other active announcements under the
/// write lock and rolls back when the limit was already reached.
pub async fn create_announcement(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CreateAnnouncementRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let now = Utc::now();
    let mut tx = pool.begin().await?;

    let id = sqlx::query("INSERT INTO announcements (content, created_at, expires_at) VALUES (?, ?, ?)")
        .bind(clean_html(&payload.content))
        .bind(now)
        .bind(payload.expires_at)
        .execute(&mut *tx)
        .await?
        .last_insert_rowid();

    let others = sqlx::query_as::<_, Announcement>(
        "SELECT id, content, created_at, expires_at FROM announcements WHERE id <> ?",
    )
    .bind(id)
    .fetch_all(&mut *tx)
    .await?;

    let active = others.iter().filter(|a| a.is_active(now)).count() as i64;
    if active >= MAX_ACTIVE_ANNOUNCEMENTS {
        tx.rollback().await?;
        return Err(AppError::BadRequest(format!(
            "Cannot have more than {} active announcements",
            MAX_ACTIVE_ANNOUNCEMENTS
        )));
    }

    tx.commit().await?;

    log_activity(&pool, "New announcement added", &claims.username).await;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "id": id, "message": "Announcement created successfully" })),
    ))
}

pub async fn delete_announcement(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let result = sqlx::query("DELETE FROM announcements WHERE id = ?")
        .bind(id)
        .execute(&pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::not_found("Announcement", id));
    }

    log_activity(&pool, "Deleted announcement", &claims.username).await;

    Ok(Json(json!({ "message": "Announcement deleted successfully" })))
}
