// src/services/activity.rs

use chrono::Utc;
use sqlx::SqlitePool;

use crate::{error::AppError, models::user::ActivityLog};

/// Appends an audit entry. Failures are logged, never returned.
pub async fn log_activity(pool: &SqlitePool, action: &str, username: &str) {
    let result = sqlx::query("INSERT INTO activity_logs (action, username, created_at) VALUES (?, ?, ?)")
        .bind(action)
        .bind(username)
        .bind(Utc::now())
        .execute(pool)
        .await;

    if let Err(e) = result {
        tracing::warn!("Failed to record activity '{}' for {}: {:?}", action, username, e);
    }
}

/// Newest entries first.
pub async fn recent(pool: &SqlitePool) -> Result<Vec<ActivityLog>, AppError> {
    let logs = sqlx::query_as::<_, ActivityLog>(
        "SELECT id, action, username, created_at FROM activity_logs ORDER BY id DESC",
    )
    .fetch_all(pool)
    .await?;

    Ok(logs)
}
