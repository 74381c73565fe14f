// src/services/enrollment.rs

//! Course enrollment bookkeeping, certificates and user role sets.

use chrono::Utc;
use sqlx::SqlitePool;

use crate::{error::AppError, models::role::Role};

pub async fn is_started(pool: &SqlitePool, user_id: i64, course_id: i64) -> Result<bool, AppError> {
    let row: Option<i64> = sqlx::query_scalar(
        "SELECT 1 FROM user_started_courses WHERE user_id = ? AND course_id = ?",
    )
    .bind(user_id)
    .bind(course_id)
    .fetch_optional(pool)
    .await?;

    Ok(row.is_some())
}

pub async fn is_completed(pool: &SqlitePool, user_id: i64, course_id: i64) -> Result<bool, AppError> {
    let row: Option<i64> = sqlx::query_scalar(
        "SELECT 1 FROM user_completed_courses WHERE user_id = ? AND course_id = ?",
    )
    .bind(user_id)
    .bind(course_id)
    .fetch_optional(pool)
    .await?;

    Ok(row.is_some())
}

/// Enrolls the user. Returns `false` when the course was already started or completed.
pub async fn start_course(pool: &SqlitePool, user_id: i64, course_id: i64) -> Result<bool, AppError> {
    if is_completed(pool, user_id, course_id).await? {
        return Ok(false);
    }

    let result = sqlx::query(
        "INSERT OR IGNORE INTO user_started_courses (user_id, course_id, started_at) VALUES (?, ?, ?)",
    )
    .bind(user_id)
    .bind(course_id)
    .bind(Utc::now())
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Moves the course from the user's started set to the completed set and
/// issues the certificate, all in one transaction.
///
/// Returns `false` when the course was already completed.
pub async fn complete_course(
    pool: &SqlitePool,
    user_id: i64,
    course_id: i64,
) -> Result<bool, AppError> {
    let mut tx = pool.begin().await?;
    let now = Utc::now();

    // First statement must write: SQLite cannot upgrade a read lock while
    // another connection holds the write lock.
    sqlx::query("DELETE FROM user_started_courses WHERE user_id = ? AND course_id = ?")
        .bind(user_id)
        .bind(course_id)
        .execute(&mut *tx)
        .await?;

    let inserted = sqlx::query(
        "INSERT OR IGNORE INTO user_completed_courses (user_id, course_id, completed_at) VALUES (?, ?, ?)",
    )
    .bind(user_id)
    .bind(course_id)
    .bind(now)
    .execute(&mut *tx)
    .await?
    .rows_affected();

    sqlx::query(
        "INSERT OR IGNORE INTO certificates (user_id, course_id, issued_at) VALUES (?, ?, ?)",
    )
    .bind(user_id)
    .bind(course_id)
    .bind(now)
    .execute(&mut *tx)
    .await?;

    tx.commit().await.map_err(|e| {
        tracing::error!("Failed to commit course completion: {:?}", e);
        AppError::from(e)
    })?;

    Ok(inserted > 0)
}

pub async fn started_course_ids(pool: &SqlitePool, user_id: i64) -> Result<Vec<i64>, AppError> {
    let ids = sqlx::query_scalar(
        "SELECT course_id FROM user_started_courses WHERE user_id = ? ORDER BY course_id",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(ids)
}

/// Marks a lesson as completed for the user. Repeats are no-ops.
pub async fn complete_lesson(pool: &SqlitePool, user_id: i64, lesson_id: i64) -> Result<(), AppError> {
    sqlx::query("INSERT OR IGNORE INTO user_completed_lessons (user_id, lesson_id) VALUES (?, ?)")
        .bind(user_id)
        .bind(lesson_id)
        .execute(pool)
        .await?;

    Ok(())
}

/// True when the user has completed every lesson of the course.
/// A course without lessons counts as fully completed.
pub async fn all_lessons_completed(
    pool: &SqlitePool,
    user_id: i64,
    course_id: i64,
) -> Result<bool, AppError> {
    let remaining: i64 = sqlx::query_scalar(
        r#"
        SELECT COUNT(*)
        FROM lessons l
        WHERE l.course_id = ?
          AND NOT EXISTS (
              SELECT 1 FROM user_completed_lessons ucl
              WHERE ucl.lesson_id = l.id AND ucl.user_id = ?
          )
        "#,
    )
    .bind(course_id)
    .bind(user_id)
    .fetch_one(pool)
    .await?;

    Ok(remaining == 0)
}

/// Role set of a user. Unknown stored values are skipped with a warning.
pub async fn load_roles(pool: &SqlitePool, user_id: i64) -> Result<Vec<Role>, AppError> {
    let raw: Vec<String> = sqlx::query_scalar("SELECT role FROM user_roles WHERE user_id = ?")
        .bind(user_id)
        .fetch_all(pool)
        .await?;

    let mut roles: Vec<Role> = raw
        .iter()
        .filter_map(|r| match r.parse::<Role>() {
            Ok(role) => Some(role),
            Err(e) => {
                tracing::warn!("Ignoring role of user {}: {}", user_id, e);
                None
            }
        })
        .collect();
    roles.sort();
    Ok(roles)
}

/// Replaces the role set of a user.
pub async fn set_roles(pool: &SqlitePool, user_id: i64, roles: &[Role]) -> Result<(), AppError> {
    let mut tx = pool.begin().await?;

    sqlx::query("DELETE FROM user_roles WHERE user_id = ?")
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

    for role in roles {
        sqlx::query("INSERT OR IGNORE INTO user_roles (user_id, role) VALUES (?, ?)")
            .bind(user_id)
            .bind(role.as_str())
            .execute(&mut *tx)
            .await?;
    }

    tx.commit().await?;
    Ok(())
}
