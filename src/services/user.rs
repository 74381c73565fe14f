// src/services/user.rs

use chrono::Utc;
use sqlx::SqlitePool;

use crate::{
    error::{AppError, is_unique_violation},
    models::{
        role::Role,
        user::{CreateUserRequest, User, UserResponse},
    },
    services::enrollment::{load_roles, set_roles},
    utils::hash::hash_password,
};

const USER_COLUMNS: &str = "id, username, password, email, first_name, last_name, created_at";

pub async fn find_user(pool: &SqlitePool, user_id: i64) -> Result<User, AppError> {
    sqlx::query_as::<_, User>(&format!("SELECT {} FROM users WHERE id = ?", USER_COLUMNS))
        .bind(user_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::not_found("User", user_id))
}

pub async fn find_by_username(pool: &SqlitePool, username: &str) -> Result<Option<User>, AppError> {
    let user = sqlx::query_as::<_, User>(&format!(
        "SELECT {} FROM users WHERE username = ?",
        USER_COLUMNS
    ))
    .bind(username)
    .fetch_optional(pool)
    .await?;

    Ok(user)
}

/// Hashes the password and stores the user with the given role set.
/// Duplicate usernames or emails are a `BadRequest`.
pub async fn create_user(
    pool: &SqlitePool,
    req: &CreateUserRequest,
    roles: &[Role],
) -> Result<User, AppError> {
    let hashed_password = hash_password(&req.password)?;
    let now = Utc::now();

    let id = sqlx::query(
        r#"
        INSERT INTO users (username, password, email, first_name, last_name, created_at)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&req.username)
    .bind(&hashed_password)
    .bind(&req.email)
    .bind(&req.first_name)
    .bind(&req.last_name)
    .bind(now)
    .execute(pool)
    .await
    .map_err(|e| {
        if is_unique_violation(&e) {
            AppError::BadRequest("Username or email already exists".to_string())
        } else {
            tracing::error!("Failed to create user: {:?}", e);
            AppError::from(e)
        }
    })?
    .last_insert_rowid();

    set_roles(pool, id, roles).await?;

    Ok(User {
        id,
        username: req.username.clone(),
        password: hashed_password,
        email: req.email.clone(),
        first_name: req.first_name.clone(),
        last_name: req.last_name.clone(),
        created_at: now,
    })
}

pub async fn to_response(pool: &SqlitePool, user: User) -> Result<UserResponse, AppError> {
    let roles = load_roles(pool, user.id).await?;
    Ok(UserResponse::new(user, roles))
}

pub async fn to_responses(pool: &SqlitePool, users: Vec<User>) -> Result<Vec<UserResponse>, AppError> {
    let mut responses = Vec::with_capacity(users.len());
    for user in users {
        responses.push(to_response(pool, user).await?);
    }
    Ok(responses)
}

/// Users holding the given role, ordered by username.
pub async fn with_role(pool: &SqlitePool, role: Role) -> Result<Vec<User>, AppError> {
    let users = sqlx::query_as::<_, User>(
        r#"
        SELECT u.id, u.username, u.password, u.email, u.first_name, u.last_name, u.created_at
        FROM users u
        JOIN user_roles r ON r.user_id = u.id
        WHERE r.role = ?
        ORDER BY u.username
        "#,
    )
    .bind(role.as_str())
    .fetch_all(pool)
    .await?;

    Ok(users)
}
