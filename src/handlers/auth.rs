// src/handlers/auth.rs

use axum::{
    Json,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
};
use serde_json::json;
use sqlx::SqlitePool;
use validator::Validate;

use crate::{
    config::Config,
    error::AppError,
    models::{
        role::Role,
        user::{CreateUserRequest, LoginRequest},
    },
    services::{activity::log_activity, enrollment::load_roles, user},
    utils::{
        hash::verify_password,
        jwt::{optional_claims, sign_jwt},
    },
};

/// Registers a new student account.
///
/// Hashes the password using Argon2 before storing it.
/// Returns 201 Created. Duplicate usernames or emails are a 400.
pub async fn register(
    State(pool): State<SqlitePool>,
    Json(payload): Json<CreateUserRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    user::create_user(&pool, &payload, &[Role::Student]).await?;
    log_activity(&pool, "New user registered", &payload.username).await;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "User registered successfully" })),
    ))
}

/// Authenticates a user and returns a JWT token.
///
/// The token carries the user's id, username and role set.
pub async fn login(
    State(pool): State<SqlitePool>,
    State(config): State<Config>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let user = user::find_by_username(&pool, &payload.username)
        .await?
        .ok_or_else(|| AppError::AuthError("Invalid credentials".to_string()))?;

    if !verify_password(&payload.password, &user.password)? {
        return Err(AppError::AuthError("Invalid credentials".to_string()));
    }

    let roles = load_roles(&pool, user.id).await?;
    let token = sign_jwt(
        user.id,
        &user.username,
        &roles,
        &config.jwt_secret,
        config.jwt_expiration,
    )?;

    tracing::info!("User {} logged in", user.username);

    Ok(Json(json!({
        "token": token,
        "type": "Bearer",
        "user": user::to_response(&pool, user).await?,
    })))
}

/// Current user profile, or `{authenticated: false}` for anonymous callers.
pub async fn me(
    State(pool): State<SqlitePool>,
    State(config): State<Config>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, AppError> {
    let Some(claims) = optional_claims(&headers, &config.jwt_secret) else {
        return Ok(Json(json!({ "authenticated": false })));
    };

    match user::find_user(&pool, claims.user_id()?).await {
        Ok(found) => Ok(Json(json!(user::to_response(&pool, found).await?))),
        Err(AppError::NotFound(_)) => Ok(Json(json!({ "authenticated": false }))),
        Err(e) => Err(e),
    }
}
