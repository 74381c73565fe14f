// src/handlers/admin.rs

use axum::{
    Json,
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::json;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use validator::Validate;

use crate::{
    error::AppError,
    models::{
        role::Role,
        user::{AdminCreateUserRequest, UpdateRolesRequest, User, UserListParams},
    },
    services::{activity, course, enrollment::set_roles, user},
    utils::jwt::Claims,
};

const DEFAULT_PAGE_SIZE: i64 = 10;
const MAX_PAGE_SIZE: i64 = 100;

/// Creates a user with an explicit role set.
/// Admin only.
pub async fn register_user(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<AdminCreateUserRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let created = user::create_user(&pool, &payload.user, &payload.roles).await?;
    activity::log_activity(&pool, "User registered by admin", &claims.username).await;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "id": created.id, "message": "User registered successfully" })),
    ))
}

/// Appends the filter shared by the page query and the count query.
fn push_user_filter(builder: &mut QueryBuilder<'_, Sqlite>, caller_id: i64, search: Option<&str>) {
    builder.push(" WHERE id <> ");
    builder.push_bind(caller_id);

    if let Some(term) = search {
        let pattern = format!("%{}%", term.to_lowercase());
        builder.push(" AND (lower(username) LIKE ");
        builder.push_bind(pattern.clone());
        builder.push(" OR lower(email) LIKE ");
        builder.push_bind(pattern.clone());
        builder.push(" OR lower(first_name || ' ' || last_name) LIKE ");
        builder.push_bind(pattern);
        builder.push(")");
    }
}

/// Paginated user list, optionally filtered, excluding the caller.
/// Pages are 1-based.
pub async fn list_users(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Query(params): Query<UserListParams>,
) -> Result<impl IntoResponse, AppError> {
    let caller_id = claims.user_id()?;
    let page = params.page.unwrap_or(1).max(1);
    let size = params.size.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
    let search = params
        .search
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty());

    let mut count_query: QueryBuilder<Sqlite> = QueryBuilder::new("SELECT COUNT(*) FROM users");
    push_user_filter(&mut count_query, caller_id, search);
    let total: i64 = count_query
        .build_query_scalar()
        .fetch_one(&pool)
        .await?;

    let mut page_query: QueryBuilder<Sqlite> = QueryBuilder::new(
        "SELECT id, username, password, email, first_name, last_name, created_at FROM users",
    );
    push_user_filter(&mut page_query, caller_id, search);
    page_query.push(" ORDER BY id LIMIT ");
    page_query.push_bind(size);
    page_query.push(" OFFSET ");
    page_query.push_bind((page - 1) * size);

    let users: Vec<User> = page_query
        .build_query_as()
        .fetch_all(&pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to list users: {:?}", e);
            AppError::from(e)
        })?;

    Ok(Json(json!({
        "users": user::to_responses(&pool, users).await?,
        "currentPage": page,
        "totalPages": (total + size - 1) / size,
        "totalElements": total,
    })))
}

pub async fn list_all_users(State(pool): State<SqlitePool>) -> Result<impl IntoResponse, AppError> {
    let users = sqlx::query_as::<_, User>(
        "SELECT id, username, password, email, first_name, last_name, created_at FROM users ORDER BY id",
    )
    .fetch_all(&pool)
    .await?;

    Ok(Json(user::to_responses(&pool, users).await?))
}

/// Replaces the role set of a user.
pub async fn update_roles(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateRolesRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let target = user::find_user(&pool, id).await?;

    set_roles(&pool, id, &payload.roles).await?;
    activity::log_activity(&pool, "User roles updated", &claims.username).await;

    Ok(Json(user::to_response(&pool, target).await?))
}

/// Deletes a user by ID. Prevents deleting self.
pub async fn delete_user(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    if id == claims.user_id()? {
        return Err(AppError::BadRequest("Cannot delete yourself".to_string()));
    }

    let target = user::find_user(&pool, id).await?;

    sqlx::query("DELETE FROM users WHERE id = ?")
        .bind(id)
        .execute(&pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to delete user: {:?}", e);
            AppError::from(e)
        })?;

    activity::log_activity(&pool, "User deleted", &claims.username).await;

    Ok(Json(json!({
        "message": "User deleted successfully",
        "deletedUserFullName": target.full_name(),
    })))
}

pub async fn list_courses(State(pool): State<SqlitePool>) -> Result<impl IntoResponse, AppError> {
    let courses = course::query_responses(
        &pool,
        "SELECT id, name, description, created_by, created_at FROM courses ORDER BY id",
        None,
    )
    .await?;

    Ok(Json(courses))
}

pub async fn activity_log(State(pool): State<SqlitePool>) -> Result<impl IntoResponse, AppError> {
    Ok(Json(activity::recent(&pool).await?))
}

pub async fn list_roles() -> impl IntoResponse {
    Json(Role::ALL)
}
