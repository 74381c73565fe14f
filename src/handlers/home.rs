// src/handlers/home.rs

use axum::{
    Json,
    extract::{Query, State},
    http::HeaderMap,
    response::IntoResponse,
};
use serde::Deserialize;
use serde_json::{Map, Value, json};

use crate::{
    error::AppError,
    handlers::{announcement::active_announcements, assignment::upcoming_assignments},
    models::role::Role,
    services::{course, enrollment::load_roles, user},
    state::AppState,
    utils::jwt::optional_claims,
};

const UPCOMING_ASSIGNMENTS: usize = 3;
const DEFAULT_NEWS_PAGE_SIZE: usize = 6;
const MAX_NEWS_PAGE_SIZE: usize = 100;

/// Landing page data. Anonymous callers get everything except `user`.
pub async fn home(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, AppError> {
    let mut body = Map::new();

    if let Some(claims) = optional_claims(&headers, &state.config.jwt_secret)
        && let Ok(found) = user::find_user(&state.pool, claims.user_id()?).await
    {
        body.insert("user".into(), json!(user::to_response(&state.pool, found).await?));
    }

    body.insert(
        "top3CoursesByCategory".into(),
        json!(course::grouped_by_category(&state.pool, Some(3)).await?),
    );
    body.insert(
        "upcomingAssignments".into(),
        json!(upcoming_assignments(&state.pool, UPCOMING_ASSIGNMENTS).await?),
    );
    body.insert(
        "announcements".into(),
        json!(active_announcements(&state.pool).await?),
    );

    Ok(Json(Value::Object(body)))
}

/// Role flags of the caller, or `GUEST`.
/// Roles come from the database, not the token.
pub async fn check_role(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, AppError> {
    let Some(claims) = optional_claims(&headers, &state.config.jwt_secret) else {
        return Ok(Json(json!({ "role": "GUEST" })));
    };

    let roles = load_roles(&state.pool, claims.user_id()?).await?;
    let is_admin = roles.contains(&Role::Admin);
    let is_instructor = roles.contains(&Role::Instructor);

    Ok(Json(json!({
        "isAdmin": is_admin,
        "isInstructor": is_instructor,
        "isStudent": !is_admin && !is_instructor,
        "username": claims.username,
    })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsParams {
    pub page_size: Option<usize>,
}

/// Educational headlines from the external news API.
pub async fn external_news(
    State(state): State<AppState>,
    Query(params): Query<NewsParams>,
) -> impl IntoResponse {
    let page_size = params
        .page_size
        .unwrap_or(DEFAULT_NEWS_PAGE_SIZE)
        .clamp(1, MAX_NEWS_PAGE_SIZE);

    Json(state.news.educational_news(page_size).await)
}
