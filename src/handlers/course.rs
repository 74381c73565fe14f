// src/handlers/course.rs

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
    models::{
        assignment::Assignment,
        course::{
            Course, CreateCourseRequest, CreateLessonRequest, Lesson, LessonInfo,
            UpdateCourseDescriptionRequest, UpdateCourseNameRequest,
        },
    },
    services::{
        activity::log_activity,
        course::{self, ensure_course_exists, find_course},
        enrollment,
        quiz::find_course_quiz,
    },
    utils::{html::clean_html, jwt::Claims},
};

const COURSES_BY_CATEGORY: &str = r#"
    SELECT c.id, c.name, c.description, c.created_by, c.created_at
    FROM courses c
    JOIN course_categories cc ON cc.course_id = c.id
    WHERE cc.category = ?
    ORDER BY c.id
"#;

const STARTED_COURSES: &str = r#"
    SELECT c.id, c.name, c.description, c.created_by, c.created_at
    FROM courses c
    JOIN user_started_courses s ON s.course_id = c.id
    WHERE s.user_id = ?
    ORDER BY c.id
"#;

const COMPLETED_COURSES: &str = r#"
    SELECT c.id, c.name, c.description, c.created_by, c.created_at
    FROM courses c
    JOIN user_completed_courses d ON d.course_id = c.id
    WHERE d.user_id = ?
    ORDER BY c.id
"#;

/// All courses grouped by category.
pub async fn list_courses(State(pool): State<SqlitePool>) -> Result<impl IntoResponse, AppError> {
    Ok(Json(course::grouped_by_category(&pool, None).await?))
}

/// First three courses of each category.
pub async fn top3_courses(State(pool): State<SqlitePool>) -> Result<impl IntoResponse, AppError> {
    Ok(Json(course::grouped_by_category(&pool, Some(3)).await?))
}

pub async fn list_by_category(
    State(pool): State<SqlitePool>,
    Path(category): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let courses = sqlx::query_as::<_, Course>(COURSES_BY_CATEGORY)
        .bind(&category)
        .fetch_all(&pool)
        .await?;

    Ok(Json(course::to_responses(&pool, courses).await?))
}

/// Creates a course owned by the caller.
pub async fn create_course(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CreateCourseRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let categories: Vec<&str> = payload
        .categories
        .iter()
        .map(|c| c.trim())
        .filter(|c| !c.is_empty())
        .collect();
    if categories.is_empty() {
        return Err(AppError::BadRequest(
            "At least one category is required!".to_string(),
        ));
    }

    let mut tx = pool.begin().await?;

    let id = sqlx::query(
        "INSERT INTO courses (name, description, created_by, created_at) VALUES (?, ?, ?, ?)",
    )
    .bind(&payload.name)
    .bind(&payload.description)
    .bind(claims.user_id()?)
    .bind(Utc::now())
    .execute(&mut *tx)
    .await?
    .last_insert_rowid();

    for category in categories {
        sqlx::query("INSERT OR IGNORE INTO course_categories (course_id, category) VALUES (?, ?)")
            .bind(id)
            .bind(category)
            .execute(&mut *tx)
            .await?;
    }

    tx.commit().await?;

    log_activity(&pool, "New course created", &claims.username).await;

    let created = find_course(&pool, id).await?;
    Ok((StatusCode::CREATED, Json(course::to_response(&pool, created).await?)))
}

/// Course page: the course plus the caller's progress in it.
pub async fn get_course(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;
    let found = find_course(&pool, id).await?;
    let is_creator = found.created_by == Some(user_id);

    let has_quiz = find_course_quiz(&pool, id).await?.is_some();
    let highscores = course::high_scores(&pool, id).await?;
    let assignments = sqlx::query_as::<_, Assignment>(
        r#"
        SELECT id, course_id, title, description, due_date, created_at
        FROM assignments
        WHERE course_id = ?
        ORDER BY due_date
        "#,
    )
    .bind(id)
    .fetch_all(&pool)
    .await?;

    Ok(Json(json!({
        "course": course::to_response(&pool, found).await?,
        "hasQuiz": has_quiz,
        "highscores": highscores,
        "assignments": assignments,
        "allLessonsCompleted": enrollment::all_lessons_completed(&pool, user_id, id).await?,
        "isCreator": is_creator,
        "isCourseStarted": enrollment::is_started(&pool, user_id, id).await?,
        "isCourseCompleted": enrollment::is_completed(&pool, user_id, id).await?,
    })))
}

pub async fn update_course_name(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateCourseNameRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let result = sqlx::query("UPDATE courses SET name = ? WHERE id = ?")
        .bind(&payload.name)
        .bind(id)
        .execute(&pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(AppError::not_found("Course", id));
    }

    log_activity(&pool, "Course name updated", &claims.username).await;
    Ok(Json(json!({ "message": "Name updated successfully" })))
}

pub async fn update_course_description(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateCourseDescriptionRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let result = sqlx::query("UPDATE courses SET description = ? WHERE id = ?")
        .bind(&payload.description)
        .bind(id)
        .execute(&pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(AppError::not_found("Course", id));
    }

    log_activity(&pool, "Course description updated", &claims.username).await;
    Ok(Json(json!({ "message": "Description updated successfully" })))
}

/// Enrolls the caller. Already started or completed courses are left alone.
pub async fn start_course(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    ensure_course_exists(&pool, id).await?;

    if enrollment::start_course(&pool, claims.user_id()?, id).await? {
        log_activity(&pool, "Course started", &claims.username).await;
    }

    Ok(Json(json!({ "message": "Course started successfully" })))
}

pub async fn student_courses(
    State(pool): State<SqlitePool>,
    Path(user_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let started = course::query_responses(&pool, STARTED_COURSES, Some(user_id)).await?;
    let completed = course::query_responses(&pool, COMPLETED_COURSES, Some(user_id)).await?;

    Ok(Json(json!({
        "startedCourses": started,
        "completedCourses": completed,
    })))
}

pub async fn course_highscores(
    State(pool): State<SqlitePool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    ensure_course_exists(&pool, id).await?;
    Ok(Json(course::high_scores(&pool, id).await?))
}

/// Adds a lesson. The HTML body is sanitized before it is stored.
pub async fn create_lesson(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Path(course_id): Path<i64>,
    Json(payload): Json<CreateLessonRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    ensure_course_exists(&pool, course_id).await?;

    let id = sqlx::query(
        "INSERT INTO lessons (course_id, title, content, created_at) VALUES (?, ?, ?, ?)",
    )
    .bind(course_id)
    .bind(&payload.title)
    .bind(clean_html(&payload.content))
    .bind(Utc::now())
    .execute(&pool)
    .await?
    .last_insert_rowid();

    log_activity(&pool, "New lesson created", &claims.username).await;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "id": id, "message": "Lesson created successfully" })),
    ))
}

async fn find_lesson(pool: &SqlitePool, course_id: i64, lesson_id: i64) -> Result<Lesson, AppError> {
    sqlx::query_as::<_, Lesson>(
        "SELECT id, course_id, title, content, created_at FROM lessons WHERE id = ? AND course_id = ?",
    )
    .bind(lesson_id)
    .bind(course_id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::not_found("Lesson", lesson_id))
}

pub async fn get_lesson(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Path((course_id, lesson_id)): Path<(i64, i64)>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;
    let found = find_course(&pool, course_id).await?;
    let lesson = find_lesson(&pool, course_id, lesson_id).await?;

    let completed_lessons = sqlx::query_as::<_, LessonInfo>(
        r#"
        SELECT l.id, l.title
        FROM lessons l
        JOIN user_completed_lessons ucl ON ucl.lesson_id = l.id
        WHERE ucl.user_id = ? AND l.course_id = ?
        ORDER BY l.id
        "#,
    )
    .bind(user_id)
    .bind(course_id)
    .fetch_all(&pool)
    .await?;

    let is_creator = found.created_by == Some(user_id);

    Ok(Json(json!({
        "course": course::to_response(&pool, found).await?,
        "lesson": lesson,
        "completedLessons": completed_lessons,
        "isCreator": is_creator,
    })))
}

pub async fn complete_lesson(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Path((course_id, lesson_id)): Path<(i64, i64)>,
) -> Result<impl IntoResponse, AppError> {
    let lesson = find_lesson(&pool, course_id, lesson_id).await?;

    enrollment::complete_lesson(&pool, claims.user_id()?, lesson.id).await?;
    log_activity(&pool, "Completed lesson", &claims.username).await;

    Ok(Json(json!({ "message": "Lesson marked as completed" })))
}
