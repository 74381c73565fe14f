// src/services/course.rs

use std::collections::BTreeMap;

use sqlx::SqlitePool;

use crate::{
    config::HIGH_SCORE_LIMIT,
    error::AppError,
    models::course::{Course, CourseResponse, CreatorInfo, HighScoreEntry, LessonInfo},
};

pub async fn find_course(pool: &SqlitePool, course_id: i64) -> Result<Course, AppError> {
    sqlx::query_as::<_, Course>(
        "SELECT id, name, description, created_by, created_at FROM courses WHERE id = ?",
    )
    .bind(course_id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::not_found("Course", course_id))
}

pub async fn ensure_course_exists(pool: &SqlitePool, course_id: i64) -> Result<(), AppError> {
    let exists: Option<i64> = sqlx::query_scalar("SELECT id FROM courses WHERE id = ?")
        .bind(course_id)
        .fetch_optional(pool)
        .await?;

    exists
        .map(|_| ())
        .ok_or_else(|| AppError::not_found("Course", course_id))
}

/// Expands a course row with categories, creator, counts and lesson list.
pub async fn to_response(pool: &SqlitePool, course: Course) -> Result<CourseResponse, AppError> {
    let categories: Vec<String> = sqlx::query_scalar(
        "SELECT category FROM course_categories WHERE course_id = ? ORDER BY category",
    )
    .bind(course.id)
    .fetch_all(pool)
    .await?;

    let created_by = match course.created_by {
        Some(user_id) => {
            sqlx::query_as::<_, CreatorInfo>(
                r#"
                SELECT id, username, first_name || ' ' || last_name AS full_name
                FROM users
                WHERE id = ?
                "#,
            )
            .bind(user_id)
            .fetch_optional(pool)
            .await?
        }
        None => None,
    };

    let (participant_count, completed_count, lessons_count): (i64, i64, i64) = sqlx::query_as(
        r#"
        SELECT
            (SELECT COUNT(*) FROM user_started_courses WHERE course_id = ?),
            (SELECT COUNT(*) FROM user_completed_courses WHERE course_id = ?),
            (SELECT COUNT(*) FROM lessons WHERE course_id = ?)
        "#,
    )
    .bind(course.id)
    .bind(course.id)
    .bind(course.id)
    .fetch_one(pool)
    .await?;

    let lessons = sqlx::query_as::<_, LessonInfo>(
        "SELECT id, title FROM lessons WHERE course_id = ? ORDER BY id",
    )
    .bind(course.id)
    .fetch_all(pool)
    .await?;

    Ok(CourseResponse {
        id: course.id,
        name: course.name,
        description: course.description,
        categories,
        created_on: course.created_at,
        created_by,
        participant_count,
        completed_count,
        lessons_count,
        lessons,
    })
}

pub async fn to_responses(
    pool: &SqlitePool,
    courses: Vec<Course>,
) -> Result<Vec<CourseResponse>, AppError> {
    let mut responses = Vec::with_capacity(courses.len());
    for course in courses {
        responses.push(to_response(pool, course).await?);
    }
    Ok(responses)
}

/// Runs a course query with a single bound id (or none) and expands every row.
pub async fn query_responses(
    pool: &SqlitePool,
    sql: &str,
    id: Option<i64>,
) -> Result<Vec<CourseResponse>, AppError> {
    let mut query = sqlx::query_as::<_, Course>(sql);
    if let Some(id) = id {
        query = query.bind(id);
    }
    let courses = query.fetch_all(pool).await?;
    to_responses(pool, courses).await
}

/// All courses grouped by category. `limit` caps each group.
pub async fn grouped_by_category(
    pool: &SqlitePool,
    limit: Option<usize>,
) -> Result<BTreeMap<String, Vec<CourseResponse>>, AppError> {
    let courses = query_responses(
        pool,
        "SELECT id, name, description, created_by, created_at FROM courses ORDER BY id",
        None,
    )
    .await?;

    Ok(group_by_category(courses, limit))
}

/// A course with several categories appears in each of its groups.
pub fn group_by_category(
    courses: Vec<CourseResponse>,
    limit: Option<usize>,
) -> BTreeMap<String, Vec<CourseResponse>> {
    let mut grouped: BTreeMap<String, Vec<CourseResponse>> = BTreeMap::new();

    for course in courses {
        for category in &course.categories {
            let group = grouped.entry(category.clone()).or_default();
            if limit.is_none_or(|max| group.len() < max) {
                group.push(course.clone());
            }
        }
    }
    grouped
}

/// Best attempts first: highest percentage, then fastest.
pub async fn high_scores(pool: &SqlitePool, course_id: i64) -> Result<Vec<HighScoreEntry>, AppError> {
    let scores = sqlx::query_as::<_, HighScoreEntry>(
        r#"
        SELECT u.username, r.percentage, r.elapsed_time, r.created_at
        FROM student_results r
        JOIN users u ON u.id = r.user_id
        WHERE r.course_id = ?
        ORDER BY r.percentage DESC, r.elapsed_time ASC, r.id ASC
        LIMIT ?
        "#,
    )
    .bind(course_id)
    .bind(HIGH_SCORE_LIMIT)
    .fetch_all(pool)
    .await?;

    Ok(scores)
}
