// src/services/quiz.rs

//! Quiz composition and the submission/scoring workflow.

use std::collections::{HashMap, HashSet};

use chrono::Utc;
use rand::{Rng, seq::SliceRandom};
use sqlx::{SqliteConnection, SqlitePool};

use crate::{
    error::AppError,
    models::{
        question::Question,
        quiz::{Quiz, QuizRequest, QuizResult, QuizSubmissionRequest, Response},
    },
    services::{course::ensure_course_exists, enrollment},
};

/// How the questions of a quiz are picked from the course pool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    /// Keep the pool questions whose ids are listed.
    Explicit(Vec<i64>),
    /// Shuffle the pool and keep the first `n`.
    Random(usize),
}

impl Selection {
    /// Selection used when a quiz is created: explicit ids win, otherwise sample.
    pub fn for_create(req: &QuizRequest) -> Result<Self, AppError> {
        match req.selected_question_ids.as_deref() {
            Some(ids) if !ids.is_empty() => Ok(Selection::Explicit(ids.to_vec())),
            _ if req.number_of_questions == 0 => Err(AppError::BadRequest(
                "Number of questions must be at least 1.".to_string(),
            )),
            _ => Ok(Selection::Random(req.number_of_questions as usize)),
        }
    }

    /// Updates only accept an explicit selection.
    pub fn for_update(req: &QuizRequest) -> Result<Self, AppError> {
        match req.selected_question_ids.as_deref() {
            Some(ids) if !ids.is_empty() => Ok(Selection::Explicit(ids.to_vec())),
            _ => Err(AppError::BadRequest(
                "Please select at least one question.".to_string(),
            )),
        }
    }
}

/// Picks quiz questions out of a course pool.
///
/// Explicit selections keep pool order and fail when nothing in the pool
/// matches. Random selections are an unbiased shuffle truncated to the
/// requested count, clamped by the pool size.
pub fn compose<R: Rng + ?Sized>(
    mut pool: Vec<Question>,
    selection: &Selection,
    rng: &mut R,
) -> Result<Vec<Question>, AppError> {
    match selection {
        Selection::Explicit(ids) => {
            let wanted: HashSet<i64> = ids.iter().copied().collect();
            let selected: Vec<Question> =
                pool.into_iter().filter(|q| wanted.contains(&q.id)).collect();

            if selected.is_empty() {
                return Err(AppError::NotFound(
                    "None of the selected questions were found.".to_string(),
                ));
            }
            Ok(selected)
        }
        Selection::Random(count) => {
            if pool.is_empty() {
                return Err(AppError::NotFound(
                    "There are no questions for creating a quiz. Try adding some.".to_string(),
                ));
            }
            pool.shuffle(rng);
            pool.truncate(*count);
            Ok(pool)
        }
    }
}

/// Number of correct answers.
///
/// An answer is correct when the quiz holds a question with that id and the
/// stored answer equals the submitted one exactly. Repeated answers to the
/// same question are graded once, first occurrence wins.
pub fn score(questions: &[Question], answers: &[Response]) -> u32 {
    let key: HashMap<i64, &str> = questions
        .iter()
        .map(|q| (q.id, q.correct_answer.as_str()))
        .collect();
    let mut seen = HashSet::new();

    answers
        .iter()
        .filter(|a| seen.insert(a.question_id))
        .filter(|a| key.get(&a.question_id) == Some(&a.answer.as_str()))
        .count() as u32
}

/// `score * 100 / total`, rounded half up. `None` when there are no questions.
pub fn percentage(score: u32, total: u32) -> Option<u32> {
    if total == 0 {
        return None;
    }
    let (score, total) = (u64::from(score), u64::from(total));
    Some(((score * 100 + total / 2) / total) as u32)
}

/// Grades a submission against the quiz questions.
pub fn grade(questions: &[Question], answers: &[Response]) -> Result<QuizResult, AppError> {
    let total = questions.len() as u32;
    let score = score(questions, answers);
    let percentage = percentage(score, total)
        .ok_or_else(|| AppError::BadRequest("Quiz has no questions".to_string()))?;

    Ok(QuizResult {
        score,
        total_questions: total,
        percentage,
    })
}

/// All questions in a course pool, oldest first.
pub async fn course_pool(pool: &SqlitePool, course_id: i64) -> Result<Vec<Question>, AppError> {
    let questions = sqlx::query_as::<_, Question>(
        r#"
        SELECT id, course_id, question_title, correct_answer, created_at
        FROM questions
        WHERE course_id = ?
        ORDER BY id
        "#,
    )
    .bind(course_id)
    .fetch_all(pool)
    .await?;

    Ok(questions)
}

pub async fn find_quiz(pool: &SqlitePool, quiz_id: i64) -> Result<Quiz, AppError> {
    sqlx::query_as::<_, Quiz>("SELECT id, course_id, title, created_at FROM quizzes WHERE id = ?")
        .bind(quiz_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::not_found("Quiz", quiz_id))
}

pub async fn find_course_quiz(pool: &SqlitePool, course_id: i64) -> Result<Option<Quiz>, AppError> {
    let quiz = sqlx::query_as::<_, Quiz>(
        "SELECT id, course_id, title, created_at FROM quizzes WHERE course_id = ?",
    )
    .bind(course_id)
    .fetch_optional(pool)
    .await?;

    Ok(quiz)
}

/// Ordered questions of a quiz.
pub async fn quiz_questions(pool: &SqlitePool, quiz_id: i64) -> Result<Vec<Question>, AppError> {
    let questions = sqlx::query_as::<_, Question>(
        r#"
        SELECT q.id, q.course_id, q.question_title, q.correct_answer, q.created_at
        FROM quiz_questions qq
        JOIN questions q ON q.id = qq.question_id
        WHERE qq.quiz_id = ?
        ORDER BY qq.position
        "#,
    )
    .bind(quiz_id)
    .fetch_all(pool)
    .await?;

    Ok(questions)
}

async fn replace_questions(
    conn: &mut SqliteConnection,
    quiz_id: i64,
    questions: &[Question],
) -> Result<(), AppError> {
    sqlx::query("DELETE FROM quiz_questions WHERE quiz_id = ?")
        .bind(quiz_id)
        .execute(&mut *conn)
        .await?;

    for (position, question) in questions.iter().enumerate() {
        sqlx::query("INSERT INTO quiz_questions (quiz_id, question_id, position) VALUES (?, ?, ?)")
            .bind(quiz_id)
            .bind(question.id)
            .bind(position as i64)
            .execute(&mut *conn)
            .await?;
    }
    Ok(())
}

/// Builds a quiz from the course pool and attaches it to the course,
/// replacing any quiz the course already had.
pub async fn create_quiz(
    pool: &SqlitePool,
    course_id: i64,
    req: &QuizRequest,
) -> Result<Quiz, AppError> {
    ensure_course_exists(pool, course_id).await?;
    let selection = Selection::for_create(req)?;
    let candidates = course_pool(pool, course_id).await?;
    let questions = compose(candidates, &selection, &mut rand::rng())?;

    let mut tx = pool.begin().await?;

    sqlx::query("DELETE FROM quizzes WHERE course_id = ?")
        .bind(course_id)
        .execute(&mut *tx)
        .await?;

    let now = Utc::now();
    let quiz_id = sqlx::query("INSERT INTO quizzes (course_id, title, created_at) VALUES (?, ?, ?)")
        .bind(course_id)
        .bind(&req.title)
        .bind(now)
        .execute(&mut *tx)
        .await?
        .last_insert_rowid();

    replace_questions(&mut *tx, quiz_id, &questions).await?;
    tx.commit().await?;

    tracing::info!(
        "Quiz {} created for course {} with {} questions",
        quiz_id,
        course_id,
        questions.len()
    );

    Ok(Quiz {
        id: quiz_id,
        course_id,
        title: req.title.clone(),
        created_at: now,
    })
}

/// Retitles a quiz and replaces its question list wholesale.
pub async fn update_quiz(
    pool: &SqlitePool,
    quiz_id: i64,
    course_id: i64,
    req: &QuizRequest,
) -> Result<(), AppError> {
    find_quiz(pool, quiz_id).await?;
    let selection = Selection::for_update(req)?;
    let candidates = course_pool(pool, course_id).await?;
    let questions = compose(candidates, &selection, &mut rand::rng())?;

    let mut tx = pool.begin().await?;

    sqlx::query("UPDATE quizzes SET title = ? WHERE id = ?")
        .bind(&req.title)
        .bind(quiz_id)
        .execute(&mut *tx)
        .await?;

    replace_questions(&mut *tx, quiz_id, &questions).await?;
    tx.commit().await?;

    Ok(())
}

/// Grades a submission, appends a result and completes the course for the user.
///
/// The result append and the completion transition commit separately; a
/// failure between them leaves the result without a completion.
pub async fn submit(
    pool: &SqlitePool,
    user_id: i64,
    course_id: i64,
    quiz_id: i64,
    submission: &QuizSubmissionRequest,
) -> Result<QuizResult, AppError> {
    let quiz = find_quiz(pool, quiz_id).await?;
    if quiz.course_id != course_id {
        return Err(AppError::BadRequest(format!(
            "Quiz {} does not belong to course {}",
            quiz_id, course_id
        )));
    }
    let questions = quiz_questions(pool, quiz.id).await?;
    let result = grade(&questions, &submission.answers)?;

    ensure_course_exists(pool, course_id).await?;

    sqlx::query(
        r#"
        INSERT INTO student_results (course_id, user_id, percentage, elapsed_time, created_at)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(course_id)
    .bind(user_id)
    .bind(i64::from(result.percentage))
    .bind(submission.elapsed_time)
    .bind(Utc::now())
    .execute(pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to record student result: {:?}", e);
        AppError::from(e)
    })?;

    if enrollment::complete_course(pool, user_id, course_id).await? {
        tracing::info!("User {} completed course {}", user_id, course_id);
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{SeedableRng, rngs::StdRng};

    fn question(id: i64, answer: &str) -> Question {
        Question {
            id,
            course_id: 1,
            question_title: format!("Question {}", id),
            correct_answer: answer.to_string(),
            created_at: Utc::now(),
        }
    }

    fn pool_of(n: i64) -> Vec<Question> {
        (1..=n).map(|id| question(id, "A")).collect()
    }

    fn answer(question_id: i64, answer: &str) -> Response {
        Response {
            question_id,
            answer: answer.to_string(),
        }
    }

    fn ids(questions: &[Question]) -> Vec<i64> {
        questions.iter().map(|q| q.id).collect()
    }

    #[test]
    fn explicit_selection_is_subset_of_request_and_pool() {
        let mut rng = StdRng::seed_from_u64(1);
        let selection = Selection::Explicit(vec![2, 4, 99]);

        let picked = compose(pool_of(5), &selection, &mut rng).unwrap();
        assert_eq!(ids(&picked), vec![2, 4]);
    }

    #[test]
    fn explicit_selection_without_matches_is_not_found() {
        let mut rng = StdRng::seed_from_u64(1);
        let selection = Selection::Explicit(vec![42]);

        let err = compose(pool_of(3), &selection, &mut rng).unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[test]
    fn random_selection_takes_requested_count() {
        let mut rng = StdRng::seed_from_u64(7);

        let picked = compose(pool_of(10), &Selection::Random(4), &mut rng).unwrap();
        assert_eq!(picked.len(), 4);

        let unique: HashSet<i64> = ids(&picked).into_iter().collect();
        assert_eq!(unique.len(), 4);
        assert!(unique.iter().all(|id| (1..=10).contains(id)));
    }

    #[test]
    fn random_selection_is_clamped_by_pool_size() {
        let mut rng = StdRng::seed_from_u64(7);

        let picked = compose(pool_of(3), &Selection::Random(10), &mut rng).unwrap();
        assert_eq!(picked.len(), 3);
    }

    #[test]
    fn random_selection_from_empty_pool_is_not_found() {
        let mut rng = StdRng::seed_from_u64(7);

        let err = compose(Vec::new(), &Selection::Random(3), &mut rng).unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[test]
    fn create_prefers_ids_and_rejects_zero_count() {
        let with_ids = QuizRequest {
            title: "Final".into(),
            number_of_questions: 5,
            selected_question_ids: Some(vec![1, 2]),
        };
        assert_eq!(
            Selection::for_create(&with_ids).unwrap(),
            Selection::Explicit(vec![1, 2])
        );

        let sampled = QuizRequest {
            title: "Final".into(),
            number_of_questions: 5,
            selected_question_ids: Some(vec![]),
        };
        assert_eq!(Selection::for_create(&sampled).unwrap(), Selection::Random(5));

        let empty = QuizRequest {
            title: "Final".into(),
            ..Default::default()
        };
        assert!(matches!(
            Selection::for_create(&empty),
            Err(AppError::BadRequest(_))
        ));
    }

    #[test]
    fn update_requires_explicit_ids() {
        let req = QuizRequest {
            title: "Final".into(),
            number_of_questions: 3,
            selected_question_ids: None,
        };
        assert!(matches!(
            Selection::for_update(&req),
            Err(AppError::BadRequest(_))
        ));
    }

    #[test]
    fn percentage_rounds_half_up() {
        assert_eq!(percentage(1, 3), Some(33));
        assert_eq!(percentage(2, 3), Some(67));
        assert_eq!(percentage(1, 8), Some(13));
        assert_eq!(percentage(3, 4), Some(75));
        assert_eq!(percentage(0, 5), Some(0));
        assert_eq!(percentage(5, 5), Some(100));
        assert_eq!(percentage(0, 0), None);
    }

    #[test]
    fn three_of_four_scores_seventy_five() {
        let questions = vec![question(1, "A"), question(2, "B"), question(3, "C"), question(4, "D")];
        let answers = vec![answer(1, "A"), answer(2, "B"), answer(3, "C"), answer(4, "X")];

        let result = grade(&questions, &answers).unwrap();
        assert_eq!(
            result,
            QuizResult {
                score: 3,
                total_questions: 4,
                percentage: 75
            }
        );
    }

    #[test]
    fn matching_is_exact_and_case_sensitive() {
        let questions = vec![question(1, "Paris")];

        assert_eq!(score(&questions, &[answer(1, "paris")]), 0);
        assert_eq!(score(&questions, &[answer(1, "Paris ")]), 0);
        assert_eq!(score(&questions, &[answer(1, "Paris")]), 1);
    }

    #[test]
    fn unknown_question_ids_count_as_wrong() {
        let questions = vec![question(1, "A")];
        let result = grade(&questions, &[answer(7, "A"), answer(1, "A")]).unwrap();

        assert_eq!(result.score, 1);
        assert_eq!(result.total_questions, 1);
    }

    #[test]
    fn repeated_answers_are_graded_once() {
        let questions = vec![question(1, "A"), question(2, "B")];
        let answers = vec![answer(1, "A"), answer(1, "A"), answer(1, "A")];
        assert_eq!(score(&questions, &answers), 1);

        let first_wins = vec![answer(2, "X"), answer(2, "B")];
        assert_eq!(score(&questions, &first_wins), 0);
    }

    #[test]
    fn grading_is_deterministic() {
        let questions = vec![question(1, "A"), question(2, "B"), question(3, "C")];
        let answers = vec![answer(3, "C"), answer(1, "Z")];

        let first = grade(&questions, &answers).unwrap();
        let second = grade(&questions, &answers).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.percentage, 33);
    }

    #[test]
    fn empty_quiz_is_rejected() {
        let err = grade(&[], &[answer(1, "A")]).unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }
}
