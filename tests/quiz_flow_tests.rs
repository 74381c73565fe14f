// tests/quiz_flow_tests.rs

mod common;

use common::{TestApp, spawn_app, spawn_app_on_disk};
use serde_json::{Value, json};

async fn count(app: &TestApp, sql: &str, user_id: i64, course_id: i64) -> i64 {
    sqlx::query_scalar(sql)
        .bind(user_id)
        .bind(course_id)
        .fetch_one(&app.pool)
        .await
        .unwrap()
}

async fn started(app: &TestApp, user_id: i64, course_id: i64) -> i64 {
    count(
        app,
        "SELECT COUNT(*) FROM user_started_courses WHERE user_id = ? AND course_id = ?",
        user_id,
        course_id,
    )
    .await
}

async fn completed(app: &TestApp, user_id: i64, course_id: i64) -> i64 {
    count(
        app,
        "SELECT COUNT(*) FROM user_completed_courses WHERE user_id = ? AND course_id = ?",
        user_id,
        course_id,
    )
    .await
}

async fn certificates(app: &TestApp, user_id: i64, course_id: i64) -> i64 {
    count(
        app,
        "SELECT COUNT(*) FROM certificates WHERE user_id = ? AND course_id = ?",
        user_id,
        course_id,
    )
    .await
}

async fn results(app: &TestApp, user_id: i64, course_id: i64) -> i64 {
    count(
        app,
        "SELECT COUNT(*) FROM student_results WHERE user_id = ? AND course_id = ?",
        user_id,
        course_id,
    )
    .await
}

/// Course with four questions whose answers are A, B, C, D.
async fn course_with_pool(app: &TestApp, author: &str) -> (i64, Vec<i64>) {
    let course_id = app.create_course(author, &["math"]).await;
    let mut ids = Vec::new();
    for (i, answer) in ["A", "B", "C", "D"].iter().enumerate() {
        ids.push(
            app.add_question(author, course_id, &format!("Question {}", i + 1), answer)
                .await,
        );
    }
    (course_id, ids)
}

async fn create_quiz(app: &TestApp, author: &str, course_id: i64, body: Value) -> reqwest::Response {
    app.client
        .post(app.url(&format!("/api/quizzes/create?courseId={}", course_id)))
        .bearer_auth(author)
        .json(&body)
        .send()
        .await
        .unwrap()
}

async fn submit(
    app: &TestApp,
    token: &str,
    course_id: i64,
    quiz_id: i64,
    answers: Value,
) -> reqwest::Response {
    app.client
        .post(app.url(&format!(
            "/api/quizzes/submit?courseId={}&quizId={}",
            course_id, quiz_id
        )))
        .bearer_auth(token)
        .json(&json!({ "answers": answers, "elapsedTime": 42 }))
        .send()
        .await
        .unwrap()
}

/// Fires the submissions at once and returns their status codes.
async fn submit_concurrently(
    app: &TestApp,
    submissions: Vec<(String, i64)>,
    quiz_id: i64,
    answers: Value,
) -> Vec<u16> {
    let handles: Vec<_> = submissions
        .into_iter()
        .map(|(token, course_id)| {
            let client = app.client.clone();
            let url = app.url(&format!(
                "/api/quizzes/submit?courseId={}&quizId={}",
                course_id, quiz_id
            ));
            let body = json!({ "answers": answers.clone(), "elapsedTime": 30 });
            tokio::spawn(async move {
                client
                    .post(url)
                    .bearer_auth(token)
                    .json(&body)
                    .send()
                    .await
                    .unwrap()
                    .status()
                    .as_u16()
            })
        })
        .collect();

    let mut statuses = Vec::new();
    for handle in handles {
        statuses.push(handle.await.unwrap());
    }
    statuses
}

#[tokio::test]
async fn three_of_four_completes_the_course() {
    let app = spawn_app().await;
    let (_, instructor) = app.instructor().await;
    let (student_id, student) = app.student().await;
    let (course_id, ids) = course_with_pool(&app, &instructor).await;

    let response = create_quiz(
        &app,
        &instructor,
        course_id,
        json!({ "title": "Final", "selectedQuestionIds": ids }),
    )
    .await;
    assert_eq!(response.status().as_u16(), 201);
    let quiz_id = response.json::<Value>().await.unwrap()["id"].as_i64().unwrap();

    // Student view hides the answers
    let view: Value = app
        .client
        .get(app.url(&format!("/api/quizzes/course/{}", course_id)))
        .bearer_auth(&student)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(view["quizId"], quiz_id);
    assert_eq!(view["quizQuestions"].as_array().unwrap().len(), 4);
    assert!(view["quizQuestions"][0].get("correctAnswer").is_none());

    app.client
        .post(app.url(&format!("/api/courses/{}/start", course_id)))
        .bearer_auth(&student)
        .send()
        .await
        .unwrap();
    assert_eq!(started(&app, student_id, course_id).await, 1);

    let answers = json!([
        { "questionId": ids[0], "answer": "A" },
        { "questionId": ids[1], "answer": "B" },
        { "questionId": ids[2], "answer": "C" },
        { "questionId": ids[3], "answer": "X" }
    ]);
    let response = submit(&app, &student, course_id, quiz_id, answers.clone()).await;
    assert_eq!(response.status().as_u16(), 200);

    let result: Value = response.json().await.unwrap();
    assert_eq!(
        result,
        json!({ "score": 3, "totalQuestions": 4, "percentage": 75 })
    );

    assert_eq!(started(&app, student_id, course_id).await, 0);
    assert_eq!(completed(&app, student_id, course_id).await, 1);
    assert_eq!(certificates(&app, student_id, course_id).await, 1);
    assert_eq!(results(&app, student_id, course_id).await, 1);

    // A second attempt appends a result but completes nothing new
    let response = submit(&app, &student, course_id, quiz_id, answers).await;
    assert_eq!(response.status().as_u16(), 200);
    assert_eq!(completed(&app, student_id, course_id).await, 1);
    assert_eq!(certificates(&app, student_id, course_id).await, 1);
    assert_eq!(results(&app, student_id, course_id).await, 2);

    // Starting a completed course is a no-op
    app.client
        .post(app.url(&format!("/api/courses/{}/start", course_id)))
        .bearer_auth(&student)
        .send()
        .await
        .unwrap();
    assert_eq!(started(&app, student_id, course_id).await, 0);

    let certs: Vec<Value> = app
        .client
        .get(app.url(&format!("/api/users/{}/certificates", student_id)))
        .bearer_auth(&student)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(certs.len(), 1);
    assert_eq!(certs[0]["courseId"], course_id);

    let page: Value = app
        .client
        .get(app.url(&format!("/api/courses/{}", course_id)))
        .bearer_auth(&student)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(page["hasQuiz"], true);
    assert_eq!(page["isCourseCompleted"], true);
    assert_eq!(page["isCourseStarted"], false);
    assert_eq!(page["isCreator"], false);
    assert_eq!(page["course"]["completedCount"], 1);
    assert_eq!(page["highscores"].as_array().unwrap().len(), 2);
    assert_eq!(page["highscores"][0]["percentage"], 75);
}

#[tokio::test]
async fn random_quiz_is_clamped_to_pool_size() {
    let app = spawn_app().await;
    let (_, instructor) = app.instructor().await;
    let (course_id, ids) = course_with_pool(&app, &instructor).await;

    let response = create_quiz(
        &app,
        &instructor,
        course_id,
        json!({ "title": "Random", "numberOfQuestions": 10 }),
    )
    .await;
    assert_eq!(response.status().as_u16(), 201);
    let quiz_id = response.json::<Value>().await.unwrap()["id"].as_i64().unwrap();

    let details: Value = app
        .client
        .get(app.url(&format!("/api/quizzes/{}/details", quiz_id)))
        .bearer_auth(&instructor)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let mut picked: Vec<i64> = details["questions"]
        .as_array()
        .unwrap()
        .iter()
        .map(|q| q["id"].as_i64().unwrap())
        .collect();
    picked.sort();
    assert_eq!(picked, ids);

    // Re-creating replaces the quiz of the course
    let response = create_quiz(
        &app,
        &instructor,
        course_id,
        json!({ "title": "Random again", "numberOfQuestions": 2 }),
    )
    .await;
    assert_eq!(response.status().as_u16(), 201);

    let quizzes: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM quizzes WHERE course_id = ?")
        .bind(course_id)
        .fetch_one(&app.pool)
        .await
        .unwrap();
    assert_eq!(quizzes, 1);
}

#[tokio::test]
async fn composition_errors() {
    let app = spawn_app().await;
    let (_, instructor) = app.instructor().await;
    let empty_course = app.create_course(&instructor, &["empty"]).await;

    // Empty pool
    let response = create_quiz(
        &app,
        &instructor,
        empty_course,
        json!({ "title": "Nothing", "numberOfQuestions": 3 }),
    )
    .await;
    assert_eq!(response.status().as_u16(), 404);

    // Ids from another course's pool
    let (course_id, ids) = course_with_pool(&app, &instructor).await;
    app.add_question(&instructor, empty_course, "Lonely", "Z").await;
    let response = create_quiz(
        &app,
        &instructor,
        empty_course,
        json!({ "title": "Mismatch", "selectedQuestionIds": ids }),
    )
    .await;
    assert_eq!(response.status().as_u16(), 404);

    // Zero questions requested
    let response = create_quiz(
        &app,
        &instructor,
        course_id,
        json!({ "title": "Zero", "numberOfQuestions": 0 }),
    )
    .await;
    assert_eq!(response.status().as_u16(), 400);

    // Update without ids
    let response = create_quiz(
        &app,
        &instructor,
        course_id,
        json!({ "title": "Valid", "selectedQuestionIds": [ids[0]] }),
    )
    .await;
    let quiz_id = response.json::<Value>().await.unwrap()["id"].as_i64().unwrap();

    let response = app
        .client
        .put(app.url(&format!("/api/quizzes/{}?courseId={}", quiz_id, course_id)))
        .bearer_auth(&instructor)
        .json(&json!({ "title": "Valid", "numberOfQuestions": 3 }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 400);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Please select at least one question.");

    // Update with ids replaces the question list
    let response = app
        .client
        .put(app.url(&format!("/api/quizzes/{}?courseId={}", quiz_id, course_id)))
        .bearer_auth(&instructor)
        .json(&json!({ "title": "Renamed", "selectedQuestionIds": [ids[2], ids[3]] }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);

    let details: Value = app
        .client
        .get(app.url(&format!("/api/quizzes/{}/details", quiz_id)))
        .bearer_auth(&instructor)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(details["title"], "Renamed");
    assert_eq!(details["questions"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn unknown_quiz_is_not_found() {
    let app = spawn_app().await;
    let (_, instructor) = app.instructor().await;
    let (student_id, student) = app.student().await;
    let course_id = app.create_course(&instructor, &["misc"]).await;

    let response = submit(&app, &student, course_id, 9999, json!([])).await;
    assert_eq!(response.status().as_u16(), 404);
    assert_eq!(results(&app, student_id, course_id).await, 0);
}

#[tokio::test]
async fn deleting_a_question_removes_it_from_the_quiz() {
    let app = spawn_app().await;
    let (_, instructor) = app.instructor().await;
    let (course_id, ids) = course_with_pool(&app, &instructor).await;

    let response = create_quiz(
        &app,
        &instructor,
        course_id,
        json!({ "title": "Final", "selectedQuestionIds": ids }),
    )
    .await;
    let quiz_id = response.json::<Value>().await.unwrap()["id"].as_i64().unwrap();

    let response = app
        .client
        .delete(app.url(&format!("/api/questions/{}?courseId={}", ids[0], course_id)))
        .bearer_auth(&instructor)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);

    let details: Value = app
        .client
        .get(app.url(&format!("/api/quizzes/{}/details", quiz_id)))
        .bearer_auth(&instructor)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(details["questions"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn lessons_track_completion() {
    let app = spawn_app().await;
    let (_, instructor) = app.instructor().await;
    let (_, student) = app.student().await;
    let course_id = app.create_course(&instructor, &["writing"]).await;

    let response = app
        .client
        .post(app.url(&format!("/api/courses/{}/lessons", course_id)))
        .bearer_auth(&instructor)
        .json(&json!({
            "title": "Intro",
            "content": "<p>Welcome</p><img src=x onerror=alert(1)>"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 201);
    let lesson_id = response.json::<Value>().await.unwrap()["id"].as_i64().unwrap();

    let lesson_url = app.url(&format!("/api/courses/{}/lessons/{}", course_id, lesson_id));
    let page: Value = app
        .client
        .get(&lesson_url)
        .bearer_auth(&student)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(!page["lesson"]["content"].as_str().unwrap().contains("onerror"));
    assert_eq!(page["completedLessons"], json!([]));

    let response = app
        .client
        .post(format!("{}/complete", lesson_url))
        .bearer_auth(&student)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);

    let course_page: Value = app
        .client
        .get(app.url(&format!("/api/courses/{}", course_id)))
        .bearer_auth(&student)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(course_page["allLessonsCompleted"], true);
    assert_eq!(course_page["course"]["lessonsCount"], 1);
    assert_eq!(course_page["hasQuiz"], false);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_submissions_complete_once() {
    const ATTEMPTS: usize = 8;

    let app = spawn_app_on_disk().await;
    let (_, instructor) = app.instructor().await;
    let (student_id, student) = app.student().await;
    let (course_id, ids) = course_with_pool(&app, &instructor).await;

    let response = create_quiz(
        &app,
        &instructor,
        course_id,
        json!({ "title": "Final", "selectedQuestionIds": ids }),
    )
    .await;
    let quiz_id = response.json::<Value>().await.unwrap()["id"].as_i64().unwrap();

    app.client
        .post(app.url(&format!("/api/courses/{}/start", course_id)))
        .bearer_auth(&student)
        .send()
        .await
        .unwrap();

    let submissions = vec![(student.clone(), course_id); ATTEMPTS];
    let answers = json!([{ "questionId": ids[0], "answer": "A" }]);
    let statuses = submit_concurrently(&app, submissions, quiz_id, answers).await;

    assert!(statuses.iter().all(|s| *s == 200), "statuses: {:?}", statuses);
    assert_eq!(started(&app, student_id, course_id).await, 0);
    assert_eq!(completed(&app, student_id, course_id).await, 1);
    assert_eq!(certificates(&app, student_id, course_id).await, 1);
    assert_eq!(results(&app, student_id, course_id).await, ATTEMPTS as i64);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn students_completing_together_all_get_certificates() {
    const STUDENTS: usize = 10;

    let app = spawn_app_on_disk().await;
    let (_, instructor) = app.instructor().await;
    let (course_id, ids) = course_with_pool(&app, &instructor).await;

    let response = create_quiz(
        &app,
        &instructor,
        course_id,
        json!({ "title": "Final", "selectedQuestionIds": ids }),
    )
    .await;
    let quiz_id = response.json::<Value>().await.unwrap()["id"].as_i64().unwrap();

    let mut students = Vec::new();
    for _ in 0..STUDENTS {
        let (id, token) = app.student().await;
        app.client
            .post(app.url(&format!("/api/courses/{}/start", course_id)))
            .bearer_auth(&token)
            .send()
            .await
            .unwrap();
        students.push((id, token));
    }

    let submissions = students
        .iter()
        .map(|(_, token)| (token.clone(), course_id))
        .collect();
    let statuses = submit_concurrently(&app, submissions, quiz_id, json!([])).await;
    assert!(statuses.iter().all(|s| *s == 200), "statuses: {:?}", statuses);

    for (id, _) in &students {
        assert_eq!(started(&app, *id, course_id).await, 0);
        assert_eq!(completed(&app, *id, course_id).await, 1);
        assert_eq!(certificates(&app, *id, course_id).await, 1);
    }
}

#[tokio::test]
async fn submitting_an_emptied_quiz_is_rejected() {
    let app = spawn_app().await;
    let (_, instructor) = app.instructor().await;
    let (student_id, student) = app.student().await;
    let course_id = app.create_course(&instructor, &["history"]).await;
    let question_id = app.add_question(&instructor, course_id, "Only one", "A").await;

    let response = create_quiz(
        &app,
        &instructor,
        course_id,
        json!({ "title": "Short", "selectedQuestionIds": [question_id] }),
    )
    .await;
    let quiz_id = response.json::<Value>().await.unwrap()["id"].as_i64().unwrap();

    app.client
        .post(app.url(&format!("/api/courses/{}/start", course_id)))
        .bearer_auth(&student)
        .send()
        .await
        .unwrap();

    app.client
        .delete(app.url(&format!("/api/questions/{}?courseId={}", question_id, course_id)))
        .bearer_auth(&instructor)
        .send()
        .await
        .unwrap();

    let answers = json!([{ "questionId": question_id, "answer": "A" }]);
    let response = submit(&app, &student, course_id, quiz_id, answers).await;
    assert_eq!(response.status().as_u16(), 400);

    assert_eq!(results(&app, student_id, course_id).await, 0);
    assert_eq!(started(&app, student_id, course_id).await, 1);
    assert_eq!(completed(&app, student_id, course_id).await, 0);
    assert_eq!(certificates(&app, student_id, course_id).await, 0);
}

#[tokio::test]
async fn quiz_of_another_course_does_not_complete_it() {
    let app = spawn_app().await;
    let (_, instructor) = app.instructor().await;
    let (student_id, student) = app.student().await;
    let (easy_course, ids) = course_with_pool(&app, &instructor).await;
    let hard_course = app.create_course(&instructor, &["physics"]).await;

    let response = create_quiz(
        &app,
        &instructor,
        easy_course,
        json!({ "title": "Easy", "selectedQuestionIds": [ids[0]] }),
    )
    .await;
    let quiz_id = response.json::<Value>().await.unwrap()["id"].as_i64().unwrap();

    let answers = json!([{ "questionId": ids[0], "answer": "A" }]);
    let response = submit(&app, &student, hard_course, quiz_id, answers).await;
    assert_eq!(response.status().as_u16(), 400);

    assert_eq!(results(&app, student_id, hard_course).await, 0);
    assert_eq!(completed(&app, student_id, hard_course).await, 0);
    assert_eq!(certificates(&app, student_id, hard_course).await, 0);
}
