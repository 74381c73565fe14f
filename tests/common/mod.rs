// tests/common/mod.rs

#![allow(dead_code)]

use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use async_trait::async_trait;
use elearning_backend::{
    config::Config,
    models::assignment::AssignmentNotification,
    routes,
    services::{
        news::NewsClient,
        notification::{NotificationError, NotificationPublisher},
    },
    state::AppState,
};
use serde_json::{Value, json};
use sqlx::{
    SqlitePool,
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions},
};
use tempfile::TempDir;

pub const PASSWORD: &str = "password123";

/// Keeps published notifications in memory instead of a queue.
#[derive(Default)]
pub struct RecordingPublisher {
    pub published: Mutex<Vec<AssignmentNotification>>,
}

#[async_trait]
impl NotificationPublisher for RecordingPublisher {
    async fn publish(&self, notification: &AssignmentNotification) -> Result<(), NotificationError> {
        self.published.lock().unwrap().push(notification.clone());
        Ok(())
    }
}

pub struct TestApp {
    pub address: String,
    pub pool: SqlitePool,
    pub client: reqwest::Client,
    pub notifications: Arc<RecordingPublisher>,
    /// Keeps the on-disk database alive for the duration of the test.
    _db_dir: Option<TempDir>,
}

/// Spawns the app on a random port, backed by a fresh in-memory database.
pub async fn spawn_app() -> TestApp {
    // A single connection that never expires keeps the in-memory database alive.
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
        .expect("Failed to open in-memory SQLite");

    serve(pool, None).await
}

/// Spawns the app over a file database shared by several connections,
/// so requests really run concurrently.
pub async fn spawn_app_on_disk() -> TestApp {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let options = SqliteConnectOptions::new()
        .filename(dir.path().join("elearning.db"))
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_secs(5));

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await
        .expect("Failed to open on-disk SQLite");

    serve(pool, Some(dir)).await
}

async fn serve(pool: SqlitePool, db_dir: Option<TempDir>) -> TestApp {
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to migrate database");

    let config = Config {
        database_url: "sqlite::memory:".to_string(),
        jwt_secret: "test_secret_for_integration_tests".to_string(),
        jwt_expiration: 600,
        rust_log: "error".to_string(),
        admin_username: None,
        admin_password: None,
        bind_addr: "127.0.0.1:0".to_string(),
        cors_origins: vec!["http://localhost:5173".to_string()],
        redis_url: None,
        news_api_base_url: "http://127.0.0.1:9".to_string(),
        news_api_key: None,
    };

    let notifications = Arc::new(RecordingPublisher::default());
    let state = AppState {
        pool: pool.clone(),
        news: NewsClient::new(&config.news_api_base_url, None),
        notifier: notifications.clone(),
        config,
    };

    let app = routes::create_router(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    TestApp {
        address,
        pool,
        client: reqwest::Client::new(),
        notifications,
        _db_dir: db_dir,
    }
}

pub fn unique_name(prefix: &str) -> String {
    format!("{}_{}", prefix, &uuid::Uuid::new_v4().to_string()[..8])
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }

    pub async fn register(&self, username: &str) -> reqwest::Response {
        self.client
            .post(self.url("/api/auth/register"))
            .json(&json!({
                "username": username,
                "password": PASSWORD,
                "email": format!("{}@example.com", username),
                "firstName": "Test",
                "lastName": username,
            }))
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub async fn login(&self, username: &str) -> String {
        let body: Value = self
            .client
            .post(self.url("/api/auth/login"))
            .json(&json!({ "username": username, "password": PASSWORD }))
            .send()
            .await
            .expect("Failed to execute request")
            .json()
            .await
            .unwrap();

        body["token"].as_str().expect("login returned no token").to_string()
    }

    pub async fn user_id(&self, username: &str) -> i64 {
        sqlx::query_scalar("SELECT id FROM users WHERE username = ?")
            .bind(username)
            .fetch_one(&self.pool)
            .await
            .unwrap()
    }

    /// Registers a user, adds `role` next to STUDENT, and returns (id, token).
    pub async fn user_with_role(&self, prefix: &str, role: Option<&str>) -> (i64, String) {
        let username = unique_name(prefix);
        assert_eq!(self.register(&username).await.status().as_u16(), 201);
        let id = self.user_id(&username).await;

        if let Some(role) = role {
            sqlx::query("INSERT INTO user_roles (user_id, role) VALUES (?, ?)")
                .bind(id)
                .bind(role)
                .execute(&self.pool)
                .await
                .unwrap();
        }

        (id, self.login(&username).await)
    }

    pub async fn student(&self) -> (i64, String) {
        self.user_with_role("stu", None).await
    }

    pub async fn instructor(&self) -> (i64, String) {
        self.user_with_role("ins", Some("INSTRUCTOR")).await
    }

    pub async fn admin(&self) -> (i64, String) {
        self.user_with_role("adm", Some("ADMIN")).await
    }

    /// Creates a course as the given author and returns its id.
    pub async fn create_course(&self, token: &str, categories: &[&str]) -> i64 {
        let response = self
            .client
            .post(self.url("/api/courses"))
            .bearer_auth(token)
            .json(&json!({
                "name": unique_name("course"),
                "description": "A course used in tests",
                "categories": categories,
            }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), 201);

        let body: Value = response.json().await.unwrap();
        body["id"].as_i64().unwrap()
    }

    pub async fn add_question(&self, token: &str, course_id: i64, title: &str, answer: &str) -> i64 {
        let response = self
            .client
            .post(self.url(&format!("/api/questions?courseId={}", course_id)))
            .bearer_auth(token)
            .json(&json!({ "questionTitle": title, "correctAnswer": answer }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), 201);

        let body: Value = response.json().await.unwrap();
        body["id"].as_i64().unwrap()
    }
}
