// src/services/notification.rs

//! Assignment notifications pushed onto a message queue for an external consumer.

use std::{fmt, sync::Arc};

use async_trait::async_trait;
use redis::{AsyncCommands, aio::MultiplexedConnection};
use tokio::sync::RwLock;

use crate::models::assignment::AssignmentNotification;

/// Redis list the notification consumer pops from.
pub const ASSIGNMENT_QUEUE: &str = "assignment-notifications";

#[derive(Debug)]
pub enum NotificationError {
    Connection(redis::RedisError),
    Serialization(serde_json::Error),
    Publish(redis::RedisError),
}

impl fmt::Display for NotificationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NotificationError::Connection(e) => write!(f, "queue connection error: {}", e),
            NotificationError::Serialization(e) => write!(f, "serialization error: {}", e),
            NotificationError::Publish(e) => write!(f, "publish error: {}", e),
        }
    }
}

impl std::error::Error for NotificationError {}

#[async_trait]
pub trait NotificationPublisher: Send + Sync {
    async fn publish(&self, notification: &AssignmentNotification) -> Result<(), NotificationError>;
}

/// Publishes JSON payloads with `LPUSH` onto [`ASSIGNMENT_QUEUE`].
/// The connection is opened on first use and reused afterwards.
pub struct RedisQueuePublisher {
    redis_url: String,
    connection: RwLock<Option<MultiplexedConnection>>,
}

impl RedisQueuePublisher {
    pub fn new(redis_url: impl Into<String>) -> Self {
        Self {
            redis_url: redis_url.into(),
            connection: RwLock::new(None),
        }
    }

    async fn connection(&self) -> Result<MultiplexedConnection, NotificationError> {
        if let Some(conn) = self.connection.read().await.clone() {
            return Ok(conn);
        }

        let client =
            redis::Client::open(self.redis_url.as_str()).map_err(NotificationError::Connection)?;
        let conn = client
            .get_multiplexed_tokio_connection()
            .await
            .map_err(NotificationError::Connection)?;

        *self.connection.write().await = Some(conn.clone());
        tracing::info!("Notification queue connected");
        Ok(conn)
    }
}

#[async_trait]
impl NotificationPublisher for RedisQueuePublisher {
    async fn publish(&self, notification: &AssignmentNotification) -> Result<(), NotificationError> {
        let payload =
            serde_json::to_string(notification).map_err(NotificationError::Serialization)?;
        let mut conn = self.connection().await?;

        let result: Result<i64, _> = conn.lpush(ASSIGNMENT_QUEUE, &payload).await;
        if let Err(e) = result {
            // Drop the cached connection so the next publish reconnects.
            *self.connection.write().await = None;
            return Err(NotificationError::Publish(e));
        }

        tracing::debug!(
            assignment_id = notification.assignment_id,
            "Assignment notification queued"
        );
        Ok(())
    }
}

/// Used when no queue is configured: the notification is only logged.
pub struct LogPublisher;

#[async_trait]
impl NotificationPublisher for LogPublisher {
    async fn publish(&self, notification: &AssignmentNotification) -> Result<(), NotificationError> {
        tracing::info!(
            assignment_id = notification.assignment_id,
            course_id = notification.course_id,
            "No notification queue configured, skipping assignment '{}'",
            notification.assignment_title
        );
        Ok(())
    }
}

/// Picks the publisher for the configured queue URL.
pub fn publisher(redis_url: Option<&str>) -> Arc<dyn NotificationPublisher> {
    match redis_url {
        Some(url) => Arc::new(RedisQueuePublisher::new(url)),
        None => Arc::new(LogPublisher),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn notification() -> AssignmentNotification {
        AssignmentNotification {
            assignment_id: 9,
            course_id: 2,
            course_name: "Databases".to_string(),
            assignment_title: "Normalize the schema".to_string(),
            assignment_description: "Up to 3NF".to_string(),
            teacher_name: "Ada Lovelace".to_string(),
            due_date: Utc::now(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn payload_uses_camel_case_fields() {
        let value = serde_json::to_value(notification()).unwrap();
        for field in [
            "assignmentId",
            "courseId",
            "courseName",
            "assignmentTitle",
            "assignmentDescription",
            "teacherName",
            "dueDate",
            "createdAt",
        ] {
            assert!(value.get(field).is_some(), "missing {}", field);
        }
    }

    #[tokio::test]
    async fn log_publisher_never_fails() {
        let publisher = publisher(None);
        assert!(publisher.publish(&notification()).await.is_ok());
    }
}
