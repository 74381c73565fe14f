// src/state.rs

use std::sync::Arc;

use axum::extract::FromRef;
use sqlx::SqlitePool;

use crate::{
    config::Config,
    services::{news::NewsClient, notification::NotificationPublisher},
};

#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub config: Config,
    pub notifier: Arc<dyn NotificationPublisher>,
    pub news: NewsClient,
}

impl AppState {
    /// Wires the external adapters from the configuration.
    pub fn new(pool: SqlitePool, config: Config) -> Self {
        let notifier = crate::services::notification::publisher(config.redis_url.as_deref());
        let news = NewsClient::new(&config.news_api_base_url, config.news_api_key.clone());

        Self {
            pool,
            config,
            notifier,
            news,
        }
    }
}

impl FromRef<AppState> for SqlitePool {
    fn from_ref(state: &AppState) -> Self {
        state.pool.clone()
    }
}

impl FromRef<AppState> for Config {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}
