// src/config.rs

use std::env;
use dotenvy::dotenv;

/// Default token lifetime: one day.
pub const DEFAULT_JWT_EXPIRATION: u64 = 86_400;

/// At most this many announcements may be active at once.
pub const MAX_ACTIVE_ANNOUNCEMENTS: i64 = 5;

/// Number of entries returned by the course high-score list.
pub const HIGH_SCORE_LIMIT: i64 = 10;

pub const DEFAULT_NEWS_API_BASE_URL: &str = "https://newsapi.org/v2";

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    /// Token lifetime in seconds.
    pub jwt_expiration: u64,
    pub rust_log: String,
    pub admin_username: Option<String>,
    pub admin_password: Option<String>,
    pub bind_addr: String,
    pub cors_origins: Vec<String>,
    /// Message queue for assignment notifications. Notifications are only logged when unset.
    pub redis_url: Option<String>,
    pub news_api_base_url: String,
    pub news_api_key: Option<String>,
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        let database_url = env::var("DATABASE_URL")
            .expect("DATABASE_URL must be set");

        let jwt_secret = env::var("JWT_SECRET")
            .expect("JWT_SECRET must be set");

        let jwt_expiration = env::var("JWT_EXPIRATION")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_JWT_EXPIRATION);

        let rust_log = env::var("RUST_LOG")
            .unwrap_or_else(|_| "info".to_string());

        let bind_addr = env::var("BIND_ADDR")
            .unwrap_or_else(|_| "0.0.0.0:3000".to_string());

        let cors_origins = env::var("CORS_ORIGINS")
            .map(|v| parse_list(&v))
            .unwrap_or_else(|_| {
                vec![
                    "http://localhost:5173".to_string(),
                    "http://localhost:3000".to_string(),
                ]
            });

        let news_api_base_url = env::var("NEWS_API_BASE_URL")
            .unwrap_or_else(|_| DEFAULT_NEWS_API_BASE_URL.to_string());
        if let Err(e) = url::Url::parse(&news_api_base_url) {
            panic!("NEWS_API_BASE_URL is not a valid URL: {}", e);
        }

        Self {
            database_url,
            jwt_secret,
            jwt_expiration,
            rust_log,
            admin_username: non_empty_var("ADMIN_USERNAME"),
            admin_password: non_empty_var("ADMIN_PASSWORD"),
            bind_addr,
            cors_origins,
            redis_url: non_empty_var("REDIS_URL"),
            news_api_base_url,
            news_api_key: non_empty_var("NEWS_API_KEY"),
        }
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_list_skips_blanks() {
        let origins = parse_list(" http://a.test , ,http://b.test");
        assert_eq!(origins, vec!["http://a.test", "http://b.test"]);
    }
}
