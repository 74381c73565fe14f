// src/services/news.rs

//! Proxy for a third-party news API, filtered to educational articles.

use std::{fmt, time::Duration};

use serde::Serialize;
use serde_json::Value;

const NEWS_QUERY: &str = "education OR learning OR university OR online courses";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug)]
pub enum NewsError {
    NotConfigured,
    Request(reqwest::Error),
    Upstream(String),
}

impl fmt::Display for NewsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NewsError::NotConfigured => f.write_str("News API key is not configured"),
            NewsError::Request(e) => write!(f, "news request failed: {}", e),
            NewsError::Upstream(status) => write!(f, "news API returned status '{}'", status),
        }
    }
}

impl std::error::Error for NewsError {}

impl From<reqwest::Error> for NewsError {
    fn from(err: reqwest::Error) -> Self {
        NewsError::Request(err)
    }
}

/// Response body of `GET /api/news/external`. Failures still carry an
/// (empty) article list next to the error message.
#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NewsFeed {
    pub articles: Vec<Value>,
    pub total_results: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl NewsFeed {
    fn failed(err: NewsError) -> Self {
        Self {
            articles: Vec::new(),
            total_results: 0,
            error: Some(err.to_string()),
        }
    }
}

#[derive(Clone)]
pub struct NewsClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl NewsClient {
    pub fn new(base_url: &str, api_key: Option<String>) -> Self {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        }
    }

    /// Never fails: upstream problems are reported inside the feed.
    pub async fn educational_news(&self, page_size: usize) -> NewsFeed {
        match self.fetch(page_size).await {
            Ok(feed) => feed,
            Err(e) => {
                tracing::warn!("Failed to fetch external news: {}", e);
                NewsFeed::failed(e)
            }
        }
    }

    async fn fetch(&self, page_size: usize) -> Result<NewsFeed, NewsError> {
        let api_key = self.api_key.as_deref().ok_or(NewsError::NotConfigured)?;
        let page_size_param = page_size.to_string();

        let body: Value = self
            .http
            .get(format!("{}/everything", self.base_url))
            .query(&[
                ("q", NEWS_QUERY),
                ("language", "en"),
                ("sortBy", "publishedAt"),
                ("pageSize", page_size_param.as_str()),
                ("apiKey", api_key),
            ])
            .send()
            .await?
            .json()
            .await?;

        filter_articles(body, page_size)
    }
}

/// Keeps articles that have a title not marked `[Removed]`, up to `page_size`.
pub fn filter_articles(body: Value, page_size: usize) -> Result<NewsFeed, NewsError> {
    let status = body.get("status").and_then(Value::as_str).unwrap_or("missing");
    if status != "ok" {
        return Err(NewsError::Upstream(status.to_string()));
    }

    let articles: Vec<Value> = match body.get("articles") {
        Some(Value::Array(items)) => items
            .iter()
            .filter(|article| {
                article
                    .get("title")
                    .and_then(Value::as_str)
                    .is_some_and(|title| !title.contains("[Removed]"))
            })
            .take(page_size)
            .cloned()
            .collect(),
        _ => Vec::new(),
    };

    Ok(NewsFeed {
        total_results: articles.len(),
        articles,
        error: None,
    })
}
