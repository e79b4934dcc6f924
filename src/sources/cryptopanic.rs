//! CryptoPanic developer API.

use super::{FetchContext, FetchError, NewsSource};
use crate::models::NewsItem;
use crate::recency::{RunClock, normalize_timestamp};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use tracing::{debug, info, instrument, warn};

const ENDPOINT: &str = "https://cryptopanic.com/api/developer/v2/posts/";

const MAX_RECORDS: usize = 50;

#[derive(Debug, Clone)]
pub struct CryptoPanicConfig {
    pub api_key: String,
}

#[derive(Debug, Deserialize)]
struct PostsResponse {
    #[serde(default)]
    results: Vec<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct Post {
    #[serde(default)]
    title: String,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    published_at: Option<String>,
    #[serde(default)]
    description: Option<String>,
}

#[derive(Debug, Clone)]
pub struct CryptoPanic {
    config: CryptoPanicConfig,
}

impl CryptoPanic {
    pub fn new(config: CryptoPanicConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl NewsSource for CryptoPanic {
    fn name(&self) -> &str {
        "CryptoPanic"
    }

    #[instrument(level = "info", skip_all)]
    async fn fetch(&self, ctx: &FetchContext) -> Result<Vec<NewsItem>, FetchError> {
        if self.config.api_key.is_empty() {
            return Ok(Vec::new());
        }
        let query = [
            ("auth_token", self.config.api_key.as_str()),
            ("public", "true"),
            ("kind", "news"),
            ("regions", "en"),
        ];
        let body = match ctx.get_text_with_query(ENDPOINT, &query).await {
            Ok(body) => body,
            Err(FetchError::Status { status, .. })
                if status == StatusCode::FORBIDDEN || status == StatusCode::TOO_MANY_REQUESTS =>
            {
                warn!(%status, "CryptoPanic refused the request (quota or plan)");
                return Ok(Vec::new());
            }
            Err(e) => return Err(e),
        };
        let items = parse_posts(&body, &ctx.clock)?;
        info!(count = items.len(), "Parsed CryptoPanic posts");
        Ok(items)
    }
}

/// Parse a CryptoPanic `posts` response.
pub fn parse_posts(body: &str, clock: &RunClock) -> Result<Vec<NewsItem>, FetchError> {
    let response: PostsResponse = serde_json::from_str(body)?;
    let mut items = Vec::new();
    for record in response.results.into_iter().take(MAX_RECORDS) {
        let post: Post = match serde_json::from_value(record) {
            Ok(post) => post,
            Err(e) => {
                debug!(error = %e, "Skipping malformed CryptoPanic post");
                continue;
            }
        };
        let published_at = post
            .published_at
            .as_deref()
            .map(normalize_timestamp)
            .unwrap_or_default();
        if !clock.accepts(&published_at) {
            continue;
        }
        let item = NewsItem::new(
            &post.title,
            post.url.as_deref().unwrap_or_default(),
            "CryptoPanic",
            &published_at,
            post.description.as_deref().unwrap_or_default(),
        );
        if item.title.is_empty() {
            continue;
        }
        items.push(item);
    }
    Ok(items)
}
