//! Finnhub general market news.
//!
//! `GET https://finnhub.io/api/v1/news?category=general&token=KEY` returns a
//! JSON array of articles with epoch-second `datetime` fields.

use super::{FetchContext, FetchError, NewsSource};
use crate::models::NewsItem;
use crate::recency::{RunClock, from_epoch_seconds};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, info, instrument};

const ENDPOINT: &str = "https://finnhub.io/api/v1/news";

/// Only the newest records are read.
const MAX_RECORDS: usize = 30;

#[derive(Debug, Clone)]
pub struct FinnhubConfig {
    pub api_key: String,
}

#[derive(Debug, Deserialize)]
struct FinnhubArticle {
    #[serde(default)]
    headline: String,
    #[serde(default)]
    url: String,
    #[serde(default)]
    source: String,
    #[serde(default)]
    summary: String,
    #[serde(default)]
    datetime: i64,
}

#[derive(Debug, Clone)]
pub struct Finnhub {
    config: FinnhubConfig,
}

impl Finnhub {
    pub fn new(config: FinnhubConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl NewsSource for Finnhub {
    fn name(&self) -> &str {
        "Finnhub API"
    }

    #[instrument(level = "info", skip_all)]
    async fn fetch(&self, ctx: &FetchContext) -> Result<Vec<NewsItem>, FetchError> {
        if self.config.api_key.is_empty() {
            return Ok(Vec::new());
        }
        let body = ctx
            .get_text_with_query(
                ENDPOINT,
                &[("category", "general"), ("token", self.config.api_key.as_str())],
            )
            .await?;
        let items = parse_news(&body, &ctx.clock)?;
        info!(count = items.len(), "Parsed Finnhub news");
        Ok(items)
    }
}

/// Parse a Finnhub `/news` response.
///
/// The body must be a JSON array; records inside it that do not match the
/// expected shape are skipped.
pub fn parse_news(body: &str, clock: &RunClock) -> Result<Vec<NewsItem>, FetchError> {
    let records: Vec<serde_json::Value> = serde_json::from_str(body)?;
    let mut items = Vec::new();
    for record in records.into_iter().take(MAX_RECORDS) {
        let article: FinnhubArticle = match serde_json::from_value(record) {
            Ok(article) => article,
            Err(e) => {
                debug!(error = %e, "Skipping malformed Finnhub record");
                continue;
            }
        };
        let Some(published_at) = from_epoch_seconds(article.datetime) else {
            continue;
        };
        if !clock.accepts(&published_at) {
            continue;
        }
        let source = if article.source.trim().is_empty() {
            "Finnhub"
        } else {
            article.source.as_str()
        };
        let item = NewsItem::new(
            &article.headline,
            &article.url,
            source,
            &published_at,
            &article.summary,
        );
        if item.title.is_empty() {
            continue;
        }
        items.push(item);
    }
    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn clock() -> RunClock {
        RunClock::at(Utc.with_ymd_and_hms(2024, 1, 2, 3, 0, 0).unwrap(), 9)
    }

    #[test]
    fn test_parse_news_maps_fields() {
        // 1704159000 = 2024-01-02T01:30:00Z, 1703937600 = 2023-12-30T12:00:00Z
        let body = r#"[
            {"category":"top news","datetime":1704159000,"headline":"Apple  falls on\n downgrade","id":1,"source":"Reuters","summary":"<b>Barclays</b> cuts rating","url":"https://example.com/aapl"},
            {"datetime":1703937600,"headline":"Two days before cutoff","source":"CNBC","summary":"","url":"https://example.com/old"},
            {"datetime":1704159000,"headline":"","source":"CNBC","url":"https://example.com/blank"},
            {"datetime":"not a number","headline":"Broken record"},
            {"datetime":1704159000,"headline":"No source label","url":"https://example.com/ns"}
        ]"#;
        let items = parse_news(body, &clock()).unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].title, "Apple falls on downgrade");
        assert_eq!(items[0].source, "Reuters");
        assert_eq!(items[0].published_at, "2024-01-02T01:30:00Z");
        assert_eq!(items[0].description, "Barclays cuts rating");
        assert_eq!(items[1].source, "Finnhub");
    }

    #[test]
    fn test_parse_news_caps_records() {
        let records: Vec<String> = (0..40)
            .map(|i| format!(r#"{{"datetime":1704159000,"headline":"Story number {i}","url":""}}"#))
            .collect();
        let body = format!("[{}]", records.join(","));
        assert_eq!(parse_news(&body, &clock()).unwrap().len(), MAX_RECORDS);
    }

    #[test]
    fn test_parse_news_error_payload() {
        assert!(parse_news(r#"{"error":"Invalid API key"}"#, &clock()).is_err());
    }
}
