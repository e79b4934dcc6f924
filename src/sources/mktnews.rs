//! MKT News flash wire.
//!
//! The flash feed is a static JSON array; the `t` query parameter busts CDN
//! caching. Flash entries often have no headline, in which case the start of
//! the body stands in as the title.

use super::{FetchContext, FetchError, NewsSource};
use crate::models::NewsItem;
use crate::recency::{RunClock, normalize_timestamp};
use crate::utils::{clean_html, truncate_chars};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, info, instrument};

const ENDPOINT: &str = "https://static.mktnews.net/json/flash/en.json";
const DETAIL_URL: &str = "https://mktnews.com/flashDetail.html";

const MAX_RECORDS: usize = 50;
const TITLE_FROM_CONTENT_CHARS: usize = 120;

#[derive(Debug, Deserialize)]
struct Flash {
    #[serde(default)]
    id: Option<serde_json::Value>,
    #[serde(default)]
    time: Option<String>,
    #[serde(default)]
    data: Option<FlashData>,
}

#[derive(Debug, Default, Deserialize)]
struct FlashData {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct MktNews;

#[async_trait]
impl NewsSource for MktNews {
    fn name(&self) -> &str {
        "MKT News"
    }

    #[instrument(level = "info", skip_all)]
    async fn fetch(&self, ctx: &FetchContext) -> Result<Vec<NewsItem>, FetchError> {
        let bust = ctx.clock.now().timestamp_millis().to_string();
        let body = ctx
            .get_text_with_query(ENDPOINT, &[("t", bust.as_str())])
            .await?;
        let items = parse_flash(&body, &ctx.clock)?;
        info!(count = items.len(), "Parsed MKT News flashes");
        Ok(items)
    }
}

/// Parse the flash JSON array.
pub fn parse_flash(body: &str, clock: &RunClock) -> Result<Vec<NewsItem>, FetchError> {
    let records: Vec<serde_json::Value> = serde_json::from_str(body)?;
    let mut items = Vec::new();
    for record in records.into_iter().take(MAX_RECORDS) {
        let flash: Flash = match serde_json::from_value(record) {
            Ok(flash) => flash,
            Err(e) => {
                debug!(error = %e, "Skipping malformed flash");
                continue;
            }
        };
        let data = flash.data.unwrap_or_default();
        // Bodies carry inline markup; strip it before any of it becomes a title.
        let content = clean_html(data.content.as_deref().unwrap_or_default());
        let headline = clean_html(data.title.as_deref().unwrap_or_default());
        let title = if headline.is_empty() {
            truncate_chars(&content, TITLE_FROM_CONTENT_CHARS)
        } else {
            headline.clone()
        };
        if title.is_empty() {
            continue;
        }

        let published_at = flash
            .time
            .as_deref()
            .map(normalize_timestamp)
            .unwrap_or_default();
        if !clock.accepts(&published_at) {
            continue;
        }

        let url = match flash.id.as_ref().and_then(flash_id) {
            Some(id) => format!("{DETAIL_URL}?id={id}"),
            None => String::new(),
        };
        let description = if !headline.is_empty() && content != title {
            content.as_str()
        } else {
            ""
        };
        items.push(NewsItem::new(&title, &url, "MKT News", &published_at, description));
    }
    Ok(items)
}

fn flash_id(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) if !s.is_empty() => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn clock() -> RunClock {
        RunClock::at(Utc.with_ymd_and_hms(2024, 1, 2, 3, 0, 0).unwrap(), 9)
    }

    #[test]
    fn test_parse_flash() {
        let long = "B".repeat(150);
        let body = format!(
            r#"[
            {{"id": "abc123", "time": "2024-01-02T02:10:00.000Z", "data": {{"title": "US CPI beats", "content": "<b>Core</b> CPI rose 0.3%"}}}},
            {{"id": 77, "time": "2024-01-02T02:00:00.000Z", "data": {{"title": "", "content": "{long}"}}}},
            {{"id": "", "time": "2023-12-29T02:00:00.000Z", "data": {{"title": "Too old"}}}},
            {{"id": "x", "time": "2024-01-02T01:00:00.000Z", "data": {{"title": " ", "content": " "}}}},
            {{"id": "y", "data": null}},
            {{"id": "z", "time": "2024-01-02T00:30:00Z", "data": {{"title": "Same text", "content": "Same text"}}}}
        ]"#
        );
        let items = parse_flash(&body, &clock()).unwrap();
        assert_eq!(items.len(), 3);

        assert_eq!(items[0].title, "US CPI beats");
        assert_eq!(items[0].url, "https://mktnews.com/flashDetail.html?id=abc123");
        assert_eq!(items[0].published_at, "2024-01-02T02:10:00Z");
        assert_eq!(items[0].description, "Core CPI rose 0.3%");

        assert_eq!(items[1].title.chars().count(), TITLE_FROM_CONTENT_CHARS);
        assert_eq!(items[1].url, "https://mktnews.com/flashDetail.html?id=77");
        assert_eq!(items[1].description, "");

        assert_eq!(items[2].title, "Same text");
        assert_eq!(items[2].description, "");
    }

    #[test]
    fn test_title_from_content_has_no_markup() {
        let body = r#"[{"id": 9, "time": "2024-01-02T02:30:00Z", "data": {"title": "", "content": "<b>Fed's Powell</b>: <span class=\"x\">rates</span> stay high"}}]"#;
        let items = parse_flash(body, &clock()).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].title, "Fed's Powell : rates stay high");
        assert_eq!(items[0].description, "");
    }
}
