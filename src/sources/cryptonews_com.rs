//! cryptonews.com news index pages.

use super::{FetchContext, FetchError, NewsSource, element_text, fetch_pages, resolve_href, time_near};
use crate::models::NewsItem;
use crate::recency::RunClock;
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Selector};
use std::collections::HashSet;
use tracing::{info, instrument};
use url::Url;

const BASE_URL: &str = "https://cryptonews.com";
const PAGES: [&str; 3] = [
    "https://cryptonews.com/news/",
    "https://cryptonews.com/news/bitcoin-news/",
    "https://cryptonews.com/news/ethereum-news/",
];

const MIN_TITLE_CHARS: usize = 15;

static LINK: Lazy<Selector> = Lazy::new(|| Selector::parse("a[href]").expect("link selector"));

/// Story URLs; section indexes and pagination do not match.
static STORY_URL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"cryptonews\.com/news/[a-z]").expect("story url pattern"));

#[derive(Debug, Clone, Copy, Default)]
pub struct CryptonewsCom;

#[async_trait]
impl NewsSource for CryptonewsCom {
    fn name(&self) -> &str {
        "cryptonews.com"
    }

    #[instrument(level = "info", skip_all)]
    async fn fetch(&self, ctx: &FetchContext) -> Result<Vec<NewsItem>, FetchError> {
        let clock = &ctx.clock;
        let items = fetch_pages(ctx, &PAGES, |html, seen| parse_page(html, clock, seen)).await?;
        info!(count = items.len(), "Scraped cryptonews.com headlines");
        Ok(items)
    }
}

pub fn parse_page(html: &str, clock: &RunClock, seen: &mut HashSet<String>) -> Vec<NewsItem> {
    let Ok(base) = Url::parse(BASE_URL) else {
        return Vec::new();
    };
    let document = Html::parse_document(html);
    let mut items = Vec::new();

    for link in document.select(&LINK) {
        let Some(url) = link.value().attr("href").and_then(|h| resolve_href(&base, h)) else {
            continue;
        };
        if !STORY_URL.is_match(&url) {
            continue;
        }
        let title = element_text(link);
        if title.chars().count() < MIN_TITLE_CHARS || seen.contains(&url) {
            continue;
        }
        seen.insert(url.clone());

        let published_at = time_near(link);
        if !clock.accepts(&published_at) {
            continue;
        }
        items.push(NewsItem::new(&title, &url, "cryptonews.com", &published_at, ""));
    }
    items
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn clock() -> RunClock {
        RunClock::at(Utc.with_ymd_and_hms(2024, 1, 2, 3, 0, 0).unwrap(), 9)
    }

    #[test]
    fn test_parse_page() {
        let html = r#"<html><body>
          <section>
            <div class="article">
              <a href="/news/bitcoin-price-prediction-as-etf-nears.htm">Bitcoin Price Prediction as ETF Approval Nears</a>
              <time datetime="2024-01-02T02:00:00+00:00">1h</time>
            </div>
            <div class="article">
              <a href="/news/2/">Page 2 of the news index</a>
            </div>
            <div class="article">
              <a href="https://cryptonews.com/news/old-story.htm">An older story from last week</a>
              <time datetime="2023-12-26T02:00:00+00:00">Dec 26</time>
            </div>
            <div class="article">
              <a href="https://example.com/news/offsite">Offsite link with long text</a>
            </div>
          </section>
        </body></html>"#;
        let mut seen = HashSet::new();
        let items = parse_page(html, &clock(), &mut seen);
        assert_eq!(items.len(), 1);
        assert_eq!(
            items[0].url,
            "https://cryptonews.com/news/bitcoin-price-prediction-as-etf-nears.htm"
        );
        assert_eq!(items[0].published_at, "2024-01-02T02:00:00Z");
        assert_eq!(items[0].source, "cryptonews.com");
        assert_eq!(seen.len(), 2);
    }
}
