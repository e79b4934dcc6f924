//! Generic RSS / Atom feed adapter.
//!
//! One [`FeedSource`] reads a feed identified by a list of URLs and a source
//! label. URLs are tried in order and the first one that yields at least one
//! item wins, which covers publishers that moved their feed path.

use super::{FetchContext, FetchError, NewsSource, PageFetcher};
use crate::models::{Desk, NewsItem};
use crate::recency::{RunClock, to_iso};
use crate::utils::{clean_html, truncate_chars};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

/// Maximum length of a feed description after markup stripping.
const DESCRIPTION_MAX_CHARS: usize = 200;

/// Configuration for one feed.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct FeedConfig {
    /// Display name (stats key).
    pub name: String,
    /// Label stamped on every item; defaults to `name`.
    #[serde(default)]
    pub label: Option<String>,
    /// Candidate URLs, tried in order.
    pub urls: Vec<String>,
    pub desk: Desk,
}

impl FeedConfig {
    pub fn new(name: &str, urls: &[&str], desk: Desk) -> Self {
        Self {
            name: name.to_string(),
            label: None,
            urls: urls.iter().map(|u| u.to_string()).collect(),
            desk,
        }
    }

    pub fn stock_defaults() -> Vec<FeedConfig> {
        vec![
            FeedConfig::new(
                "Yahoo Finance",
                &["https://finance.yahoo.com/news/rssindex"],
                Desk::Stock,
            ),
            FeedConfig::new(
                "CNBC",
                &["https://search.cnbc.com/rs/search/combinedcms/view.xml?profile=120000000"],
                Desk::Stock,
            ),
            FeedConfig::new(
                "MarketWatch",
                &["http://feeds.marketwatch.com/marketwatch/topstories/"],
                Desk::Stock,
            ),
        ]
    }

    /// The Block first, then Decrypt.
    pub fn coin_defaults() -> Vec<FeedConfig> {
        vec![
            FeedConfig::new(
                "The Block",
                &["https://www.theblock.co/rss.xml", "https://www.theblock.co/feeds/rss.xml"],
                Desk::Coin,
            ),
            FeedConfig::new("Decrypt", &["https://decrypt.co/feed"], Desk::Coin),
        ]
    }

    fn label(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.name)
    }
}

#[derive(Debug, Clone)]
pub struct FeedSource {
    config: FeedConfig,
}

impl FeedSource {
    pub fn new(config: FeedConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl NewsSource for FeedSource {
    fn name(&self) -> &str {
        &self.config.name
    }

    #[instrument(level = "info", skip_all, fields(source = %self.config.name))]
    async fn fetch(&self, ctx: &FetchContext) -> Result<Vec<NewsItem>, FetchError> {
        read_first_feed(ctx, &self.config.urls, self.config.label(), &ctx.clock).await
    }
}

/// Try `urls` in order and return the first batch with at least one item.
///
/// When no URL yields items, the result is empty if any URL answered with a
/// readable feed, and the last error if none did.
pub(crate) async fn read_first_feed<G>(
    fetcher: &G,
    urls: &[String],
    label: &str,
    clock: &RunClock,
) -> Result<Vec<NewsItem>, FetchError>
where
    G: PageFetcher + ?Sized,
{
    let mut last_error = None;
    let mut reachable = false;
    for url in urls {
        let parsed = match fetcher.get_text(url).await {
            Ok(body) => parse_feed(body.as_bytes(), label, clock),
            Err(e) => Err(e),
        };
        match parsed {
            Ok(items) if !items.is_empty() => {
                info!(%url, count = items.len(), "Parsed feed");
                return Ok(items);
            }
            Ok(_) => {
                reachable = true;
                debug!(%url, "Feed yielded no recent items");
            }
            Err(e) => {
                debug!(%url, error = %e, "Feed URL failed");
                last_error = Some(e);
            }
        }
    }
    match last_error {
        Some(e) if !reachable => Err(e),
        _ => Ok(Vec::new()),
    }
}

/// Parse an RSS or Atom document into recent items labelled `label`.
///
/// Entries without a title are skipped. `published` (falling back to
/// `updated`) becomes the timestamp; an entry with neither is kept with an
/// empty timestamp.
pub fn parse_feed(
    body: &[u8],
    label: &str,
    clock: &RunClock,
) -> Result<Vec<NewsItem>, FetchError> {
    let feed = feed_rs::parser::parse(body)?;
    let mut items = Vec::new();
    for entry in feed.entries {
        let title = entry
            .title
            .map(|t| clean_html(&t.content))
            .unwrap_or_default();
        if title.is_empty() {
            continue;
        }
        let published_at = entry
            .published
            .or(entry.updated)
            .map(to_iso)
            .unwrap_or_default();
        if !clock.accepts(&published_at) {
            continue;
        }
        let link = entry
            .links
            .first()
            .map(|l| l.href.clone())
            .unwrap_or_default();
        let description = entry
            .summary
            .map(|s| truncate_chars(&clean_html(&s.content), DESCRIPTION_MAX_CHARS))
            .unwrap_or_default();
        items.push(NewsItem::new(&title, &link, label, &published_at, &description));
    }
    Ok(items)
}
