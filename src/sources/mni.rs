//! MNI Markets article listing scraper.
//!
//! Scrapes the `/articles` listing (or the home page when the listing is not
//! served) for anchors pointing at `/articles/...`. Listings carry no
//! machine-readable timestamps, so every item has an empty `published_at`.

use super::{FetchContext, FetchError, NewsSource, PageFetcher, element_text, resolve_href};
use crate::models::NewsItem;
use crate::utils::truncate_chars;
use async_trait::async_trait;
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;
use tracing::{info, instrument, warn};
use url::Url;

const BASE_URL: &str = "https://www.mnimarkets.com";
const LISTING_URL: &str = "https://www.mnimarkets.com/articles";

const MIN_TITLE_CHARS: usize = 10;
const MAX_TITLE_CHARS: usize = 200;
const MAX_ITEMS: usize = 30;

static LINK_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("a[href]").expect("link selector"));

#[derive(Debug, Clone, Copy, Default)]
pub struct MniMarkets;

#[async_trait]
impl NewsSource for MniMarkets {
    fn name(&self) -> &str {
        "MNI Markets"
    }

    #[instrument(level = "info", skip_all)]
    async fn fetch(&self, ctx: &FetchContext) -> Result<Vec<NewsItem>, FetchError> {
        let html = fetch_listing_html(ctx).await?;
        let items = parse_listing(&html);
        info!(count = items.len(), "Scraped MNI Markets headlines");
        Ok(items)
    }
}

/// The `/articles` listing, or the home page when the listing answers non-2xx.
async fn fetch_listing_html<G: PageFetcher + ?Sized>(fetcher: &G) -> Result<String, FetchError> {
    match fetcher.get_text(LISTING_URL).await {
        Ok(html) => Ok(html),
        Err(FetchError::Status { status, .. }) => {
            warn!(%status, "Article listing unavailable; falling back to home page");
            fetcher.get_text(BASE_URL).await
        }
        Err(e) => Err(e),
    }
}

/// Extract article links from an MNI listing page.
///
/// A link whose own text is too short to be a headline borrows the text of
/// its parent element (teaser cards often wrap the title in a sibling).
pub fn parse_listing(html: &str) -> Vec<NewsItem> {
    let Ok(base) = Url::parse(BASE_URL) else {
        return Vec::new();
    };
    let document = Html::parse_document(html);
    let mut seen = HashSet::new();
    let mut items = Vec::new();

    for link in document.select(&LINK_SELECTOR) {
        let Some(href) = link.value().attr("href") else {
            continue;
        };
        if !href.contains("/articles/") {
            continue;
        }
        let Some(url) = resolve_href(&base, href) else {
            continue;
        };
        if !seen.insert(url.clone()) {
            continue;
        }

        let mut title = element_text(link);
        if title.chars().count() < MIN_TITLE_CHARS {
            if let Some(parent) = link.parent().and_then(ElementRef::wrap) {
                title = truncate_chars(&element_text(parent), MAX_TITLE_CHARS);
            }
        }
        if title.chars().count() < MIN_TITLE_CHARS {
            continue;
        }
        items.push(NewsItem::new(
            &truncate_chars(&title, MAX_TITLE_CHARS),
            &url,
            "MNI Markets",
            "",
            "",
        ));
        if items.len() >= MAX_ITEMS {
            break;
        }
    }
    items
}
