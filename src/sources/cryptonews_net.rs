//! cryptonews.net aggregator pages.
//!
//! Each `.news-item` card links to a story and usually names the outlet it
//! was syndicated from, which becomes the item's `source`.

use super::{FetchContext, FetchError, NewsSource, element_text, fetch_pages, resolve_href};
use crate::models::NewsItem;
use crate::recency::{RunClock, normalize_timestamp};
use crate::utils::truncate_chars;
use async_trait::async_trait;
use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use std::collections::HashSet;
use tracing::{info, instrument};
use url::Url;

const BASE_URL: &str = "https://cryptonews.net";
const PAGES: [&str; 3] = [
    "https://cryptonews.net/news/bitcoin/",
    "https://cryptonews.net/news/ethereum/",
    "https://cryptonews.net/",
];

const SITE_NAME: &str = "cryptonews.net";
const MIN_TITLE_CHARS: usize = 10;
const CARD_TEXT_TITLE_CHARS: usize = 120;

static CARD: Lazy<Selector> = Lazy::new(|| Selector::parse(".news-item").expect("card selector"));
static LINK: Lazy<Selector> = Lazy::new(|| Selector::parse("a[href]").expect("link selector"));
static TITLE: Lazy<Selector> = Lazy::new(|| {
    Selector::parse(".news-item__title, h2, h3, h4, .title").expect("title selector")
});
static TIME: Lazy<Selector> = Lazy::new(|| Selector::parse("time").expect("time selector"));
static OUTLET: Lazy<Selector> =
    Lazy::new(|| Selector::parse(".news-item__source, .source").expect("source selector"));

#[derive(Debug, Clone, Copy, Default)]
pub struct CryptonewsNet;

#[async_trait]
impl NewsSource for CryptonewsNet {
    fn name(&self) -> &str {
        SITE_NAME
    }

    #[instrument(level = "info", skip_all)]
    async fn fetch(&self, ctx: &FetchContext) -> Result<Vec<NewsItem>, FetchError> {
        let clock = &ctx.clock;
        let items = fetch_pages(ctx, &PAGES, |html, seen| parse_page(html, clock, seen)).await?;
        info!(count = items.len(), "Scraped cryptonews.net cards");
        Ok(items)
    }
}

/// Extract news cards from one page, skipping URLs already in `seen`.
pub fn parse_page(html: &str, clock: &RunClock, seen: &mut HashSet<String>) -> Vec<NewsItem> {
    let Ok(base) = Url::parse(BASE_URL) else {
        return Vec::new();
    };
    let document = Html::parse_document(html);
    let mut items = Vec::new();

    for card in document.select(&CARD) {
        let Some(url) = card
            .select(&LINK)
            .next()
            .and_then(|link| link.value().attr("href"))
            .and_then(|href| resolve_href(&base, href))
        else {
            continue;
        };
        if !seen.insert(url.clone()) {
            continue;
        }

        let title = match card.select(&TITLE).next() {
            Some(heading) => element_text(heading),
            None => truncate_chars(&element_text(card), CARD_TEXT_TITLE_CHARS),
        };
        if title.chars().count() < MIN_TITLE_CHARS {
            continue;
        }

        let published_at = card
            .select(&TIME)
            .next()
            .and_then(|time| time.value().attr("datetime"))
            .map(normalize_timestamp)
            .unwrap_or_default();
        if !clock.accepts(&published_at) {
            continue;
        }

        let outlet = card
            .select(&OUTLET)
            .next()
            .map(element_text)
            .filter(|s| !s.is_empty());
        items.push(NewsItem::new(
            &title,
            &url,
            outlet.as_deref().unwrap_or(SITE_NAME),
            &published_at,
            "",
        ));
    }
    items
}
