//! coincarp.com news pages.
//!
//! The pages list outbound links to the originating outlets. Anchor text
//! starts with a relative age ("3 hours ago") that is stripped from the
//! title and resolved against the run clock; the outlet's domain becomes the
//! item's source.

use super::{FetchContext, FetchError, NewsSource, element_text, fetch_pages};
use crate::models::NewsItem;
use crate::recency::{RunClock, parse_relative_age};
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Selector};
use std::collections::HashSet;
use tracing::{info, instrument};
use url::Url;

const PAGES: [&str; 3] = [
    "https://www.coincarp.com/news/bitcoin/",
    "https://www.coincarp.com/news/ethereum/",
    "https://www.coincarp.com/news/",
];

const MIN_TITLE_CHARS: usize = 15;

static LINK: Lazy<Selector> = Lazy::new(|| Selector::parse("a[href]").expect("link selector"));

static AGE_PREFIX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\d+\s*(min|mins|hour|hours|sec|secs|day|days)\s*(Ago|ago)\s*")
        .expect("age prefix pattern")
});

#[derive(Debug, Clone, Copy, Default)]
pub struct Coincarp;

#[async_trait]
impl NewsSource for Coincarp {
    fn name(&self) -> &str {
        "coincarp.com"
    }

    #[instrument(level = "info", skip_all)]
    async fn fetch(&self, ctx: &FetchContext) -> Result<Vec<NewsItem>, FetchError> {
        let clock = &ctx.clock;
        let items = fetch_pages(ctx, &PAGES, |html, seen| parse_page(html, clock, seen)).await?;
        info!(count = items.len(), "Scraped coincarp.com links");
        Ok(items)
    }
}

/// Extract outbound story links from one page, skipping URLs already in `seen`.
pub fn parse_page(html: &str, clock: &RunClock, seen: &mut HashSet<String>) -> Vec<NewsItem> {
    let document = Html::parse_document(html);
    let mut items = Vec::new();

    for link in document.select(&LINK) {
        let Some(href) = link.value().attr("href").map(str::trim) else {
            continue;
        };
        if !href.starts_with("http") || href.contains("coincarp.com") {
            continue;
        }
        let raw = element_text(link);
        // Only a leading age counts; numbers inside the headline are text.
        let (age, title) = match AGE_PREFIX.find(&raw) {
            Some(m) => (Some(m.as_str()), raw[m.end()..].trim()),
            None => (None, raw.trim()),
        };
        if title.chars().count() < MIN_TITLE_CHARS || seen.contains(href) {
            continue;
        }
        seen.insert(href.to_string());

        let published_at = age
            .and_then(|age| parse_relative_age(age, clock.now()))
            .unwrap_or_default();
        if !clock.accepts(&published_at) {
            continue;
        }
        let source = outlet_domain(href).unwrap_or_else(|| "coincarp".to_string());
        items.push(NewsItem::new(&title, href, &source, &published_at, ""));
    }
    items
}

/// Host of `href` without a leading `www.`.
fn outlet_domain(href: &str) -> Option<String> {
    let url = Url::parse(href).ok()?;
    let host = url.host_str()?;
    Some(host.strip_prefix("www.").unwrap_or(host).to_string())
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
          <a href="/news/bitcoin/">Bitcoin News Section</a>
          <a href="https://www.coincarp.com/currencies/bitcoin/">Bitcoin price on coincarp</a>
          <a href="https://www.theblock.co/post/1"><span>2 hours ago</span><span>Spot bitcoin ETF issuers update filings</span></a>
          <a href="https://cointelegraph.com/news/x">45 mins ago Ethereum gas fees fall to yearly low</a>
          <a href="https://decrypt.co/y">3 days ago Old story about a token unlock</a>
          <a href="https://decrypt.co/z">5 mins ago Short</a>
        </body></html>"#;
        let mut seen = HashSet::new();
        let items = parse_page(html, &clock(), &mut seen);
        assert_eq!(items.len(), 2);

        assert_eq!(items[0].title, "Spot bitcoin ETF issuers update filings");
        assert_eq!(items[0].source, "theblock.co");
        assert_eq!(items[0].published_at, "2024-01-02T01:00:00Z");

        assert_eq!(items[1].title, "Ethereum gas fees fall to yearly low");
        assert_eq!(items[1].source, "cointelegraph.com");
        assert_eq!(items[1].published_at, "2024-01-02T02:15:00Z");
    }

    #[test]
    fn test_numbers_inside_headline_are_not_ages() {
        let html = r#"<html><body>
          <a href="https://decrypt.co/a">Bitcoin ETFs log record inflows over 30 days</a>
          <a href="https://decrypt.co/b">Ripple settles after 3 SEC commissioners dissent</a>
        </body></html>"#;
        let mut seen = HashSet::new();
        let items = parse_page(html, &clock(), &mut seen);
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].title, "Bitcoin ETFs log record inflows over 30 days");
        assert_eq!(items[1].title, "Ripple settles after 3 SEC commissioners dissent");
        assert!(items.iter().all(|i| i.published_at.is_empty()));
    }

    #[test]
    fn test_outlet_domain() {
        assert_eq!(outlet_domain("https://www.coindesk.com/a").as_deref(), Some("coindesk.com"));
        assert_eq!(outlet_domain("http://news.bitcoin.com/").as_deref(), Some("news.bitcoin.com"));
        assert_eq!(outlet_domain("http://"), None);
    }
}
