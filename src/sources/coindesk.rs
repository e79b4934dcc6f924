//! CoinDesk latest-news scraper.

use super::{FetchContext, FetchError, NewsSource, element_text, resolve_href, time_near};
use crate::models::NewsItem;
use crate::recency::RunClock;
use async_trait::async_trait;
use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use std::collections::HashSet;
use tracing::{info, instrument};
use url::Url;

const BASE_URL: &str = "https://www.coindesk.com";
const LISTING_URL: &str = "https://www.coindesk.com/latest-crypto-news";

const MIN_TITLE_CHARS: usize = 15;

/// Story links, one selector per section, in the order they are harvested.
static SECTION_SELECTORS: Lazy<Vec<Selector>> = Lazy::new(|| {
    ["/markets/", "/business/", "/tech/", "/policy/"]
        .iter()
        .map(|section| {
            Selector::parse(&format!("a[href*='{section}']")).expect("section selector")
        })
        .collect()
});

#[derive(Debug, Clone, Copy, Default)]
pub struct CoinDesk;

#[async_trait]
impl NewsSource for CoinDesk {
    fn name(&self) -> &str {
        "CoinDesk"
    }

    #[instrument(level = "info", skip_all)]
    async fn fetch(&self, ctx: &FetchContext) -> Result<Vec<NewsItem>, FetchError> {
        let html = ctx.get_text(LISTING_URL).await?;
        let items = parse_listing(&html, &ctx.clock);
        info!(count = items.len(), "Scraped CoinDesk headlines");
        Ok(items)
    }
}

/// Extract section story links from the CoinDesk listing.
pub fn parse_listing(html: &str, clock: &RunClock) -> Vec<NewsItem> {
    let Ok(base) = Url::parse(BASE_URL) else {
        return Vec::new();
    };
    let document = Html::parse_document(html);
    let mut seen = HashSet::new();
    let mut items = Vec::new();

    for selector in SECTION_SELECTORS.iter() {
        for link in document.select(selector) {
            let Some(url) = link.value().attr("href").and_then(|h| resolve_href(&base, h)) else {
                continue;
            };
            let title = element_text(link);
            if title.chars().count() < MIN_TITLE_CHARS || seen.contains(&url) {
                continue;
            }
            seen.insert(url.clone());

            let published_at = time_near(link);
            if !clock.accepts(&published_at) {
                continue;
            }
            items.push(NewsItem::new(&title, &url, "CoinDesk", &published_at, ""));
        }
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
    fn test_parse_listing() {
        let html = r#"<html><body>
          <div class="feed">
            <article>
              <div><a href="/markets/2024/01/02/bitcoin-tops-45k/"><h2>Bitcoin Tops $45K as ETF Deadline Nears</h2></a></div>
              <span><time datetime="2024-01-02T01:05:00.000Z">Jan 2</time></span>
            </article>
            <article>
              <a href="/policy/2023/12/28/sec-delays/">SEC Delays Decision Once More</a>
              <time datetime="2023-12-28T10:00:00Z">Dec 28</time>
            </article>
            <article>
              <a href="/tech/2024/01/01/short/">Short</a>
            </article>
          </div>
        </body></html>"#;
        let items = parse_listing(html, &clock());
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].title, "Bitcoin Tops $45K as ETF Deadline Nears");
        assert_eq!(
            items[0].url,
            "https://www.coindesk.com/markets/2024/01/02/bitcoin-tops-45k/"
        );
        assert_eq!(items[0].published_at, "2024-01-02T01:05:00Z");
        assert_eq!(items[0].source, "CoinDesk");
    }

    #[test]
    fn test_parse_listing_dedups_and_keeps_undated() {
        let html = r#"<html><body><ul>
          <li><a href="https://www.coindesk.com/business/2024/01/01/miners-rally/">Bitcoin Miners Rally Into the New Year</a></li>
          <li><a href="/business/2024/01/01/miners-rally/">Bitcoin Miners Rally (duplicate link)</a></li>
          <li><a href="/markets/2024/01/01/markets-wrap/">Crypto Markets Today: Quiet Holiday Trade</a></li>
        </ul></body></html>"#;
        let items = parse_listing(html, &clock());
        let titles: Vec<&str> = items.iter().map(|i| i.title.as_str()).collect();
        assert_eq!(
            titles,
            vec![
                "Crypto Markets Today: Quiet Holiday Trade",
                "Bitcoin Miners Rally Into the New Year"
            ]
        );
        assert!(items.iter().all(|i| i.published_at.is_empty()));
    }
}
