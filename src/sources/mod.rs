//! News source adapters.
//!
//! Each adapter turns one external source into a batch of [`NewsItem`]s.
//! All of them implement [`NewsSource`] and receive the same
//! [`FetchContext`] (shared HTTP client and run clock); source-specific
//! parameters live in the adapter struct itself.
//!
//! # Supported Sources
//!
//! | Source | Module | Method | Desk |
//! |--------|--------|--------|------|
//! | Finnhub | [`finnhub`] | JSON API, key required | stock |
//! | MKT News | [`mktnews`] | JSON flash feed | stock |
//! | Yahoo Finance, CNBC, MarketWatch | [`feed`] | RSS | stock |
//! | MNI Markets | [`mni`] | HTML scraping | stock |
//! | CryptoPanic | [`cryptopanic`] | JSON API, key required | coin |
//! | CoinDesk | [`coindesk`] | HTML scraping | coin |
//! | cryptonews.net | [`cryptonews_net`] | HTML scraping | coin |
//! | coincarp.com | [`coincarp`] | HTML scraping | coin |
//! | The Block, Decrypt | [`feed`] | RSS | coin |
//! | cryptonews.com | [`cryptonews_com`] | HTML scraping | coin |
//!
//! # Common Patterns
//!
//! Every adapter module splits into an async `fetch` that only performs HTTP
//! and a synchronous `parse_*` function that takes the response body and a
//! [`RunClock`]. Parsing never fails as a whole because of one bad record;
//! malformed records are skipped. Every emitted record has passed
//! [`RunClock::accepts`].

use crate::config::AppConfig;
use crate::models::{Desk, NewsItem};
use crate::recency::{RunClock, normalize_timestamp};
use async_trait::async_trait;
use once_cell::sync::Lazy;
use reqwest::header::{ACCEPT_LANGUAGE, HeaderMap, HeaderValue, USER_AGENT};
use reqwest::{Client, StatusCode};
use scraper::{ElementRef, Selector};
use std::collections::HashSet;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};
use url::Url;

pub mod coincarp;
pub mod coindesk;
pub mod cryptonews_com;
pub mod cryptonews_net;
pub mod cryptopanic;
pub mod feed;
pub mod finnhub;
pub mod mktnews;
pub mod mni;

use coincarp::Coincarp;
use coindesk::CoinDesk;
use cryptonews_com::CryptonewsCom;
use cryptonews_net::CryptonewsNet;
use cryptopanic::{CryptoPanic, CryptoPanicConfig};
use feed::{FeedConfig, FeedSource};
use finnhub::{Finnhub, FinnhubConfig};
use mktnews::MktNews;
use mni::MniMarkets;

const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
    AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// How many ancestors to search for a `<time>` element around a link.
const TIME_SEARCH_DEPTH: usize = 6;

static TIME_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("time").expect("time selector"));

/// Why an adapter produced no batch.
///
/// This never reaches the caller of the orchestrator; it is logged and the
/// source is counted as having contributed zero items.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected status {status} from {url}")]
    Status { status: StatusCode, url: String },

    #[error("malformed JSON payload: {0}")]
    Payload(#[from] serde_json::Error),

    #[error("unreadable feed: {0}")]
    Feed(#[from] feed_rs::parser::ParseFeedError),
}

/// Shared, read-only inputs for one aggregation run.
#[derive(Debug, Clone)]
pub struct FetchContext {
    pub client: Client,
    pub clock: RunClock,
}

impl FetchContext {
    pub fn new(client: Client, clock: RunClock) -> Self {
        Self { client, clock }
    }

    /// GET `url` and return the body, treating any non-2xx status as an error.
    pub async fn get_text(&self, url: &str) -> Result<String, FetchError> {
        self.get_text_with_query(url, &[]).await
    }

    pub async fn get_text_with_query(
        &self,
        url: &str,
        query: &[(&str, &str)],
    ) -> Result<String, FetchError> {
        let response = self.client.get(url).query(query).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status,
                url: url.to_string(),
            });
        }
        let body = response.text().await?;
        debug!(%url, bytes = body.len(), "Fetched");
        Ok(body)
    }
}

/// Plain GET of a page body, as used by the multi-URL fallbacks.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn get_text(&self, url: &str) -> Result<String, FetchError>;
}

#[async_trait]
impl PageFetcher for FetchContext {
    async fn get_text(&self, url: &str) -> Result<String, FetchError> {
        FetchContext::get_text(self, url).await
    }
}

/// Fetch several listing pages of one site and parse each in turn.
///
/// `parse` receives the page body and a set of URLs already emitted by
/// earlier pages. A page that fails is skipped; the last error is returned
/// only when every page failed.
pub(crate) async fn fetch_pages<G, F>(
    fetcher: &G,
    pages: &[&str],
    mut parse: F,
) -> Result<Vec<NewsItem>, FetchError>
where
    G: PageFetcher + ?Sized,
    F: FnMut(&str, &mut HashSet<String>) -> Vec<NewsItem> + Send,
{
    let mut seen = HashSet::new();
    let mut items = Vec::new();
    let mut last_error = None;
    let mut fetched = 0usize;

    for page in pages {
        match fetcher.get_text(page).await {
            Ok(html) => {
                fetched += 1;
                items.extend(parse(&html, &mut seen));
            }
            Err(e) => {
                warn!(%page, error = %e, "Skipping listing page");
                last_error = Some(e);
            }
        }
    }
    match last_error {
        Some(e) if fetched == 0 => Err(e),
        _ => Ok(items),
    }
}

/// Build the HTTP client shared by all adapters in a run.
pub fn build_client(timeout: Duration) -> Result<Client, reqwest::Error> {
    let mut headers = HeaderMap::new();
    headers.insert(USER_AGENT, HeaderValue::from_static(BROWSER_USER_AGENT));
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));
    Client::builder()
        .default_headers(headers)
        .timeout(timeout)
        .build()
}

/// A source of news items.
#[async_trait]
pub trait NewsSource: Send + Sync {
    /// Display name used as the key in per-source stats.
    fn name(&self) -> &str;

    /// Fetch, parse and recency-filter one batch.
    async fn fetch(&self, ctx: &FetchContext) -> Result<Vec<NewsItem>, FetchError>;
}

/// API keys for the sources that need one.
#[derive(Debug, Clone, Default)]
pub struct Credentials {
    pub finnhub: Option<String>,
    pub cryptopanic: Option<String>,
}

/// The adapters for `desk`, in invocation order.
///
/// Key-based sources are only included when their key is set. Extra feeds
/// from the config are appended, and any source named in
/// `disabled_sources` or `skip` (case-insensitive) is left out.
pub fn lineup(
    desk: Desk,
    credentials: &Credentials,
    config: &AppConfig,
    skip: &[String],
) -> Vec<Box<dyn NewsSource>> {
    let mut sources: Vec<Box<dyn NewsSource>> = Vec::new();
    match desk {
        Desk::Stock => {
            if let Some(api_key) = non_empty(&credentials.finnhub) {
                sources.push(Box::new(Finnhub::new(FinnhubConfig { api_key })));
            }
            for feed in FeedConfig::stock_defaults() {
                sources.push(Box::new(FeedSource::new(feed)));
            }
            sources.push(Box::new(MniMarkets));
            sources.push(Box::new(MktNews));
        }
        Desk::Coin => {
            if let Some(api_key) = non_empty(&credentials.cryptopanic) {
                sources.push(Box::new(CryptoPanic::new(CryptoPanicConfig { api_key })));
            }
            let mut feeds = FeedConfig::coin_defaults().into_iter();
            sources.push(Box::new(CoinDesk));
            sources.push(Box::new(CryptonewsNet));
            sources.push(Box::new(Coincarp));
            if let Some(the_block) = feeds.next() {
                sources.push(Box::new(FeedSource::new(the_block)));
            }
            sources.push(Box::new(CryptonewsCom));
            sources.extend(feeds.map(|f| Box::new(FeedSource::new(f)) as Box<dyn NewsSource>));
        }
    }
    for feed in config.extra_feeds.iter().filter(|f| f.desk == desk) {
        sources.push(Box::new(FeedSource::new(feed.clone())));
    }

    sources.retain(|source| {
        let name = source.name();
        !config
            .disabled_sources
            .iter()
            .chain(skip.iter())
            .any(|disabled| disabled.eq_ignore_ascii_case(name))
    });
    sources
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Resolve a possibly relative `href` against `base`.
pub(crate) fn resolve_href(base: &Url, href: &str) -> Option<String> {
    base.join(href.trim()).ok().map(|u| u.to_string())
}

/// Whitespace-normalized text content of an element.
pub(crate) fn element_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Normalized `datetime` of the first `<time>` found within up to six
/// ancestors of `element`, or an empty string.
pub(crate) fn time_near(element: ElementRef<'_>) -> String {
    element
        .ancestors()
        .filter_map(ElementRef::wrap)
        .take(TIME_SEARCH_DEPTH)
        .find_map(|ancestor| ancestor.select(&TIME_SELECTOR).next())
        .and_then(|time| time.value().attr("datetime"))
        .map(normalize_timestamp)
        .unwrap_or_default()
}

/// In-memory [`PageFetcher`] for adapter tests.
#[cfg(test)]
pub(crate) mod canned {
    use super::{FetchError, PageFetcher};
    use async_trait::async_trait;
    use reqwest::StatusCode;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Serves fixed bodies or statuses by URL. Unknown URLs answer 404.
    #[derive(Debug, Default)]
    pub(crate) struct CannedPages {
        pages: HashMap<String, Result<String, StatusCode>>,
        requested: Mutex<Vec<String>>,
    }

    impl CannedPages {
        pub(crate) fn body(mut self, url: &str, body: &str) -> Self {
            self.pages.insert(url.to_string(), Ok(body.to_string()));
            self
        }

        pub(crate) fn status(mut self, url: &str, status: StatusCode) -> Self {
            self.pages.insert(url.to_string(), Err(status));
            self
        }

        /// URLs requested so far, in order.
        pub(crate) fn requested(&self) -> Vec<String> {
            self.requested.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl PageFetcher for CannedPages {
        async fn get_text(&self, url: &str) -> Result<String, FetchError> {
            self.requested.lock().unwrap().push(url.to_string());
            match self.pages.get(url) {
                Some(Ok(body)) => Ok(body.clone()),
                Some(Err(status)) => Err(FetchError::Status {
                    status: *status,
                    url: url.to_string(),
                }),
                None => Err(FetchError::Status {
                    status: StatusCode::NOT_FOUND,
                    url: url.to_string(),
                }),
            }
        }
    }
}
