//! LLM summarization of the aggregated feed, with exponential backoff.
//!
//! The feed is flattened into a plain text block by [`build_news_text`] and
//! sent twice to an OpenAI-compatible endpoint through `awful_aj`: once with
//! the quick-summary template and once with the deep-dive template. Each
//! half fails independently to an empty string; summarization never alters
//! the feed itself.
//!
//! # Architecture
//!
//! - [`AskAsync`]: Core trait defining async LLM interaction
//! - [`AskFnWrapper`]: Wraps the `awful_aj` library's `ask` function
//! - [`RetryAsk`]: Decorator that adds retry logic to any `AskAsync` implementation
//!
//! # Retry Strategy
//!
//! - Maximum 5 retry attempts
//! - Exponential backoff starting at 1 second
//! - Maximum delay capped at 30 seconds
//! - Random jitter (0-250ms) added between attempts

use crate::models::{NewsItem, Summary};
use crate::utils::{truncate_chars, truncate_for_log};
use awful_aj::api::ask;
use awful_aj::{config::AwfulJadeConfig, template::ChatTemplate};
use rand::{Rng, rng};
use std::error::Error;
use std::fmt;
use std::time::{Duration as StdDuration, Instant};
use tokio::time::sleep;
use tracing::{debug, error, info, instrument, warn};

/// Characters of description kept per entry in [`build_news_text`].
const DESCRIPTION_SNIPPET_CHARS: usize = 120;

/// Trait for async LLM interaction.
///
/// Implementors send text to an LLM and receive a response. This allows
/// decorators (like retry logic) and stand-ins for tests.
pub trait AskAsync {
    /// The type of response returned by the LLM.
    type Response;

    /// Send text to the LLM and receive a response.
    async fn ask(&self, text: &str) -> Result<Self::Response, Box<dyn Error>>;
}

/// Wrapper that adds exponential backoff retry logic to any [`AskAsync`] implementation.
///
/// The delay between retries follows:
/// ```text
/// delay = min(base_delay * 2^(attempt-1), max_delay) + random_jitter(0..250ms)
/// ```
pub struct RetryAsk<T> {
    inner: T,
    max_retries: usize,
    base_delay: StdDuration,
    max_delay: StdDuration,
}

impl<T> RetryAsk<T>
where
    T: AskAsync,
{
    /// Wrap `inner`, retrying up to `max_retries` times after the first failure.
    pub fn new(inner: T, max_retries: usize, base_delay: StdDuration) -> Self {
        Self {
            inner,
            max_retries,
            base_delay,
            max_delay: StdDuration::from_secs(30),
        }
    }
}

impl<T> fmt::Debug for RetryAsk<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryAsk")
            .field("max_retries", &self.max_retries)
            .field("base_delay", &self.base_delay)
            .field("max_delay", &self.max_delay)
            .finish()
    }
}

impl<T> AskAsync for RetryAsk<T>
where
    T: AskAsync + fmt::Debug,
{
    type Response = T::Response;

    #[instrument(level = "info", skip_all)]
    async fn ask(&self, text: &str) -> Result<Self::Response, Box<dyn Error>> {
        let total_t0 = Instant::now();
        let mut attempt = 0usize;

        loop {
            let attempt_t0 = Instant::now();
            match self.inner.ask(text).await {
                Ok(resp) => return Ok(resp),
                Err(e) => {
                    attempt += 1;
                    let attempt_dt = attempt_t0.elapsed();
                    let total_dt = total_t0.elapsed();

                    if attempt > self.max_retries {
                        error!(
                            attempt,
                            max = self.max_retries,
                            elapsed_ms_attempt = attempt_dt.as_millis(),
                            elapsed_ms_total = total_dt.as_millis(),
                            error = %e,
                            "ask() exhausted retries"
                        );
                        return Err(e);
                    }

                    let shift = u32::try_from(attempt - 1).unwrap_or(u32::MAX).min(16);
                    let delay = self.base_delay.saturating_mul(1 << shift).min(self.max_delay);
                    let jitter_ms: u64 = rng().random_range(0..=250);
                    let delay = delay + StdDuration::from_millis(jitter_ms);

                    warn!(
                        attempt,
                        max = self.max_retries,
                        elapsed_ms_attempt = attempt_dt.as_millis(),
                        elapsed_ms_total = total_dt.as_millis(),
                        ?delay,
                        error = %e,
                        "ask() attempt failed; backing off"
                    );
                    sleep(delay).await;
                }
            }
        }
    }
}

/// Wrapper around `awful_aj::api::ask` that implements [`AskAsync`].
#[derive(Debug)]
pub struct AskFnWrapper<'a> {
    /// LLM configuration (API keys, endpoints, model settings).
    pub config: &'a AwfulJadeConfig,
    /// Chat template carrying the system prompt for one summary style.
    pub template: &'a ChatTemplate,
}

impl AskAsync for AskFnWrapper<'_> {
    type Response = String;

    #[instrument(level = "info", skip_all)]
    async fn ask(&self, text: &str) -> Result<Self::Response, Box<dyn Error>> {
        let t0 = Instant::now();
        let res = ask(self.config, text.to_string(), self.template, None, None).await;
        if let Err(e) = &res {
            warn!(elapsed_ms = t0.elapsed().as_millis(), error = %e, "API call failed");
        }
        res
    }
}

/// Serialize up to `limit` items into the text block sent to the model.
///
/// One entry per item, in feed order: `- [source] title`, followed by an
/// indented second line with the start of the description when there is one.
pub fn build_news_text(items: &[NewsItem], limit: usize) -> String {
    items
        .iter()
        .take(limit)
        .map(|item| {
            let mut entry = format!("- [{}] {}", item.source, item.title);
            if !item.description.is_empty() {
                entry.push_str("\n  ");
                entry.push_str(&truncate_chars(&item.description, DESCRIPTION_SNIPPET_CHARS));
            }
            entry
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Ask for the quick summary and the deep dive over the same feed.
///
/// A failed half is logged and left empty. An empty feed produces an empty
/// summary without calling the model.
#[instrument(level = "info", skip_all, fields(items = items.len(), limit))]
pub async fn summarize<Q, D>(
    quick: &Q,
    deep: &D,
    items: &[NewsItem],
    limit: usize,
    local_date: &str,
) -> Summary
where
    Q: AskAsync<Response = String>,
    D: AskAsync<Response = String>,
{
    if items.is_empty() {
        info!("Empty feed; skipping summarization");
        return Summary::default();
    }
    let prompt = format!(
        "Reporting date: {local_date}\n\n{}",
        build_news_text(items, limit)
    );
    debug!(prompt = %truncate_for_log(&prompt, 300), "Built summary prompt");

    let quick = answer_or_empty(quick.ask(&prompt).await, "quick");
    let deep = answer_or_empty(deep.ask(&prompt).await, "deep");
    Summary { quick, deep }
}

fn answer_or_empty(res: Result<String, Box<dyn Error>>, part: &str) -> String {
    match res {
        Ok(text) => {
            info!(part, chars = text.chars().count(), "Summary part generated");
            text.trim().to_string()
        }
        Err(e) => {
            warn!(part, error = %e, "Summary part failed; leaving it empty");
            String::new()
        }
    }
}

/// Wrap one `awful_aj` template in the standard retry policy.
pub fn with_backoff<'a>(
    config: &'a AwfulJadeConfig,
    template: &'a ChatTemplate,
) -> RetryAsk<AskFnWrapper<'a>> {
    RetryAsk::new(AskFnWrapper { config, template }, 5, StdDuration::from_secs(1))
}
