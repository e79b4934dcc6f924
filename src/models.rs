//! Data models for aggregated market news.
//!
//! This module defines the core data structures used throughout the application:
//! - [`NewsItem`]: One normalized headline as emitted by a source adapter
//! - [`Desk`]: Which market lineup (equities or crypto) a run targets
//! - [`SourceStats`]: Per-source item counts for one aggregation run
//! - [`AggregationReport`]: The deduplicated, time-ordered feed plus its stats
//! - [`Briefing`]: A report bundled with the optional generated summary

use crate::utils::clean_html;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A single news record in the common shape shared by every source.
///
/// Text fields are normalized on construction: `title` and `description`
/// have markup stripped and whitespace runs collapsed. `published_at` is
/// either a `YYYY-MM-DDTHH:MM:SSZ` string or empty when the source gave no
/// usable timestamp.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct NewsItem {
    /// Headline text.
    pub title: String,
    /// Link to the story, empty when unknown.
    pub url: String,
    /// Human-readable source label (may differ from the adapter name).
    pub source: String,
    /// ISO-8601 UTC timestamp or empty string.
    pub published_at: String,
    /// Plain-text teaser, empty when the source has none.
    pub description: String,
}

impl NewsItem {
    /// Build a normalized item.
    pub fn new(
        title: &str,
        url: &str,
        source: &str,
        published_at: &str,
        description: &str,
    ) -> Self {
        Self {
            title: clean_html(title),
            url: url.trim().to_string(),
            source: source.trim().to_string(),
            published_at: published_at.to_string(),
            description: clean_html(description),
        }
    }

    /// Re-apply text normalization. A no-op on items built with [`NewsItem::new`].
    pub fn normalized(mut self) -> Self {
        self.title = clean_html(&self.title);
        self.description = clean_html(&self.description);
        self
    }
}

/// Market lineup selected for a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Desk {
    /// US equities and macro news.
    Stock,
    /// Crypto-currency news.
    Coin,
}

impl fmt::Display for Desk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Desk::Stock => f.write_str("stock"),
            Desk::Coin => f.write_str("coin"),
        }
    }
}

/// Number of items one source contributed to a run.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct SourceCount {
    pub source: String,
    pub count: usize,
}

/// Per-source counts, kept in adapter invocation order.
///
/// A source that failed or matched nothing is still present with a count of 0.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(transparent)]
pub struct SourceStats(Vec<SourceCount>);

impl SourceStats {
    /// Add `count` items for `source`, creating the entry if needed.
    pub fn record(&mut self, source: &str, count: usize) {
        match self.0.iter_mut().find(|entry| entry.source == source) {
            Some(entry) => entry.count += count,
            None => self.0.push(SourceCount {
                source: source.to_string(),
                count,
            }),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &SourceCount> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Sum of all counts (before cross-source deduplication).
    pub fn total(&self) -> usize {
        self.0.iter().map(|entry| entry.count).sum()
    }
}

/// The output of one aggregation run.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AggregationReport {
    /// ISO-8601 UTC instant the run started.
    pub generated_at: String,
    /// Recency cutoff date (`YYYY-MM-DD`) used by the adapters.
    pub cutoff: String,
    /// Deduplicated feed, newest first.
    pub items: Vec<NewsItem>,
    pub source_stats: SourceStats,
}

/// Generated natural-language summary of a feed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Summary {
    pub quick: String,
    pub deep: String,
}

impl Summary {
    pub fn is_empty(&self) -> bool {
        self.quick.is_empty() && self.deep.is_empty()
    }
}

/// Everything one run produces, as written to the JSON output.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Briefing {
    pub desk: Desk,
    /// Reporting-timezone date of the run (`YYYY-MM-DD`).
    pub local_date: String,
    pub report: AggregationReport,
    pub summary: Option<Summary>,
}
