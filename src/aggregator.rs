//! Runs a lineup of sources and merges their batches into one report.
//!
//! All sources of a lineup are fetched concurrently, but their batches are
//! collected in lineup order so the dedup tie-break (first occurrence wins)
//! does not depend on network timing.

use crate::models::{AggregationReport, NewsItem, SourceStats};
use crate::pipeline::normalize_and_merge;
use crate::recency::to_iso;
use crate::sources::{FetchContext, NewsSource};
use futures::stream::{self, StreamExt};
use std::time::Instant;
use tracing::{info, instrument, warn};

#[derive(Debug, Clone)]
pub struct Aggregator {
    ctx: FetchContext,
}

impl Aggregator {
    pub fn new(ctx: FetchContext) -> Self {
        Self { ctx }
    }

    /// Fetch every source and produce the deduplicated, newest-first feed.
    ///
    /// A source that fails contributes nothing and is recorded with a count
    /// of zero; it never affects the other sources.
    #[instrument(level = "info", skip_all, fields(sources = sources.len()))]
    pub async fn run(&self, sources: &[Box<dyn NewsSource>]) -> AggregationReport {
        let t0 = Instant::now();
        let ctx = &self.ctx;

        let batches: Vec<(&str, Vec<NewsItem>)> = stream::iter(sources)
            .map(|source| async move {
                let name = source.name();
                let started = Instant::now();
                let items = match source.fetch(ctx).await {
                    Ok(items) => items,
                    Err(e) => {
                        warn!(source = name, error = %e, "Source failed; counting as empty");
                        Vec::new()
                    }
                };
                info!(
                    source = name,
                    count = items.len(),
                    elapsed_ms = started.elapsed().as_millis(),
                    "Source finished"
                );
                (name, items)
            })
            .buffered(sources.len().max(1))
            .collect()
            .await;

        let mut source_stats = SourceStats::default();
        let mut combined = Vec::with_capacity(batches.len());
        for (name, items) in batches {
            source_stats.record(name, items.len());
            combined.push(items);
        }

        if !source_stats.is_empty() && source_stats.total() == 0 {
            warn!("Every source came back empty");
        }
        let items = normalize_and_merge(combined);
        info!(
            sources = source_stats.len(),
            fetched = source_stats.total(),
            merged = items.len(),
            elapsed_ms = t0.elapsed().as_millis(),
            "Aggregation complete"
        );

        AggregationReport {
            generated_at: to_iso(ctx.clock.now()),
            cutoff: ctx.clock.cutoff().to_string(),
            items,
            source_stats,
        }
    }
}
