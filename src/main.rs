//! # Market News Desk
//!
//! Aggregates financial-market headlines (equities or crypto) from JSON APIs,
//! RSS/Atom feeds and scraped listing pages into one deduplicated,
//! newest-first feed, optionally summarized by an LLM.
//!
//! ## Usage
//!
//! ```sh
//! market_news_desk --desk coin -j ./json --summarize
//! ```
//!
//! ## Architecture
//!
//! 1. **Lineup**: Pick the adapters for the selected desk
//! 2. **Fetching**: Run every adapter; each applies the recency cutoff itself
//! 3. **Merging**: Normalize, deduplicate by title fingerprint, sort by time
//! 4. **Output**: Console listing, optional summaries, optional JSON briefing

use awful_aj::{config as aj_config, config_dir, template};
use clap::Parser;
use std::error::Error;
use tracing::{debug, error, info, instrument, warn};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod aggregator;
mod api;
mod cli;
mod config;
mod models;
mod outputs;
mod pipeline;
mod recency;
mod sources;
mod utils;

use aggregator::Aggregator;
use cli::Cli;
use models::{Briefing, NewsItem, SourceStats, Summary};
use outputs::json;
use pipeline::filter_feed;
use recency::RunClock;
use sources::{Credentials, FetchContext, build_client, lineup};
use utils::ensure_writable_dir;

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("market_news_desk starting up");

    let args = Cli::parse();
    debug!(desk = %args.desk, ?args.config, ?args.json_output_dir, "Parsed CLI arguments");

    // Early check: ensure JSON output dir is writable
    if let Some(dir) = args.json_output_dir.as_deref() {
        if let Err(e) = ensure_writable_dir(dir).await {
            error!(
                path = %dir,
                error = %e,
                "JSON output directory is not writable (fix perms or choose a different path)"
            );
            return Err(e);
        }
    }

    let app_config = config::load(args.config.as_deref()).await?;
    let clock = RunClock::start(app_config.reporting_utc_offset_hours);
    info!(cutoff = clock.cutoff(), local_date = %clock.local_date(), "Run clock started");

    // ---- Fetch and merge ----
    let client = build_client(app_config.request_timeout())?;
    let credentials = Credentials {
        finnhub: args.finnhub_api_key.clone(),
        cryptopanic: args.cryptopanic_api_key.clone(),
    };
    let sources = lineup(args.desk, &credentials, &app_config, &args.skip);
    let names: Vec<&str> = sources.iter().map(|s| s.name()).collect();
    info!(desk = %args.desk, sources = %names.join(", "), "Lineup selected");

    let report = Aggregator::new(FetchContext::new(client, clock.clone()))
        .run(&sources)
        .await;

    // ---- Console listing ----
    let shown = filter_feed(&report.items, args.search.as_deref(), args.source.as_deref());
    print_listing(&clock, &shown, args.limit);
    print_stats(&report.source_stats, report.items.len());

    // ---- Summaries ----
    let summary = if args.summarize {
        let summary = summarize_feed(&args, &report.items, app_config.summary_item_limit, &clock).await;
        print_summary(&summary);
        Some(summary)
    } else {
        None
    };

    // ---- JSON output ----
    if let Some(dir) = args.json_output_dir.as_deref() {
        let briefing = Briefing {
            desk: args.desk,
            local_date: clock.local_date(),
            report,
            summary,
        };
        if let Err(e) = json::write_briefing(&briefing, dir).await {
            error!(path = %dir, error = %e, "Failed to write JSON briefing");
            return Err(e);
        }
    }

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        secs = elapsed.as_secs(),
        millis = elapsed.subsec_millis(),
        "Execution complete"
    );
    Ok(())
}

/// Load the awful_aj config and both templates, then ask for the summaries.
///
/// Setup failures are logged and yield an empty summary.
async fn summarize_feed(args: &Cli, items: &[NewsItem], limit: usize, clock: &RunClock) -> Summary {
    let config_path = match &args.ai_config {
        Some(path) => path.clone(),
        None => match config_dir() {
            Ok(dir) => dir.join("config.yaml").to_string_lossy().to_string(),
            Err(e) => {
                warn!(error = %e, "No awful_aj config directory; skipping summaries");
                return Summary::default();
            }
        },
    };
    let ai_config = match aj_config::load_config(&config_path) {
        Ok(config) => config,
        Err(e) => {
            warn!(config_path = %config_path, error = %e, "Failed to load awful_aj config; skipping summaries");
            return Summary::default();
        }
    };
    info!(config_path = %config_path, "Loaded awful_aj configuration");

    let quick_template = match template::load_template(&args.quick_template).await {
        Ok(t) => t,
        Err(e) => {
            warn!(template = %args.quick_template, error = %e, "Failed to load template; skipping summaries");
            return Summary::default();
        }
    };
    let deep_template = match template::load_template(&args.deep_template).await {
        Ok(t) => t,
        Err(e) => {
            warn!(template = %args.deep_template, error = %e, "Failed to load template; skipping summaries");
            return Summary::default();
        }
    };

    let quick = api::with_backoff(&ai_config, &quick_template);
    let deep = api::with_backoff(&ai_config, &deep_template);
    api::summarize(&quick, &deep, items, limit, &clock.local_date()).await
}

fn print_listing(clock: &RunClock, items: &[&NewsItem], limit: usize) {
    println!("Cutoff {} ({} items)", clock.cutoff(), items.len());
    for item in items.iter().take(limit) {
        let when = clock.display(&item.published_at);
        println!("{when:>11}  [{}] {}", item.source, item.title);
        if !item.url.is_empty() {
            println!("{:>11}  {}", "", item.url);
        }
    }
}

fn print_stats(stats: &SourceStats, merged: usize) {
    println!();
    for entry in stats.iter() {
        println!("{:>4}  {}", entry.count, entry.source);
    }
    println!("{:>4}  fetched, {merged} after dedup", stats.total());
}

fn print_summary(summary: &Summary) {
    if summary.is_empty() {
        println!("\n(no summary available)");
        return;
    }
    if !summary.quick.is_empty() {
        println!("\n== Quick summary ==\n{}", summary.quick);
    }
    if !summary.deep.is_empty() {
        println!("\n== Deep dive ==\n{}", summary.deep);
    }
}
