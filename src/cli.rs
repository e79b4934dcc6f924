//! Command-line interface definitions for Market News Desk.
//!
//! All arguments can be provided via command-line flags; API keys can also
//! come from environment variables.

use crate::models::Desk;
use clap::Parser;

/// Command-line arguments for the Market News Desk application.
///
/// # Examples
///
/// ```sh
/// # Equities lineup, printed to the console
/// market_news_desk --desk stock --finnhub-api-key YOUR_KEY
///
/// # Crypto lineup, filtered, with a JSON briefing
/// market_news_desk --desk coin --search etf -j ./json
///
/// # With LLM summaries
/// market_news_desk --desk stock --summarize --ai-config ~/.config/aj/config.yaml
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Market lineup to aggregate
    #[arg(short, long, value_enum, default_value_t = Desk::Stock)]
    pub desk: Desk,

    /// Optional path to a YAML config file
    #[arg(short, long)]
    pub config: Option<String>,

    /// Write the briefing as JSON under this directory
    #[arg(short, long)]
    pub json_output_dir: Option<String>,

    /// Finnhub API key (enables the Finnhub source)
    #[arg(long, env = "FINNHUB_API_KEY")]
    pub finnhub_api_key: Option<String>,

    /// CryptoPanic API key (enables the CryptoPanic source)
    #[arg(long, env = "CRYPTOPANIC_API_KEY")]
    pub cryptopanic_api_key: Option<String>,

    /// Source to leave out of this run (repeatable, case-insensitive)
    #[arg(long = "skip", value_name = "NAME")]
    pub skip: Vec<String>,

    /// Only list items whose title or description contains this text
    #[arg(short, long)]
    pub search: Option<String>,

    /// Only list items with this source label
    #[arg(long)]
    pub source: Option<String>,

    /// Maximum number of items to print
    #[arg(short, long, default_value_t = 50)]
    pub limit: usize,

    /// Generate quick and deep summaries of the feed with the LLM
    #[arg(long)]
    pub summarize: bool,

    /// Path to the awful_aj config.yaml (defaults to its config directory)
    #[arg(long)]
    pub ai_config: Option<String>,

    /// awful_aj template for the quick summary
    #[arg(long, default_value = "market_quick_summary")]
    pub quick_template: String,

    /// awful_aj template for the deep dive
    #[arg(long, default_value = "market_deep_dive")]
    pub deep_template: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::parse_from(["market_news_desk"]);

        assert_eq!(cli.desk, Desk::Stock);
        assert_eq!(cli.limit, 50);
        assert!(cli.json_output_dir.is_none());
        assert!(cli.skip.is_empty());
        assert!(!cli.summarize);
        assert_eq!(cli.quick_template, "market_quick_summary");
    }

    #[test]
    fn test_cli_parsing() {
        let cli = Cli::parse_from([
            "market_news_desk",
            "--desk",
            "coin",
            "--json-output-dir",
            "./json",
            "--skip",
            "Decrypt",
            "--skip",
            "coincarp.com",
            "--search",
            "etf",
            "--summarize",
        ]);

        assert_eq!(cli.desk, Desk::Coin);
        assert_eq!(cli.json_output_dir.as_deref(), Some("./json"));
        assert_eq!(cli.skip, vec!["Decrypt", "coincarp.com"]);
        assert_eq!(cli.search.as_deref(), Some("etf"));
        assert!(cli.summarize);
    }

    #[test]
    fn test_cli_short_flags() {
        let cli = Cli::parse_from(["market_news_desk", "-d", "coin", "-j", "/tmp/json", "-l", "5"]);

        assert_eq!(cli.desk, Desk::Coin);
        assert_eq!(cli.json_output_dir.as_deref(), Some("/tmp/json"));
        assert_eq!(cli.limit, 5);
    }

    #[test]
    fn test_cli_rejects_unknown_desk() {
        assert!(Cli::try_parse_from(["market_news_desk", "--desk", "bonds"]).is_err());
    }
}
