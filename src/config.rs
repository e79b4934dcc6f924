//! Optional YAML configuration.
//!
//! Every key has a default, so an empty or partial file is valid:
//!
//! ```yaml
//! request_timeout_secs: 15
//! reporting_utc_offset_hours: 9
//! summary_item_limit: 60
//! disabled_sources: ["MNI Markets"]
//! extra_feeds:
//!   - name: Bitcoin Magazine
//!     urls: ["https://bitcoinmagazine.com/feed"]
//!     desk: coin
//! ```

use crate::recency::DEFAULT_REPORTING_OFFSET_HOURS;
use crate::sources::feed::FeedConfig;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::time::Duration;
use tracing::{info, instrument};

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct AppConfig {
    /// Per-request HTTP timeout.
    pub request_timeout_secs: u64,
    /// Hours east of UTC used for the recency cutoff and display.
    pub reporting_utc_offset_hours: i32,
    /// Maximum number of feed items handed to the summarizer.
    pub summary_item_limit: usize,
    /// Source display names to leave out (case-insensitive).
    pub disabled_sources: Vec<String>,
    /// Additional RSS/Atom feeds appended to a desk's lineup.
    pub extra_feeds: Vec<FeedConfig>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: 15,
            reporting_utc_offset_hours: DEFAULT_REPORTING_OFFSET_HOURS,
            summary_item_limit: 60,
            disabled_sources: Vec::new(),
            extra_feeds: Vec::new(),
        }
    }
}

impl AppConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn from_yaml(yaml: &str) -> Result<Self, serde_yaml::Error> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(yaml)
    }
}

/// Load the configuration at `path`, or the defaults when no path is given.
#[instrument(level = "info")]
pub async fn load(path: Option<&str>) -> Result<AppConfig, Box<dyn Error>> {
    let Some(path) = path else {
        return Ok(AppConfig::default());
    };
    let yaml = tokio::fs::read_to_string(path).await?;
    let config = AppConfig::from_yaml(&yaml)?;
    info!(
        path,
        disabled = config.disabled_sources.len(),
        extra_feeds = config.extra_feeds.len(),
        "Loaded configuration"
    );
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Desk;

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let config = AppConfig::from_yaml("summary_item_limit: 25\n").unwrap();
        assert_eq!(config.summary_item_limit, 25);
        assert_eq!(config.request_timeout(), Duration::from_secs(15));
        assert_eq!(config.reporting_utc_offset_hours, 9);
        assert!(config.extra_feeds.is_empty());
    }

    #[test]
    fn test_empty_yaml_is_default() {
        assert_eq!(AppConfig::from_yaml("").unwrap(), AppConfig::default());
    }

    #[test]
    fn test_full_yaml() {
        let yaml = r#"
request_timeout_secs: 5
reporting_utc_offset_hours: 0
disabled_sources: ["MNI Markets", "cnbc"]
extra_feeds:
  - name: Bitcoin Magazine
    urls: ["https://bitcoinmagazine.com/feed"]
    desk: coin
"#;
        let config = AppConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.request_timeout_secs, 5);
        assert_eq!(config.reporting_utc_offset_hours, 0);
        assert_eq!(config.disabled_sources, vec!["MNI Markets", "cnbc"]);
        assert_eq!(config.extra_feeds.len(), 1);
        assert_eq!(config.extra_feeds[0].desk, Desk::Coin);
    }

    #[test]
    fn test_unknown_desk_is_rejected() {
        let yaml = "extra_feeds:\n  - name: X\n    urls: []\n    desk: bonds\n";
        assert!(AppConfig::from_yaml(yaml).is_err());
    }

    #[tokio::test]
    async fn test_load_without_path() {
        assert_eq!(load(None).await.unwrap(), AppConfig::default());
    }

    #[tokio::test]
    async fn test_load_missing_file() {
        assert!(load(Some("/nonexistent/market_news_desk.yaml")).await.is_err());
    }
}
