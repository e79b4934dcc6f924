//! Normalize, deduplicate and order the combined output of all adapters.
//!
//! The stages run in this order on one in-memory batch:
//!
//! 1. [`NewsItem::normalized`] on every record, dropping any without a title
//! 2. [`dedup`] by title [`fingerprint`], first occurrence wins
//! 3. [`sort_by_recency`], newest first, stable on ties
//!
//! [`normalize_and_merge`] chains the three. [`filter_feed`] is the search
//! applied to a finished feed by the presentation layer.

use crate::models::NewsItem;
use itertools::Itertools;

/// Number of characters of the folded title used as the dedup key.
pub const FINGERPRINT_LEN: usize = 60;

/// Lowercase `title`, drop everything outside `[a-z0-9]`, keep the first
/// [`FINGERPRINT_LEN`] characters.
pub fn fingerprint(title: &str) -> String {
    title
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .take(FINGERPRINT_LEN)
        .collect()
}

/// Keep the first item for each fingerprint, preserving input order.
///
/// Items whose titles have no ASCII letters or digits all share the empty
/// fingerprint and collapse to one.
pub fn dedup(items: Vec<NewsItem>) -> Vec<NewsItem> {
    items
        .into_iter()
        .unique_by(|item| fingerprint(&item.title))
        .collect()
}

/// Order by `published_at` descending. Empty timestamps sort last; equal
/// timestamps keep their relative order.
pub fn sort_by_recency(items: &mut [NewsItem]) {
    items.sort_by(|a, b| b.published_at.cmp(&a.published_at));
}

/// Combine adapter batches (in invocation order) into one clean feed.
pub fn normalize_and_merge(batches: Vec<Vec<NewsItem>>) -> Vec<NewsItem> {
    let combined: Vec<NewsItem> = batches
        .into_iter()
        .flatten()
        .map(NewsItem::normalized)
        .filter(|item| !item.title.is_empty())
        .collect();
    let mut feed = dedup(combined);
    sort_by_recency(&mut feed);
    feed
}

/// Items whose title or description contains `query` (case-insensitive) and
/// whose source label equals `source`. `None` disables either filter.
pub fn filter_feed<'a>(
    items: &'a [NewsItem],
    query: Option<&str>,
    source: Option<&str>,
) -> Vec<&'a NewsItem> {
    let query = query
        .map(|q| q.trim().to_lowercase())
        .filter(|q| !q.is_empty());
    items
        .iter()
        .filter(|item| match &query {
            Some(q) => {
                item.title.to_lowercase().contains(q.as_str())
                    || item.description.to_lowercase().contains(q.as_str())
            }
            None => true,
        })
        .filter(|item| source.is_none_or(|s| item.source == s))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(title: &str, source: &str, published_at: &str) -> NewsItem {
        NewsItem::new(title, "", source, published_at, "")
    }

    #[test]
    fn test_fingerprint_folds_case_and_punctuation() {
        assert_eq!(fingerprint("Fed Raises Rates!"), "fedraisesrates");
        assert_eq!(fingerprint("fed raises rates"), fingerprint("FED: Raises -- Rates."));
        assert_eq!(fingerprint(&"a".repeat(100)).chars().count(), FINGERPRINT_LEN);
        assert_eq!(fingerprint("!!!"), "");
    }

    #[test]
    fn test_fingerprint_ignores_non_ascii_letters() {
        assert_eq!(fingerprint("Café rallies"), fingerprint("Caf rallies"));
        assert_eq!(fingerprint("Bitcoin – 비트코인 rallies"), fingerprint("Bitcoin rallies"));
        assert_eq!(fingerprint("비트코인"), "");
    }

    #[test]
    fn test_dedup_first_occurrence_wins() {
        let items = vec![
            item("Fed Raises Rates", "Finnhub", "2024-01-02T01:00:00Z"),
            item("Oil slips", "CNBC", "2024-01-02T02:00:00Z"),
            item("FED raises rates.", "CNBC", "2024-01-02T03:00:00Z"),
        ];
        let out = dedup(items);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].source, "Finnhub");
        assert_eq!(out[1].title, "Oil slips");
    }

    #[test]
    fn test_dedup_is_idempotent() {
        let items = vec![
            item("A story about markets", "x", ""),
            item("a story about markets!", "y", ""),
            item("Another one", "z", ""),
            item("", "w", ""),
            item("", "v", ""),
        ];
        let once = dedup(items);
        assert_eq!(once.len(), 3);
        let twice = dedup(once.clone());
        assert_eq!(twice, once);
    }

    #[test]
    fn test_dedup_long_titles_share_prefix_key() {
        let base = "Bitcoin climbs as spot ETF inflows accelerate into the weekend session";
        let items = vec![
            item(&format!("{base} (updated)"), "a", ""),
            item(&format!("{base} - analysts react"), "b", ""),
        ];
        assert_eq!(dedup(items).len(), 1);
    }

    #[test]
    fn test_sort_is_descending_and_stable() {
        let mut items = vec![
            item("no date one", "a", ""),
            item("older", "a", "2024-01-01T00:00:00Z"),
            item("tie first", "a", "2024-01-02T00:00:00Z"),
            item("no date two", "b", ""),
            item("tie second", "b", "2024-01-02T00:00:00Z"),
            item("newest", "c", "2024-01-03T00:00:00Z"),
        ];
        sort_by_recency(&mut items);
        let titles: Vec<&str> = items.iter().map(|i| i.title.as_str()).collect();
        assert_eq!(
            titles,
            vec!["newest", "tie first", "tie second", "older", "no date one", "no date two"]
        );
        assert!(items
            .windows(2)
            .all(|w| w[0].published_at >= w[1].published_at));
    }

    #[test]
    fn test_normalize_and_merge_cross_source_duplicate() {
        let first = vec![item("Fed Raises Rates", "Finnhub", "2024-01-02T01:00:00Z")];
        let second = vec![
            item("fed raises rates!", "Yahoo Finance", "2024-01-02T05:00:00Z"),
            item("Treasury yields climb", "Yahoo Finance", "2024-01-02T04:00:00Z"),
        ];
        let feed = normalize_and_merge(vec![first, second]);
        assert_eq!(feed.len(), 2);
        assert_eq!(feed[0].title, "Treasury yields climb");
        assert_eq!(feed[1].source, "Finnhub");
    }

    #[test]
    fn test_normalize_and_merge_drops_titleless_records() {
        let raw = NewsItem {
            title: "  \n ".to_string(),
            url: String::new(),
            source: "x".to_string(),
            published_at: String::new(),
            description: String::new(),
        };
        let feed = normalize_and_merge(vec![vec![raw, item("Real headline", "x", "")]]);
        assert_eq!(feed.len(), 1);
        assert_eq!(feed[0].title, "Real headline");
    }

    #[test]
    fn test_normalize_and_merge_empty() {
        assert!(normalize_and_merge(vec![]).is_empty());
        assert!(normalize_and_merge(vec![vec![], vec![]]).is_empty());
    }

    #[test]
    fn test_filter_feed() {
        let items = vec![
            NewsItem::new("NVDA jumps", "", "CNBC", "", "chip rally"),
            NewsItem::new("Oil slips", "", "Reuters", "", "OPEC output"),
            NewsItem::new("Chip stocks cool", "", "Reuters", "", ""),
        ];
        assert_eq!(filter_feed(&items, None, None).len(), 3);
        assert_eq!(filter_feed(&items, Some("CHIP"), None).len(), 2);
        assert_eq!(filter_feed(&items, Some("chip"), Some("Reuters")).len(), 1);
        assert_eq!(filter_feed(&items, Some("  "), Some("CNBC")).len(), 1);
        assert!(filter_feed(&items, Some("bitcoin"), None).is_empty());
    }
}
