//! Text normalization and string helpers.
//!
//! This module provides the normalizer applied to every record at
//! construction time, plus small string utilities:
//! - [`clean_title`]: whitespace collapsing
//! - [`clean_html`]: markup stripping for titles and descriptions
//! - [`truncate_chars`]: character-safe truncation
//! - [`truncate_for_log`]: shortening long payloads in log lines
//! - [`ensure_writable_dir`]: output directory pre-flight check

use scraper::Html;
use std::error::Error;
use tokio::fs;
use tracing::{info, instrument};

/// Collapse every whitespace run to a single space and trim both ends.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(clean_title("  Fed\n\tholds  rates "), "Fed holds rates");
/// ```
pub fn clean_title(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Strip markup tags, decode entities and collapse whitespace.
///
/// Text nodes are joined with a space so adjacent block elements do not run
/// together. Entity-encoded markup (`&lt;b&gt;`) decodes into tags on the
/// first pass, so passes repeat until the output stops changing. A pass
/// never lengthens its input, and one that only normalizes whitespace is
/// already a fixpoint, so the loop ends.
///
/// Empty input yields empty output.
pub fn clean_html(s: &str) -> String {
    let mut current = strip_markup_once(s);
    loop {
        let next = strip_markup_once(&current);
        if next == current {
            return current;
        }
        current = next;
    }
}

fn strip_markup_once(s: &str) -> String {
    if s.trim().is_empty() {
        return String::new();
    }
    let fragment = Html::parse_fragment(s);
    let text = fragment.root_element().text().collect::<Vec<_>>().join(" ");
    clean_title(&text)
}

/// Keep at most `max` characters of `s`.
pub fn truncate_chars(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => s[..idx].to_string(),
        None => s.to_string(),
    }
}

/// Truncate a string for logging purposes.
///
/// Long strings are cut at `max` bytes (moved back to a character boundary)
/// with an ellipsis and the number of dropped bytes appended.
pub fn truncate_for_log(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let mut cut = max;
    while !s.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}…(+{} bytes)", &s[..cut], s.len() - cut)
}

/// Create `path` if needed and verify a file can be written inside it.
#[instrument(level = "info", skip_all, fields(path = %path))]
pub async fn ensure_writable_dir(path: &str) -> Result<(), Box<dyn Error>> {
    fs::create_dir_all(path).await?;
    let check_path = format!("{}/..__write_check__", path.trim_end_matches('/'));
    fs::write(&check_path, b"").await?;
    let _ = fs::remove_file(&check_path).await;
    info!("Output directory is writable");
    Ok(())
}
