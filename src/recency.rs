//! Recency cutoff and timestamp normalization.
//!
//! Every adapter turns whatever date representation its source uses into a
//! `YYYY-MM-DDTHH:MM:SSZ` string (or an empty string when nothing usable is
//! present) and then asks [`RunClock::accepts`] whether the record is recent
//! enough to keep.
//!
//! The cutoff is "yesterday" in a fixed reporting timezone, UTC+9 by default.
//! Since ISO-8601 UTC strings sort lexicographically in date order, the
//! comparison in [`is_recent`] is a plain string comparison on the date part.

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveDateTime, Offset, Utc};
use once_cell::sync::Lazy;
use regex::Regex;

/// Output format of every normalized timestamp.
pub const ISO_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Default reporting timezone offset (KST).
pub const DEFAULT_REPORTING_OFFSET_HOURS: i32 = 9;

static RELATIVE_AGE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)(\d+)\s*(seconds|second|secs|sec|minutes|minute|mins|min|hours|hour|hrs|hr|days|day)",
    )
    .expect("relative age pattern")
});

/// The instant an aggregation run started, plus the derived recency cutoff.
///
/// Adapters never read the system clock themselves; they receive a `RunClock`
/// so that relative timestamps and the cutoff agree across one run and tests
/// can pin time.
#[derive(Debug, Clone)]
pub struct RunClock {
    now: DateTime<Utc>,
    offset: FixedOffset,
    cutoff: String,
}

impl RunClock {
    /// Pin the clock at `now`, reporting in UTC+`offset_hours`.
    ///
    /// Offsets outside ±23 hours fall back to UTC.
    pub fn at(now: DateTime<Utc>, offset_hours: i32) -> Self {
        let offset = offset_hours
            .checked_mul(3600)
            .and_then(FixedOffset::east_opt)
            .unwrap_or_else(|| Utc.fix());
        let yesterday = now.with_timezone(&offset).date_naive() - Duration::days(1);
        Self {
            now,
            offset,
            cutoff: yesterday.format("%Y-%m-%d").to_string(),
        }
    }

    /// Clock for a live run.
    pub fn start(offset_hours: i32) -> Self {
        Self::at(Utc::now(), offset_hours)
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.now
    }

    /// Yesterday's date in the reporting timezone, `YYYY-MM-DD`.
    pub fn cutoff(&self) -> &str {
        &self.cutoff
    }

    /// Today's date in the reporting timezone, `YYYY-MM-DD`.
    pub fn local_date(&self) -> String {
        self.now
            .with_timezone(&self.offset)
            .format("%Y-%m-%d")
            .to_string()
    }

    /// Recency predicate used by every adapter before emitting a record.
    pub fn accepts(&self, published_at: &str) -> bool {
        is_recent(published_at, &self.cutoff)
    }

    /// Render an ISO UTC timestamp as `MM/DD HH:MM` in the reporting timezone.
    ///
    /// Empty input renders as empty; unparseable input as its first 16 chars.
    pub fn display(&self, published_at: &str) -> String {
        if published_at.is_empty() {
            return String::new();
        }
        match DateTime::parse_from_rfc3339(published_at) {
            Ok(dt) => dt.with_timezone(&self.offset).format("%m/%d %H:%M").to_string(),
            Err(_) => published_at.chars().take(16).collect(),
        }
    }
}

/// `true` when `published_at` is unknown (empty) or its date part is on or
/// after `cutoff` (`YYYY-MM-DD`).
pub fn is_recent(published_at: &str, cutoff: &str) -> bool {
    if published_at.is_empty() {
        return true;
    }
    let date = published_at.get(..10).unwrap_or(published_at);
    date >= cutoff
}

pub fn to_iso(dt: DateTime<Utc>) -> String {
    dt.format(ISO_FORMAT).to_string()
}

/// Convert Unix epoch seconds to an ISO UTC string.
pub fn from_epoch_seconds(secs: i64) -> Option<String> {
    DateTime::from_timestamp(secs, 0).map(to_iso)
}

/// Normalize a source-provided date string to `YYYY-MM-DDTHH:MM:SSZ`.
///
/// Accepts RFC 3339, RFC 2822 (RSS `pubDate`), offset date-times without a
/// colon, naive date-times (taken as UTC), bare dates (midnight UTC) and
/// epoch seconds or milliseconds. Anything else yields an empty string.
pub fn normalize_timestamp(raw: &str) -> String {
    let raw = raw.trim();
    if raw.is_empty() {
        return String::new();
    }

    if raw.bytes().all(|b| b.is_ascii_digit()) {
        let parsed = match raw.len() {
            10 => raw.parse::<i64>().ok().and_then(from_epoch_seconds),
            13 => raw
                .parse::<i64>()
                .ok()
                .and_then(DateTime::from_timestamp_millis)
                .map(to_iso),
            _ => None,
        };
        return parsed.unwrap_or_default();
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return to_iso(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(raw) {
        return to_iso(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f%z", "%Y-%m-%d %H:%M:%S%.f%z"] {
        if let Ok(dt) = DateTime::parse_from_str(raw, fmt) {
            return to_iso(dt.with_timezone(&Utc));
        }
    }
    for fmt in [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M",
    ] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
            return to_iso(naive.and_utc());
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        if let Some(midnight) = date.and_hms_opt(0, 0, 0) {
            return to_iso(midnight.and_utc());
        }
    }
    String::new()
}

/// Resolve relative-age text such as `"5 hours ago"` or `"12 mins"` against `now`.
///
/// Returns the first age found in `text`, or `None` when there is none.
pub fn parse_relative_age(text: &str, now: DateTime<Utc>) -> Option<String> {
    let caps = RELATIVE_AGE.captures(text)?;
    let value: i64 = caps.get(1)?.as_str().parse().ok()?;
    let unit = caps.get(2)?.as_str().to_ascii_lowercase();
    let delta = if unit.starts_with("sec") {
        Duration::try_seconds(value)?
    } else if unit.starts_with("min") {
        Duration::try_minutes(value)?
    } else if unit.starts_with('h') {
        Duration::try_hours(value)?
    } else {
        Duration::try_days(value)?
    };
    now.checked_sub_signed(delta).map(to_iso)
}
