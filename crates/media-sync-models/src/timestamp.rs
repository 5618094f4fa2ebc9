use chrono::{DateTime, NaiveDateTime, Utc};

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// Parse a last-played value as stored by the source library.
///
/// Naive timestamps are taken as UTC. Values carrying an offset are converted
/// to UTC. Empty or unparseable values yield `None`.
pub fn parse_source_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }

    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
}

/// Render a timestamp the way the target library stores `lastPlayedDate`.
///
/// Sub-second precision is dropped; the `.000Z` marker appears exactly once.
pub fn format_last_played(dt: DateTime<Utc>) -> String {
    format!("{}.000Z", dt.format("%Y-%m-%d %H:%M:%S"))
}
