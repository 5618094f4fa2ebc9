use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A watched file as recorded by the source library at the time of the run.
///
/// Only rows with a play count above zero are ever turned into records, so
/// `play_count` is always at least 1.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SourceWatchRecord {
    pub file_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_played: Option<DateTime<Utc>>,
    pub play_count: u32,
}

impl SourceWatchRecord {
    pub fn new(file_path: impl Into<String>, last_played: Option<DateTime<Utc>>, play_count: u32) -> Self {
        Self {
            file_path: file_path.into(),
            last_played,
            play_count,
        }
    }
}
