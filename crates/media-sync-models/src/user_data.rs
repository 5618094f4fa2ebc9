use serde::{Deserialize, Serialize};

/// The watch-state fields the sync owns on a target user-data row.
///
/// Every sync of a watched item writes all of these; columns outside this set
/// are left to the target library.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WatchStatePayload {
    pub user_id: i64,
    pub is_favorite: bool,
    pub played: bool,
    pub playback_position_ticks: i64,
    pub play_count: i64,
    /// Already in the target's `YYYY-MM-DD HH:MM:SS.000Z` representation
    pub last_played_date: String,
}

impl WatchStatePayload {
    pub fn watched(user_id: i64, play_count: u32, last_played_date: String) -> Self {
        Self {
            user_id,
            is_favorite: false,
            played: true,
            playback_position_ticks: 0,
            play_count: i64::from(play_count),
            last_played_date,
        }
    }
}

/// A user-data row as currently stored in the target library.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TargetUserData {
    pub key: String,
    pub user_id: i64,
    pub is_favorite: bool,
    pub played: bool,
    pub playback_position_ticks: i64,
    pub play_count: i64,
    pub last_played_date: Option<String>,
}
