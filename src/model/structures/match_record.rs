use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::structures::winner::Winner;

/// Immutable once written. For decay and activity bonus events the B side
/// is the system sentinel and its ratings are zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchRecord {
    pub id: String,
    pub player_a_id: String,
    pub player_b_id: String,
    pub winner: Winner,
    pub rating_a_before: i32,
    pub rating_b_before: i32,
    pub rating_a_after: i32,
    pub rating_b_after: i32,
    pub timestamp: DateTime<Utc>
}

impl MatchRecord {
    pub fn involves(&self, player_id: &str) -> bool {
        self.player_a_id == player_id || self.player_b_id == player_id
    }
}

/// One point of a player's rating-over-time series. Append only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingHistoryEntry {
    pub player_id: String,
    pub rating: i32,
    pub timestamp: DateTime<Utc>,
    pub match_id: String
}
