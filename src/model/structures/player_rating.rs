use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerRatingState {
    pub id: String,
    pub current_rating: i32,
    pub matches_played: u32,
    pub wins: u32,
    pub losses: u32,
    pub draws: u32,
    /// `None` until the first match is recorded
    pub last_active_at: Option<DateTime<Utc>>
}

impl PlayerRatingState {
    pub fn new(id: impl Into<String>, starting_rating: i32) -> PlayerRatingState {
        PlayerRatingState {
            id: id.into(),
            current_rating: starting_rating,
            matches_played: 0,
            wins: 0,
            losses: 0,
            draws: 0,
            last_active_at: None
        }
    }

    /// `wins + losses + draws == matches_played`
    pub fn counters_consistent(&self) -> bool {
        self.wins + self.losses + self.draws == self.matches_played
    }
}
