use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::model::structures::{
    player_rating::PlayerRatingState, rating_adjustment_type::RatingAdjustmentType, winner::Winner
};

/// Rating changes for both sides of a single match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchDeltas {
    pub rating_a_after: i32,
    pub rating_b_after: i32,
    pub delta_a: i32,
    pub delta_b: i32
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CounterIncrement {
    pub wins: u32,
    pub losses: u32,
    pub draws: u32
}

impl CounterIncrement {
    pub const WIN: CounterIncrement = CounterIncrement {
        wins: 1,
        losses: 0,
        draws: 0
    };
    pub const LOSS: CounterIncrement = CounterIncrement {
        wins: 0,
        losses: 1,
        draws: 0
    };
    pub const DRAW: CounterIncrement = CounterIncrement {
        wins: 0,
        losses: 0,
        draws: 1
    };
}

/// Before/after state of one participant, plus the counters to bump
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerUpdate {
    pub player_id: String,
    pub rating_before: i32,
    pub rating_after: i32,
    pub delta: i32,
    pub increment: CounterIncrement
}

impl PlayerUpdate {
    /// Writes this update into the player's state. `at` becomes the
    /// player's last activity time.
    pub fn apply_to(&self, state: &mut PlayerRatingState, at: DateTime<Utc>) {
        state.current_rating = self.rating_after;
        state.wins += self.increment.wins;
        state.losses += self.increment.losses;
        state.draws += self.increment.draws;
        state.matches_played += 1;
        state.last_active_at = Some(at);
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchOutcome {
    pub winner: Winner,
    pub player_a: PlayerUpdate,
    pub player_b: PlayerUpdate
}

/// Output of the single player decay calculation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DecayResult {
    pub new_rating: i32,
    pub decay_amount: i32,
    pub should_decay: bool,
    pub inactive_days: i64
}

impl DecayResult {
    pub fn unchanged(rating: i32, inactive_days: i64) -> DecayResult {
        DecayResult {
            new_rating: rating,
            decay_amount: 0,
            should_decay: false,
            inactive_days
        }
    }
}

/// One player write produced by a decay run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingDelta {
    pub player_id: String,
    pub adjustment_type: RatingAdjustmentType,
    pub old_rating: i32,
    pub new_rating: i32,
    /// Always positive: points removed for decay, points added for a bonus
    pub amount: i32
}

/// Everything one decay run decided, computed from a single snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DecayCycle {
    pub run_at: DateTime<Utc>,
    pub floor_used: i32,
    pub players_processed: usize,
    pub active_players: usize,
    pub decayed_players: Vec<RatingDelta>,
    pub bonused_players: Vec<RatingDelta>,
    pub total_decay: i64,
    pub bonus_per_player: i32,
    pub simulated: bool
}

impl DecayCycle {
    pub fn deltas(&self) -> impl Iterator<Item = &RatingDelta> {
        self.decayed_players.iter().chain(self.bonused_players.iter())
    }

    pub fn total_bonus(&self) -> i64 {
        self.bonused_players.iter().map(|d| d.amount as i64).sum()
    }

    /// Decayed points that were not handed back out (division remainder or cap)
    pub fn undistributed(&self) -> i64 {
        self.total_decay - self.total_bonus()
    }

    pub fn is_noop(&self) -> bool {
        self.decayed_players.is_empty() && self.bonused_players.is_empty()
    }
}
