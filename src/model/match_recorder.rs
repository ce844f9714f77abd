use std::{collections::HashMap, str::FromStr};

use indexmap::IndexMap;
use itertools::Itertools;
use strum::IntoEnumIterator;
use tracing::debug;

use crate::model::{
    constants::RatingConstants,
    error::RatingError,
    rating_utils::match_outcome,
    structures::{
        player_rating::PlayerRatingState,
        processing::{CounterIncrement, MatchOutcome, PlayerUpdate},
        winner::Winner
    }
};

/// Read access to the player states a match is computed against.
pub trait PlayerLookup {
    fn player(&self, id: &str) -> Option<&PlayerRatingState>;
}

impl PlayerLookup for IndexMap<String, PlayerRatingState> {
    fn player(&self, id: &str) -> Option<&PlayerRatingState> {
        self.get(id)
    }
}

impl PlayerLookup for HashMap<String, PlayerRatingState> {
    fn player(&self, id: &str) -> Option<&PlayerRatingState> {
        self.get(id)
    }
}

impl PlayerLookup for [PlayerRatingState] {
    fn player(&self, id: &str) -> Option<&PlayerRatingState> {
        self.iter().find(|p| p.id == id)
    }
}

/// A submitted match, as received from an untrusted caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchRequest {
    pub player_a_id: String,
    pub player_b_id: String,
    pub winner: String
}

impl MatchRequest {
    pub fn new(player_a_id: impl Into<String>, player_b_id: impl Into<String>, winner: impl Into<String>) -> Self {
        MatchRequest {
            player_a_id: player_a_id.into(),
            player_b_id: player_b_id.into(),
            winner: winner.into()
        }
    }

    /// Checks the request shape without touching any player state.
    /// Only `A`, `B` and `DRAW` are accepted as results.
    pub fn validate(&self) -> Result<Winner, RatingError> {
        if self.player_a_id.trim().is_empty() || self.player_b_id.trim().is_empty() {
            return Err(RatingError::Validation(
                "Both player A and player B are required".to_string()
            ));
        }

        if self.player_a_id == self.player_b_id {
            return Err(RatingError::Validation("Players must be different".to_string()));
        }

        match Winner::from_str(&self.winner) {
            Ok(winner) if !winner.is_system_event() => Ok(winner),
            _ => Err(RatingError::Validation(format!(
                "Winner must be one of {}, got {:?}",
                Winner::iter().filter(|w| !w.is_system_event()).join(", "),
                self.winner
            )))
        }
    }
}

/// Computes the effect of one match. This is the only place match ratings
/// are produced; callers persist the returned [`MatchOutcome`] as is.
pub struct MatchRecorder {
    constants: RatingConstants
}

impl MatchRecorder {
    pub fn new(constants: RatingConstants) -> MatchRecorder {
        MatchRecorder { constants }
    }

    pub fn record<L: PlayerLookup + ?Sized>(&self, request: &MatchRequest, players: &L) -> Result<MatchOutcome, RatingError> {
        let winner = request.validate()?;

        let player_a = players
            .player(&request.player_a_id)
            .ok_or_else(|| RatingError::NotFound(request.player_a_id.clone()))?;
        let player_b = players
            .player(&request.player_b_id)
            .ok_or_else(|| RatingError::NotFound(request.player_b_id.clone()))?;

        let deltas = match_outcome(player_a.current_rating, player_b.current_rating, winner, &self.constants)?;
        let (increment_a, increment_b) = counter_increments(winner);

        debug!(
            "Match {} vs {} ({}): {:+} / {:+}",
            player_a.id, player_b.id, winner, deltas.delta_a, deltas.delta_b
        );

        Ok(MatchOutcome {
            winner,
            player_a: PlayerUpdate {
                player_id: player_a.id.clone(),
                rating_before: player_a.current_rating,
                rating_after: deltas.rating_a_after,
                delta: deltas.delta_a,
                increment: increment_a
            },
            player_b: PlayerUpdate {
                player_id: player_b.id.clone(),
                rating_before: player_b.current_rating,
                rating_after: deltas.rating_b_after,
                delta: deltas.delta_b,
                increment: increment_b
            }
        })
    }
}

impl Default for MatchRecorder {
    fn default() -> Self {
        MatchRecorder::new(RatingConstants::default())
    }
}

fn counter_increments(winner: Winner) -> (CounterIncrement, CounterIncrement) {
    match winner {
        Winner::A => (CounterIncrement::WIN, CounterIncrement::LOSS),
        Winner::B => (CounterIncrement::LOSS, CounterIncrement::WIN),
        _ => (CounterIncrement::DRAW, CounterIncrement::DRAW)
    }
}
