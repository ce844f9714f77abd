use std::{cmp::Ordering, collections::HashMap};

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use itertools::Itertools;
use serde::Serialize;

use crate::model::{
    error::RatingError,
    match_recorder::PlayerLookup,
    structures::{
        match_record::RatingHistoryEntry,
        player_rating::PlayerRatingState,
        processing::{MatchOutcome, PlayerUpdate}
    }
};

/// A leaderboard row
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerStanding {
    pub rank: u32,
    pub player_id: String,
    pub rating: i32,
    pub matches_played: u32,
    pub wins: u32,
    pub losses: u32,
    pub draws: u32,
    pub win_rate: f64
}

/// In-memory view of every player's current state and rating history.
/// Used to replay stored matches and to build leaderboards.
#[derive(Debug, Clone)]
pub struct RatingTracker {
    // Insertion ordered so replays report players in a stable order
    leaderboard: IndexMap<String, PlayerRatingState>,
    history: HashMap<String, Vec<RatingHistoryEntry>>
}

impl Default for RatingTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl RatingTracker {
    pub fn new() -> RatingTracker {
        RatingTracker {
            leaderboard: IndexMap::new(),
            history: HashMap::new()
        }
    }

    pub fn from_players(players: impl IntoIterator<Item = PlayerRatingState>) -> RatingTracker {
        let mut tracker = RatingTracker::new();
        for player in players {
            tracker.insert(player);
        }

        tracker
    }

    pub fn insert(&mut self, player: PlayerRatingState) {
        self.leaderboard.insert(player.id.clone(), player);
    }

    pub fn get_rating(&self, player_id: &str) -> Option<&PlayerRatingState> {
        self.leaderboard.get(player_id)
    }

    pub fn get_rating_history(&self, player_id: &str) -> Option<&[RatingHistoryEntry]> {
        self.history.get(player_id).map(|h| h.as_slice())
    }

    /// Every history entry across all players, oldest first
    pub fn history_entries(&self) -> Vec<RatingHistoryEntry> {
        self.history
            .values()
            .flatten()
            .sorted_by(|a, b| a.timestamp.cmp(&b.timestamp).then_with(|| a.player_id.cmp(&b.player_id)))
            .cloned()
            .collect()
    }

    pub fn players(&self) -> impl Iterator<Item = &PlayerRatingState> {
        self.leaderboard.values()
    }

    pub fn len(&self) -> usize {
        self.leaderboard.len()
    }

    pub fn is_empty(&self) -> bool {
        self.leaderboard.is_empty()
    }

    /// Applies both sides of a match and appends a history entry for each.
    pub fn apply_match(&mut self, outcome: &MatchOutcome, match_id: &str, at: DateTime<Utc>) -> Result<(), RatingError> {
        for update in [&outcome.player_a, &outcome.player_b] {
            self.apply_update(update, match_id, at)?;
        }

        Ok(())
    }

    fn apply_update(&mut self, update: &PlayerUpdate, match_id: &str, at: DateTime<Utc>) -> Result<(), RatingError> {
        let state = self
            .leaderboard
            .get_mut(&update.player_id)
            .ok_or_else(|| RatingError::NotFound(update.player_id.clone()))?;

        update.apply_to(state, at);
        self.push_history(&update.player_id, update.rating_after, match_id, at);

        Ok(())
    }

    /// Sets a rating without touching counters or activity (decay and bonus events).
    pub fn apply_adjustment(
        &mut self,
        player_id: &str,
        new_rating: i32,
        match_id: &str,
        at: DateTime<Utc>
    ) -> Result<(), RatingError> {
        let state = self
            .leaderboard
            .get_mut(player_id)
            .ok_or_else(|| RatingError::NotFound(player_id.to_string()))?;

        state.current_rating = new_rating;
        self.push_history(player_id, new_rating, match_id, at);

        Ok(())
    }

    fn push_history(&mut self, player_id: &str, rating: i32, match_id: &str, at: DateTime<Utc>) {
        self.history
            .entry(player_id.to_string())
            .or_default()
            .push(RatingHistoryEntry {
                player_id: player_id.to_string(),
                rating,
                timestamp: at,
                match_id: match_id.to_string()
            });
    }

    pub fn standings(&self) -> Vec<PlayerStanding> {
        leaderboard(self.leaderboard.values())
    }

    pub fn into_players(self) -> Vec<PlayerRatingState> {
        self.leaderboard.into_values().collect()
    }
}

impl PlayerLookup for RatingTracker {
    fn player(&self, id: &str) -> Option<&PlayerRatingState> {
        self.get_rating(id)
    }
}

/// Sorts players by rating (highest first, ties by id) and assigns 1-based ranks.
pub fn leaderboard<'a>(players: impl IntoIterator<Item = &'a PlayerRatingState>) -> Vec<PlayerStanding> {
    players
        .into_iter()
        .sorted_by(|x, y| match y.current_rating.cmp(&x.current_rating) {
            Ordering::Equal => x.id.cmp(&y.id),
            other => other
        })
        .enumerate()
        .map(|(i, p)| PlayerStanding {
            rank: i as u32 + 1,
            player_id: p.id.clone(),
            rating: p.current_rating,
            matches_played: p.matches_played,
            wins: p.wins,
            losses: p.losses,
            draws: p.draws,
            win_rate: win_rate(p)
        })
        .collect()
}

/// Draws count as played but not won. 0 for players without matches.
pub fn win_rate(player: &PlayerRatingState) -> f64 {
    if player.matches_played == 0 {
        return 0.0;
    }

    player.wins as f64 / player.matches_played as f64
}

/// Chronological (timestamp, rating) points for one player
pub fn rating_series(history: &[RatingHistoryEntry], player_id: &str) -> Vec<(DateTime<Utc>, i32)> {
    history
        .iter()
        .filter(|h| h.player_id == player_id)
        .sorted_by_key(|h| h.timestamp)
        .map(|h| (h.timestamp, h.rating))
        .collect()
}
