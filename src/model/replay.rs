use itertools::Itertools;
use serde::Serialize;
use tracing::{info, warn};

use crate::{
    model::{
        constants::RatingConstants,
        error::RatingError,
        match_recorder::{MatchRecorder, MatchRequest},
        rating_tracker::RatingTracker,
        structures::{match_record::MatchRecord, player_rating::PlayerRatingState}
    },
    utils::progress_utils::progress_bar
};

/// A player whose stored rating does not match the replayed history
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingMismatch {
    pub player_id: String,
    pub stored_rating: i32,
    pub replayed_rating: i32
}

/// Rebuilds every player's state from scratch by replaying `matches` in
/// chronological order, starting everyone at `starting_rating`.
///
/// Played matches are recomputed from the replayed ratings. Decay and bonus
/// events depended on a population snapshot at the time they ran, so their
/// recorded delta is applied as is.
pub fn replay_matches(
    player_ids: impl IntoIterator<Item = String>,
    matches: &[MatchRecord],
    constants: &RatingConstants
) -> Result<RatingTracker, RatingError> {
    let mut tracker = RatingTracker::from_players(
        player_ids
            .into_iter()
            .map(|id| PlayerRatingState::new(id, constants.starting_rating))
    );
    let recorder = MatchRecorder::new(*constants);

    let bar = progress_bar(matches.len() as u64, "Replaying matches".to_string());
    // Stable sort: matches sharing a timestamp keep their stored order
    for record in matches.iter().sorted_by_key(|m| m.timestamp) {
        if record.winner.is_system_event() {
            let current = tracker
                .get_rating(&record.player_a_id)
                .ok_or_else(|| RatingError::NotFound(record.player_a_id.clone()))?
                .current_rating;
            let delta = record.rating_a_after - record.rating_a_before;

            tracker.apply_adjustment(&record.player_a_id, current + delta, &record.id, record.timestamp)?;
        } else {
            let request = MatchRequest::new(
                record.player_a_id.clone(),
                record.player_b_id.clone(),
                record.winner.to_string()
            );
            let outcome = recorder.record(&request, &tracker)?;

            tracker.apply_match(&outcome, &record.id, record.timestamp)?;
        }

        bar.inc(1);
    }
    bar.finish_and_clear();

    info!("Replayed {} matches for {} players", matches.len(), tracker.len());
    Ok(tracker)
}

/// Compares stored player states against a replay.
/// Players missing from the replay are reported against `starting_rating`.
pub fn verify(stored: &[PlayerRatingState], replayed: &RatingTracker, constants: &RatingConstants) -> Vec<RatingMismatch> {
    let mismatches: Vec<RatingMismatch> = stored
        .iter()
        .filter_map(|player| {
            let replayed_rating = replayed
                .get_rating(&player.id)
                .map(|r| r.current_rating)
                .unwrap_or(constants.starting_rating);

            (replayed_rating != player.current_rating).then(|| RatingMismatch {
                player_id: player.id.clone(),
                stored_rating: player.current_rating,
                replayed_rating
            })
        })
        .collect();

    for m in &mismatches {
        warn!(
            "Player {} has rating {} but history replays to {}",
            m.player_id, m.stored_rating, m.replayed_rating
        );
    }

    mismatches
}
