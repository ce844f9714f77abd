use crate::model::structures::{match_record::MatchRecord, player_rating::PlayerRatingState, winner::Winner};
use chrono::{DateTime, Duration, Utc};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

pub fn generate_player_state(id: &str, rating: i32, last_active_at: Option<DateTime<Utc>>) -> PlayerRatingState {
    PlayerRatingState {
        last_active_at,
        ..PlayerRatingState::new(id, rating)
    }
}

/// A player last active `days` days before `now`
pub fn generate_inactive_player(id: &str, rating: i32, now: DateTime<Utc>, days: i64) -> PlayerRatingState {
    generate_player_state(id, rating, Some(now - Duration::days(days)))
}

/// Generates a reproducible population around `now`.
///
/// Ratings fall in [900, 1800). Roughly one player in ten has never played;
/// the rest were last active between 0 and 120 days ago.
pub fn generate_population(n: usize, now: DateTime<Utc>) -> Vec<PlayerRatingState> {
    // Initialize seeded RNG for reproducible results
    let mut rng = ChaCha8Rng::seed_from_u64(42);

    (0..n)
        .map(|i| {
            let rating = rng.random_range(900..1800);
            let last_active_at = if rng.random_range(0..10) == 0 {
                None
            } else {
                Some(now - Duration::hours(rng.random_range(0..120 * 24)))
            };

            generate_player_state(&format!("player-{}", i), rating, last_active_at)
        })
        .collect()
}

pub fn generate_match_record(
    id: &str,
    player_a_id: &str,
    player_b_id: &str,
    winner: Winner,
    timestamp: DateTime<Utc>
) -> MatchRecord {
    MatchRecord {
        id: id.to_string(),
        player_a_id: player_a_id.to_string(),
        player_b_id: player_b_id.to_string(),
        winner,
        rating_a_before: 0,
        rating_b_before: 0,
        rating_a_after: 0,
        rating_b_after: 0,
        timestamp
    }
}

/// `n` played matches between random distinct pairs, one hour apart from `start`
pub fn generate_matches(n: usize, player_ids: &[String], start: DateTime<Utc>) -> Vec<MatchRecord> {
    if player_ids.len() < 2 {
        panic!("At least two players are required to generate matches");
    }

    let mut rng = ChaCha8Rng::seed_from_u64(42);
    let winners = [Winner::A, Winner::B, Winner::Draw];

    (0..n)
        .map(|i| {
            let a = rng.random_range(0..player_ids.len());
            // Offset from a so the pair is always distinct
            let b = (a + rng.random_range(1..player_ids.len())) % player_ids.len();
            let winner = winners[rng.random_range(0..winners.len())];

            generate_match_record(
                &format!("match-{}", i),
                &player_ids[a],
                &player_ids[b],
                winner,
                start + Duration::hours(i as i64)
            )
        })
        .collect()
}
