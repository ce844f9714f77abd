use crate::model::{
    constants::{RatingConstants, ELO_SCALE},
    error::RatingError,
    structures::{processing::MatchDeltas, winner::Winner}
};

/// Probability-weighted share of the points `rating_self` is expected to take
/// from a game against `rating_opponent`. Always in (0, 1).
pub fn expected_score(rating_self: i32, rating_opponent: i32) -> f64 {
    let exponent = (rating_opponent - rating_self) as f64 / ELO_SCALE;

    1.0 / (1.0 + 10f64.powf(exponent))
}

/// New rating after a single game. Rounding is applied once, to the final value.
///
/// `actual_score` is 1 for a win, 0.5 for a draw and 0 for a loss.
pub fn update_rating(current_rating: i32, opponent_rating: i32, actual_score: f64, constants: &RatingConstants) -> i32 {
    let expected = expected_score(current_rating, opponent_rating);
    let new_rating = current_rating as f64 + constants.k_factor * (actual_score - expected);

    new_rating.round() as i32
}

/// Computes both sides of a match. Each side is rated against the other's
/// pre-match rating.
pub fn match_outcome(
    rating_a: i32,
    rating_b: i32,
    winner: Winner,
    constants: &RatingConstants
) -> Result<MatchDeltas, RatingError> {
    let (score_a, score_b) = winner
        .actual_scores()
        .ok_or_else(|| RatingError::InvalidInput(format!("{} is not a match result", winner)))?;

    let rating_a_after = update_rating(rating_a, rating_b, score_a, constants);
    let rating_b_after = update_rating(rating_b, rating_a, score_b, constants);

    Ok(MatchDeltas {
        rating_a_after,
        rating_b_after,
        delta_a: rating_a_after - rating_a,
        delta_b: rating_b_after - rating_b
    })
}
