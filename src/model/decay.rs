use crate::model::{constants::RatingConstants, structures::processing::DecayResult};
use chrono::{DateTime, Duration, Utc};

/// # How this works
/// - The decay run calls this at some point in time, `now`
/// - The player's last match was played at `last_active_at`
/// - Inactivity is counted in whole days, truncated: 6 days and 23 hours is 6 days
/// - Once the player has been inactive for the threshold (7 days), one period's
///     worth of points is removed, plus one more period's worth for every further
///     complete period (7 days)
///
/// # Rules
/// - Players that have never played do not decay.
/// - Players at or below `floor` do not decay.
/// - Decay never pushes a rating below `floor`, so the applied amount may be
///     smaller than the raw amount near the floor.
pub fn calculate_decay(
    current_rating: i32,
    last_active_at: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
    floor: i32,
    constants: &RatingConstants
) -> DecayResult {
    let Some(last_active_at) = last_active_at else {
        return DecayResult::unchanged(current_rating, 0);
    };

    let inactive_days = inactive_days(last_active_at, now);

    if inactive_days < constants.inactivity_threshold_days || current_rating <= floor {
        return DecayResult::unchanged(current_rating, inactive_days);
    }

    // A non-positive period length counts no further periods
    let inactive_periods = match constants.decay_period_days {
        days if days > 0 => (inactive_days - constants.inactivity_threshold_days) / days,
        _ => 0
    };
    let raw_decay = (inactive_periods + 1) * constants.decay_points_per_period as i64;

    let new_rating = (current_rating as i64 - raw_decay).max(floor as i64) as i32;
    let decay_amount = current_rating - new_rating;

    DecayResult {
        new_rating,
        decay_amount,
        should_decay: decay_amount > 0,
        inactive_days
    }
}

/// Whole days between the last activity and `now`. A timestamp in the future counts as 0.
pub fn inactive_days(last_active_at: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    (now - last_active_at).num_days().max(0)
}

/// Returns true if the player has played within the last {inactivity_threshold_days} days.
///
/// This compares the exact elapsed time, not the truncated day count used by
/// [`calculate_decay`].
pub fn is_active(last_active_at: Option<DateTime<Utc>>, now: DateTime<Utc>, constants: &RatingConstants) -> bool {
    match last_active_at {
        Some(t) => now - t < Duration::days(constants.inactivity_threshold_days),
        None => false
    }
}

/// The lowest rating a decay run may reach: the hard minimum, or the lowest
/// rating currently present if that is lower.
pub fn decay_floor(ratings: impl IntoIterator<Item = i32>, constants: &RatingConstants) -> i32 {
    ratings
        .into_iter()
        .fold(constants.absolute_minimum_rating, |floor, rating| floor.min(rating))
}
