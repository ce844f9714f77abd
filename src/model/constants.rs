// Rating constants
pub const K_FACTOR: f64 = 32.0;
pub const STARTING_RATING: i32 = 1200;
pub const ELO_SCALE: f64 = 400.0;
// Decay constants
pub const INACTIVITY_THRESHOLD_DAYS: i64 = 7;
pub const DECAY_POINTS_PER_PERIOD: i32 = 5;
pub const DECAY_PERIOD_DAYS: i64 = 7;
pub const ABSOLUTE_MINIMUM_RATING: i32 = 1000;
pub const MAX_WEEKLY_BONUS: i32 = 5;
// Persistence
pub const MAX_TRANSACTION_ATTEMPTS: u32 = 5;
pub const SYSTEM_PLAYER_ID: &str = "SYSTEM";
pub const DECAY_MATCH_ID_PREFIX: &str = "DECAY";
pub const ACTIVITY_BONUS_MATCH_ID_PREFIX: &str = "ACTIVITY_BONUS";

/// Every tunable value the engine reads. The engine never reaches for the
/// module constants directly, so tests and the CLI can override any of them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RatingConstants {
    pub k_factor: f64,
    pub starting_rating: i32,
    pub inactivity_threshold_days: i64,
    pub decay_points_per_period: i32,
    pub decay_period_days: i64,
    pub absolute_minimum_rating: i32,
    pub max_weekly_bonus: i32,
    pub max_transaction_attempts: u32
}

impl Default for RatingConstants {
    fn default() -> Self {
        RatingConstants {
            k_factor: K_FACTOR,
            starting_rating: STARTING_RATING,
            inactivity_threshold_days: INACTIVITY_THRESHOLD_DAYS,
            decay_points_per_period: DECAY_POINTS_PER_PERIOD,
            decay_period_days: DECAY_PERIOD_DAYS,
            absolute_minimum_rating: ABSOLUTE_MINIMUM_RATING,
            max_weekly_bonus: MAX_WEEKLY_BONUS,
            max_transaction_attempts: MAX_TRANSACTION_ATTEMPTS
        }
    }
}
