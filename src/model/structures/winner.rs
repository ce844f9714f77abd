use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter, EnumString};

/// Outcome token stored on every [`MatchRecord`](super::match_record::MatchRecord).
///
/// `A`, `B` and `Draw` come from submitted matches. `Decay` and `ActivityBonus`
/// are written by the decay run against the system sentinel opponent.
#[derive(
    Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, EnumString, Display
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum Winner {
    A,
    B,
    Draw,
    Decay,
    ActivityBonus
}

impl Winner {
    /// Actual scores for (A, B), or `None` for system events.
    pub fn actual_scores(self) -> Option<(f64, f64)> {
        match self {
            Winner::A => Some((1.0, 0.0)),
            Winner::B => Some((0.0, 1.0)),
            Winner::Draw => Some((0.5, 0.5)),
            Winner::Decay | Winner::ActivityBonus => None
        }
    }

    pub fn is_system_event(self) -> bool {
        matches!(self, Winner::Decay | Winner::ActivityBonus)
    }
}
