use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;
use strum_macros::EnumIter;

use crate::model::{
    constants::{ACTIVITY_BONUS_MATCH_ID_PREFIX, DECAY_MATCH_ID_PREFIX},
    structures::winner::Winner
};

/// The kind of rating change a decay run produces for a single player.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RatingAdjustmentType {
    Decay,
    ActivityBonus
}

impl RatingAdjustmentType {
    pub fn winner(self) -> Winner {
        match self {
            RatingAdjustmentType::Decay => Winner::Decay,
            RatingAdjustmentType::ActivityBonus => Winner::ActivityBonus
        }
    }

    pub fn match_id_prefix(self) -> &'static str {
        match self {
            RatingAdjustmentType::Decay => DECAY_MATCH_ID_PREFIX,
            RatingAdjustmentType::ActivityBonus => ACTIVITY_BONUS_MATCH_ID_PREFIX
        }
    }
}

/// Returns true if the match id was generated for a decay or activity bonus event
pub fn is_system_match_id(match_id: &str) -> bool {
    RatingAdjustmentType::iter().any(|kind| {
        match_id
            .strip_prefix(kind.match_id_prefix())
            .is_some_and(|rest| rest.starts_with('-'))
    })
}
