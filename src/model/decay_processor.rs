use chrono::{DateTime, Utc};
use rayon::prelude::*;
use tracing::{debug, info};

use crate::model::{
    constants::RatingConstants,
    decay::{calculate_decay, decay_floor, is_active},
    structures::{
        player_rating::PlayerRatingState,
        processing::{DecayCycle, RatingDelta},
        rating_adjustment_type::RatingAdjustmentType
    }
};

/// Runs decay and the activity bonus over a whole population.
///
/// The floor and the bonus are population-wide aggregates, so a run is two
/// passes over one snapshot: aggregate first, then distribute. Nothing here
/// writes anything; the returned [`DecayCycle`] is handed to the caller to persist.
pub struct DecayProcessor {
    constants: RatingConstants
}

impl DecayProcessor {
    pub fn new(constants: RatingConstants) -> DecayProcessor {
        DecayProcessor { constants }
    }

    pub fn constants(&self) -> &RatingConstants {
        &self.constants
    }

    /// # Steps
    /// 1. The floor is the lower of the hard minimum and the lowest rating present.
    /// 2. Active players are those who played less than the threshold ago.
    /// 3. With no active players the run is a no-op: decayed points would have
    ///     nowhere to go.
    /// 4. Every player is run through [`calculate_decay`] against the floor.
    /// 5. The total decay is split evenly (integer division) between active
    ///     players, capped at `max_weekly_bonus`. The remainder is dropped.
    pub fn process(&self, players: &[PlayerRatingState], now: DateTime<Utc>, simulate: bool) -> DecayCycle {
        let floor = decay_floor(players.iter().map(|p| p.current_rating), &self.constants);
        let active: Vec<&PlayerRatingState> = players
            .iter()
            .filter(|p| is_active(p.last_active_at, now, &self.constants))
            .collect();

        let mut cycle = DecayCycle {
            run_at: now,
            floor_used: floor,
            players_processed: players.len(),
            active_players: active.len(),
            decayed_players: Vec::new(),
            bonused_players: Vec::new(),
            total_decay: 0,
            bonus_per_player: 0,
            simulated: simulate
        };

        if active.is_empty() {
            info!(
                "No active players among {} players, decay paused for this run",
                players.len()
            );
            return cycle;
        }

        cycle.decayed_players = players
            .par_iter()
            .filter_map(|p| self.decay_delta(p, now, floor))
            .collect();
        cycle.total_decay = cycle.decayed_players.iter().map(|d| d.amount as i64).sum();
        cycle.bonus_per_player = self.bonus_per_player(cycle.total_decay, active.len());

        let bonus = cycle.bonus_per_player;
        if bonus > 0 {
            cycle.bonused_players = active
                .par_iter()
                .map(|p| RatingDelta {
                    player_id: p.id.clone(),
                    adjustment_type: RatingAdjustmentType::ActivityBonus,
                    old_rating: p.current_rating,
                    new_rating: p.current_rating + bonus,
                    amount: bonus
                })
                .collect();
        }

        info!(
            "Decay run at {}: floor {}, {} decayed for {} points, {} active receive +{} ({} undistributed){}",
            now,
            floor,
            cycle.decayed_players.len(),
            cycle.total_decay,
            cycle.active_players,
            cycle.bonus_per_player,
            cycle.undistributed(),
            if simulate { " [simulated]" } else { "" }
        );

        cycle
    }

    fn decay_delta(&self, player: &PlayerRatingState, now: DateTime<Utc>, floor: i32) -> Option<RatingDelta> {
        let result = calculate_decay(player.current_rating, player.last_active_at, now, floor, &self.constants);

        if !result.should_decay {
            return None;
        }

        debug!(
            "Player {} inactive for {} days: {} -> {}",
            player.id, result.inactive_days, player.current_rating, result.new_rating
        );

        Some(RatingDelta {
            player_id: player.id.clone(),
            adjustment_type: RatingAdjustmentType::Decay,
            old_rating: player.current_rating,
            new_rating: result.new_rating,
            amount: result.decay_amount
        })
    }

    /// `min(max_weekly_bonus, total_decay / active_players)`, or 0 when nothing decayed
    pub fn bonus_per_player(&self, total_decay: i64, active_players: usize) -> i32 {
        if total_decay <= 0 || active_players == 0 {
            return 0;
        }

        let share = total_decay / active_players as i64;

        share.min(self.constants.max_weekly_bonus as i64) as i32
    }
}

impl Default for DecayProcessor {
    fn default() -> Self {
        DecayProcessor::new(RatingConstants::default())
    }
}
