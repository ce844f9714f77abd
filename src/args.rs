use std::path::PathBuf;

use chrono::{DateTime, Utc};
use clap::{Args as ClapArgs, Parser, Subcommand};

use crate::model::constants::RatingConstants;

#[derive(Parser, Clone)]
#[command(
    display_name = "Chess Ladder",
    author = "Chess Ladder",
    long_about = "Records chess matches and maintains zero-sum ladder ratings"
)]
pub struct Args {
    /// Ladder data is kept in a single JSON document.
    /// It is created on the first write if it does not exist.
    #[arg(
        short,
        long,
        env = "LADDER_DATA_FILE",
        default_value = "ladder.json",
        help = "Path to the ladder data file"
    )]
    pub data_file: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[arg(
        short,
        long,
        env = "RUST_LOG",
        default_value = "info",
        value_parser = ["trace", "debug", "info", "warn", "error"],
        help = "Sets the logging verbosity"
    )]
    pub log_level: String,

    #[command(flatten)]
    pub constants: ConstantOverrides,

    #[command(subcommand)]
    pub command: Command
}

/// Every rating constant can be overridden, mostly for experiments.
/// Unset values fall back to the ladder defaults.
#[derive(ClapArgs, Clone, Debug, Default)]
pub struct ConstantOverrides {
    #[arg(long, env = "K_FACTOR", global = true)]
    pub k_factor: Option<f64>,

    #[arg(long, env = "STARTING_RATING", global = true)]
    pub starting_rating: Option<i32>,

    #[arg(long, env = "INACTIVITY_THRESHOLD_DAYS", global = true)]
    pub inactivity_threshold_days: Option<i64>,

    #[arg(long, env = "DECAY_POINTS_PER_PERIOD", global = true)]
    pub decay_points_per_period: Option<i32>,

    #[arg(long, env = "DECAY_PERIOD_DAYS", global = true, value_parser = clap::value_parser!(i64).range(1..))]
    pub decay_period_days: Option<i64>,

    #[arg(long, env = "ABSOLUTE_MINIMUM_RATING", global = true)]
    pub absolute_minimum_rating: Option<i32>,

    #[arg(long, env = "MAX_WEEKLY_BONUS", global = true)]
    pub max_weekly_bonus: Option<i32>
}

impl ConstantOverrides {
    pub fn to_constants(&self) -> RatingConstants {
        let defaults = RatingConstants::default();

        RatingConstants {
            k_factor: self.k_factor.unwrap_or(defaults.k_factor),
            starting_rating: self.starting_rating.unwrap_or(defaults.starting_rating),
            inactivity_threshold_days: self
                .inactivity_threshold_days
                .unwrap_or(defaults.inactivity_threshold_days),
            decay_points_per_period: self.decay_points_per_period.unwrap_or(defaults.decay_points_per_period),
            decay_period_days: self.decay_period_days.unwrap_or(defaults.decay_period_days),
            absolute_minimum_rating: self.absolute_minimum_rating.unwrap_or(defaults.absolute_minimum_rating),
            max_weekly_bonus: self.max_weekly_bonus.unwrap_or(defaults.max_weekly_bonus),
            ..defaults
        }
    }
}

#[derive(Subcommand, Clone, Debug)]
pub enum Command {
    /// Adds a player at the starting rating
    AddPlayer { name: String },

    /// Records a match between two players. Winner is A, B or DRAW
    RecordMatch {
        player_a: String,
        player_b: String,
        winner: String
    },

    /// Runs the scheduled decay and activity bonus cycle
    Decay {
        /// Compute and print the run without writing it
        #[arg(long, action = clap::ArgAction::SetTrue)]
        dry_run: bool,

        /// Apply even if a run was already applied this week
        #[arg(long, action = clap::ArgAction::SetTrue)]
        force: bool,

        /// Evaluate the run as of this RFC 3339 time instead of now
        #[arg(long)]
        now: Option<DateTime<Utc>>
    },

    /// Shows the decay a single rating would receive
    PreviewDecay {
        rating: i32,

        #[arg(long)]
        last_active: Option<DateTime<Utc>>,

        /// Defaults to the absolute minimum rating
        #[arg(long)]
        floor: Option<i32>,

        #[arg(long)]
        now: Option<DateTime<Utc>>
    },

    /// Prints the ranked leaderboard
    Leaderboard,

    /// Prints a player's rating history
    History { player_id: String },

    /// Replays all matches and reports ratings that differ from the stored ones
    Verify {
        /// Rewrite ratings and history from the replay
        #[arg(long, action = clap::ArgAction::SetTrue)]
        rebuild: bool
    }
}
