use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::model::{
    error::FailedWrite,
    rating_tracker::PlayerStanding,
    structures::{
        match_record::{MatchRecord, RatingHistoryEntry},
        player_rating::PlayerRatingState,
        processing::{DecayCycle, MatchOutcome}
    }
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    pub name: String,
    pub created_at: DateTime<Utc>,
    #[serde(flatten)]
    pub rating: PlayerRatingState
}

/// A stored record plus the version used for optimistic concurrency control.
/// Every committed write bumps the version by one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Versioned<T> {
    pub version: u64,
    pub value: T
}

/// Everything the ladder persists. Serialized as a single JSON document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LadderData {
    pub players: IndexMap<String, Versioned<Player>>,
    pub matches: Vec<MatchRecord>,
    pub history: Vec<RatingHistoryEntry>,
    /// Decay runs keyed by ISO week (`YYYY-Www`)
    #[serde(default)]
    pub decay_periods: BTreeMap<String, DecayPeriod>
}

/// What the decay runs of one ISO week have written so far.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecayPeriod {
    /// Set once a run for the week finished without failed writes
    pub complete: bool,
    /// Players that already received their decay or bonus this week
    pub adjusted: BTreeSet<String>
}

/// A computed match waiting to be committed. Holds the versions the
/// computation read, so the commit can detect concurrent writes.
#[derive(Debug, Clone)]
pub struct PendingMatch {
    pub outcome: MatchOutcome,
    pub versions: [(String, u64); 2]
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordedMatch {
    pub record: MatchRecord,
    pub outcome: MatchOutcome
}

/// A computed decay run waiting to be applied, with the snapshot versions
/// of every player it read.
#[derive(Debug, Clone)]
pub struct PendingDecayCycle {
    pub cycle: DecayCycle,
    pub period: String,
    pub versions: IndexMap<String, u64>,
    /// Players adjusted by an earlier, partially failed run of the same week.
    /// Their deltas are skipped on commit.
    pub already_adjusted: BTreeSet<String>
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecayRunOptions {
    /// Compute and report without writing anything
    pub simulate: bool,
    /// Apply even if this period was already processed
    pub ignore_period_guard: bool
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DecayRunReport {
    pub period: String,
    #[serde(flatten)]
    pub cycle: DecayCycle,
    pub applied: Vec<String>,
    pub skipped: Vec<String>,
    pub failed: Vec<FailedWrite>
}

/// The player lists of a partially applied decay run, so the caller can see
/// which players a re-run still has to cover.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PartialDecayRun {
    pub applied: Vec<String>,
    pub failed: Vec<FailedWrite>
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    pub name: String,
    #[serde(flatten)]
    pub standing: PlayerStanding
}
