use serde::Serialize;
use thiserror::Error;

/// A single player write that could not be committed during a decay run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FailedWrite {
    pub player_id: String,
    pub reason: String
}

#[derive(Debug, Error, PartialEq)]
pub enum RatingError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Player {0} not found")]
    NotFound(String),

    #[error("Concurrent write on player {player_id} (expected version {expected}, found {actual})")]
    ConcurrencyConflict {
        player_id: String,
        expected: u64,
        actual: u64
    },

    #[error("Decay run partially applied: {} player(s) updated, {} failed", applied.len(), failed.len())]
    Processing {
        applied: Vec<String>,
        failed: Vec<FailedWrite>
    }
}

impl RatingError {
    /// Only concurrency conflicts are retried.
    pub fn is_retryable(&self) -> bool {
        matches!(self, RatingError::ConcurrencyConflict { .. })
    }
}
