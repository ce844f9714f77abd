use super::db_structs::{
    DecayRunOptions, DecayRunReport, LadderData, LeaderboardEntry, PartialDecayRun, PendingDecayCycle, PendingMatch,
    Player, RecordedMatch, Versioned
};
use crate::model::{
    constants::{RatingConstants, SYSTEM_PLAYER_ID},
    decay_processor::DecayProcessor,
    error::{FailedWrite, RatingError},
    match_recorder::{MatchRecorder, MatchRequest},
    rating_tracker::leaderboard,
    replay::{replay_matches, verify, RatingMismatch},
    structures::{
        match_record::{MatchRecord, RatingHistoryEntry},
        player_rating::PlayerRatingState,
        processing::RatingDelta
    }
};
use chrono::{DateTime, Datelike, Utc};
use futures::future::join_all;
use indexmap::IndexMap;
use std::{
    collections::BTreeSet,
    path::{Path, PathBuf},
    sync::Arc
};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum DbError {
    #[error(transparent)]
    Rating(#[from] RatingError),

    #[error("Failed to access ladder data file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to (de)serialize ladder data: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Decay run failed to complete: {0}")]
    Task(#[from] tokio::task::JoinError),

    #[error("Decay was already applied for period {0}")]
    DecayAlreadyApplied(String)
}

impl DbError {
    /// The applied and failed players of a partially applied decay run
    pub fn partial_decay_run(&self) -> Option<PartialDecayRun> {
        match self {
            DbError::Rating(RatingError::Processing { applied, failed }) => Some(PartialDecayRun {
                applied: applied.clone(),
                failed: failed.clone()
            }),
            _ => None
        }
    }
}

/// Persistence collaborator for the rating engine.
///
/// Tables live in memory behind an async mutex and can be backed by a JSON
/// file. The mutex is only held to read or to commit, never while computing:
/// every write is an optimistic transaction that checks the versions it read.
#[derive(Clone)]
pub struct DbClient {
    tables: Arc<Mutex<LadderData>>,
    path: Option<PathBuf>,
    constants: RatingConstants
}

impl DbClient {
    pub fn in_memory(constants: RatingConstants) -> Self {
        DbClient {
            tables: Arc::new(Mutex::new(LadderData::default())),
            path: None,
            constants
        }
    }

    /// Opens the ladder stored at `path`. A missing file starts an empty ladder.
    pub async fn open(path: impl AsRef<Path>, constants: RatingConstants) -> Result<Self, DbError> {
        let path = path.as_ref().to_path_buf();

        let data = match tokio::fs::read(&path).await {
            Ok(bytes) => serde_json::from_slice::<LadderData>(&bytes)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!("No ladder data at {}, starting empty", path.display());
                LadderData::default()
            }
            Err(e) => return Err(e.into())
        };

        info!(
            "Loaded {} players and {} matches from {}",
            data.players.len(),
            data.matches.len(),
            path.display()
        );

        Ok(DbClient {
            tables: Arc::new(Mutex::new(data)),
            path: Some(path),
            constants
        })
    }

    pub fn constants(&self) -> &RatingConstants {
        &self.constants
    }

    /// Writes the tables to the backing file (temp file, then rename).
    /// No-op for in-memory clients.
    pub async fn flush(&self) -> Result<(), DbError> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        let bytes = {
            let tables = self.tables.lock().await;
            serde_json::to_vec_pretty(&*tables)?
        };

        let tmp = path.with_extension("tmp");
        tokio::fs::write(&tmp, bytes).await?;
        tokio::fs::rename(&tmp, path).await?;

        debug!("Ladder data written to {}", path.display());
        Ok(())
    }

    pub async fn add_player(&self, name: &str, at: DateTime<Utc>) -> Result<Player, DbError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(RatingError::Validation("Player name is required".to_string()).into());
        }

        let player = Player {
            name: name.to_string(),
            created_at: at,
            rating: PlayerRatingState::new(Uuid::new_v4().to_string(), self.constants.starting_rating)
        };

        self.tables.lock().await.players.insert(
            player.rating.id.clone(),
            Versioned {
                version: 0,
                value: player.clone()
            }
        );

        info!(
            "Player {} added with starting rating {}",
            player.name, player.rating.current_rating
        );
        Ok(player)
    }

    pub async fn player(&self, id: &str) -> Option<Player> {
        self.tables.lock().await.players.get(id).map(|p| p.value.clone())
    }

    pub async fn players(&self) -> Vec<Player> {
        self.tables
            .lock()
            .await
            .players
            .values()
            .map(|p| p.value.clone())
            .collect()
    }

    pub async fn matches(&self) -> Vec<MatchRecord> {
        self.tables.lock().await.matches.clone()
    }

    pub async fn history(&self, player_id: &str) -> Result<Vec<RatingHistoryEntry>, DbError> {
        let tables = self.tables.lock().await;
        if !tables.players.contains_key(player_id) {
            return Err(RatingError::NotFound(player_id.to_string()).into());
        }

        Ok(tables
            .history
            .iter()
            .filter(|h| h.player_id == player_id)
            .cloned()
            .collect())
    }

    pub async fn leaderboard(&self) -> Vec<LeaderboardEntry> {
        let tables = self.tables.lock().await;

        leaderboard(tables.players.values().map(|p| &p.value.rating))
            .into_iter()
            .map(|standing| LeaderboardEntry {
                name: tables
                    .players
                    .get(&standing.player_id)
                    .map(|p| p.value.name.clone())
                    .unwrap_or_default(),
                standing
            })
            .collect()
    }

    /// Reads both players and computes the match. Nothing is written.
    pub async fn prepare_match(&self, request: &MatchRequest) -> Result<PendingMatch, DbError> {
        request.validate()?;

        let mut snapshot: IndexMap<String, PlayerRatingState> = IndexMap::new();
        let mut versions: IndexMap<String, u64> = IndexMap::new();
        {
            let tables = self.tables.lock().await;
            for id in [&request.player_a_id, &request.player_b_id] {
                if let Some(p) = tables.players.get(id) {
                    snapshot.insert(id.clone(), p.value.rating.clone());
                    versions.insert(id.clone(), p.version);
                }
            }
        }

        let outcome = MatchRecorder::new(self.constants).record(request, &snapshot)?;
        let version_of = |id: &str| versions.get(id).copied().unwrap_or_default();

        Ok(PendingMatch {
            versions: [
                (outcome.player_a.player_id.clone(), version_of(&outcome.player_a.player_id)),
                (outcome.player_b.player_id.clone(), version_of(&outcome.player_b.player_id))
            ],
            outcome
        })
    }

    /// Commits a prepared match atomically: both players, the match record and
    /// both history entries, or nothing if either player changed since it was read.
    pub async fn commit_match(&self, pending: PendingMatch, at: DateTime<Utc>) -> Result<RecordedMatch, DbError> {
        let mut tables = self.tables.lock().await;

        for (id, expected) in &pending.versions {
            let stored = tables
                .players
                .get(id)
                .ok_or_else(|| RatingError::NotFound(id.clone()))?;

            if stored.version != *expected {
                return Err(RatingError::ConcurrencyConflict {
                    player_id: id.clone(),
                    expected: *expected,
                    actual: stored.version
                }
                .into());
            }
        }

        let outcome = pending.outcome;
        let record = MatchRecord {
            id: Uuid::new_v4().to_string(),
            player_a_id: outcome.player_a.player_id.clone(),
            player_b_id: outcome.player_b.player_id.clone(),
            winner: outcome.winner,
            rating_a_before: outcome.player_a.rating_before,
            rating_b_before: outcome.player_b.rating_before,
            rating_a_after: outcome.player_a.rating_after,
            rating_b_after: outcome.player_b.rating_after,
            timestamp: at
        };

        for update in [&outcome.player_a, &outcome.player_b] {
            if let Some(stored) = tables.players.get_mut(&update.player_id) {
                update.apply_to(&mut stored.value.rating, at);
                stored.version += 1;
            }

            tables.history.push(RatingHistoryEntry {
                player_id: update.player_id.clone(),
                rating: update.rating_after,
                timestamp: at,
                match_id: record.id.clone()
            });
        }
        tables.matches.push(record.clone());

        info!(
            "Match {} recorded: {} {:+} / {} {:+}",
            record.id, record.player_a_id, outcome.player_a.delta, record.player_b_id, outcome.player_b.delta
        );
        Ok(RecordedMatch { record, outcome })
    }

    /// Validates, computes and commits a match. Conflicting concurrent writes
    /// retry the whole read-compute-write up to `max_transaction_attempts` times.
    pub async fn record_match(&self, request: &MatchRequest, at: DateTime<Utc>) -> Result<RecordedMatch, DbError> {
        let mut attempt = 1;
        loop {
            let pending = self.prepare_match(request).await?;

            match self.commit_match(pending, at).await {
                Err(DbError::Rating(e)) if e.is_retryable() && attempt < self.constants.max_transaction_attempts => {
                    warn!("Attempt {} to record match failed: {}, retrying", attempt, e);
                    attempt += 1;
                }
                result => return result
            }
        }
    }

    /// Reads one consistent snapshot of every player and computes the decay run.
    /// Players already adjusted in the same week are carried along so the
    /// commit can skip them.
    pub async fn prepare_decay_cycle(&self, now: DateTime<Utc>, simulate: bool) -> Result<PendingDecayCycle, DbError> {
        let period = decay_period(now);

        let (states, versions, already_adjusted) = {
            let tables = self.tables.lock().await;
            let states: Vec<PlayerRatingState> = tables.players.values().map(|p| p.value.rating.clone()).collect();
            let versions: IndexMap<String, u64> = tables
                .players
                .iter()
                .map(|(id, p)| (id.clone(), p.version))
                .collect();
            let already_adjusted: BTreeSet<String> = tables
                .decay_periods
                .get(&period)
                .map(|p| p.adjusted.clone())
                .unwrap_or_default();

            (states, versions, already_adjusted)
        };

        let processor = DecayProcessor::new(self.constants);
        let cycle = tokio::task::spawn_blocking(move || processor.process(&states, now, simulate)).await?;

        Ok(PendingDecayCycle {
            cycle,
            period,
            versions,
            already_adjusted
        })
    }

    /// Applies every delta of a prepared run as its own single-player
    /// transaction. A player that changed since the snapshot is not
    /// recomputed: its delta fails and is reported. Players in
    /// `already_adjusted` are skipped, so a re-run after a partial failure
    /// only covers the players that were not written.
    ///
    /// A run dated before the latest stored match is refused, since its
    /// system records would replay ahead of matches the ratings already reflect.
    pub async fn commit_decay_cycle(&self, pending: PendingDecayCycle) -> Result<DecayRunReport, DbError> {
        let PendingDecayCycle {
            cycle,
            period,
            versions,
            already_adjusted
        } = pending;

        let latest_match = self.tables.lock().await.matches.iter().map(|m| m.timestamp).max();
        if let Some(latest) = latest_match {
            if cycle.run_at < latest {
                return Err(RatingError::Validation(format!(
                    "Decay run at {} is dated before the latest match at {}",
                    cycle.run_at, latest
                ))
                .into());
            }
        }

        let (skipped, pending_deltas): (Vec<&RatingDelta>, Vec<&RatingDelta>) =
            cycle.deltas().partition(|d| already_adjusted.contains(&d.player_id));

        let writes = pending_deltas.iter().map(|delta| {
            let expected = versions.get(&delta.player_id).copied().unwrap_or_default();
            self.apply_delta(delta, expected, cycle.run_at, &period)
        });
        let results = join_all(writes).await;

        let mut applied = Vec::new();
        let mut failed = Vec::new();
        for (delta, result) in pending_deltas.iter().zip(results) {
            match result {
                Ok(()) => applied.push(delta.player_id.clone()),
                Err(e) => {
                    error!("Failed to apply {:?} to player {}: {}", delta.adjustment_type, delta.player_id, e);
                    failed.push(FailedWrite {
                        player_id: delta.player_id.clone(),
                        reason: e.to_string()
                    });
                }
            }
        }

        if !failed.is_empty() {
            return Err(RatingError::Processing { applied, failed }.into());
        }

        let skipped: Vec<String> = skipped.into_iter().map(|d| d.player_id.clone()).collect();
        {
            let mut tables = self.tables.lock().await;
            // A no-op run leaves the week open, unless it finishes an earlier partial run
            if !cycle.is_noop() || tables.decay_periods.contains_key(&period) {
                tables.decay_periods.entry(period.clone()).or_default().complete = true;
            }
        }

        info!(
            "Decay run for {} applied to {} players, {} already adjusted",
            period,
            applied.len(),
            skipped.len()
        );
        Ok(DecayRunReport {
            period,
            cycle,
            applied,
            skipped,
            failed
        })
    }

    async fn apply_delta(
        &self,
        delta: &RatingDelta,
        expected: u64,
        at: DateTime<Utc>,
        period: &str
    ) -> Result<(), RatingError> {
        let mut tables = self.tables.lock().await;

        let stored = tables
            .players
            .get_mut(&delta.player_id)
            .ok_or_else(|| RatingError::NotFound(delta.player_id.clone()))?;

        if stored.version != expected {
            return Err(RatingError::ConcurrencyConflict {
                player_id: delta.player_id.clone(),
                expected,
                actual: stored.version
            });
        }

        stored.value.rating.current_rating = delta.new_rating;
        stored.version += 1;

        let match_id = format!("{}-{}", delta.adjustment_type.match_id_prefix(), Uuid::new_v4());
        tables.matches.push(MatchRecord {
            id: match_id.clone(),
            player_a_id: delta.player_id.clone(),
            player_b_id: SYSTEM_PLAYER_ID.to_string(),
            winner: delta.adjustment_type.winner(),
            rating_a_before: delta.old_rating,
            rating_b_before: 0,
            rating_a_after: delta.new_rating,
            rating_b_after: 0,
            timestamp: at
        });
        tables.history.push(RatingHistoryEntry {
            player_id: delta.player_id.clone(),
            rating: delta.new_rating,
            timestamp: at,
            match_id
        });
        tables
            .decay_periods
            .entry(period.to_string())
            .or_default()
            .adjusted
            .insert(delta.player_id.clone());

        Ok(())
    }

    /// Runs one scheduled decay cycle. A non-simulated run refuses to apply
    /// twice within the same ISO week unless `ignore_period_guard` is set.
    ///
    /// After a partially failed run the week stays open: running again only
    /// adjusts the players that were not written. `ignore_period_guard`
    /// applies the whole run again.
    pub async fn run_decay_cycle(&self, now: DateTime<Utc>, options: DecayRunOptions) -> Result<DecayRunReport, DbError> {
        let period = decay_period(now);

        if !options.simulate && !options.ignore_period_guard {
            let complete = self
                .tables
                .lock()
                .await
                .decay_periods
                .get(&period)
                .is_some_and(|p| p.complete);
            if complete {
                return Err(DbError::DecayAlreadyApplied(period));
            }
        }

        let mut pending = self.prepare_decay_cycle(now, options.simulate).await?;
        if options.ignore_period_guard {
            pending.already_adjusted.clear();
        }

        if options.simulate {
            info!("Simulated decay run for {}, nothing written", period);
            let skipped = pending
                .cycle
                .deltas()
                .filter(|d| pending.already_adjusted.contains(&d.player_id))
                .map(|d| d.player_id.clone())
                .collect();

            return Ok(DecayRunReport {
                period: pending.period,
                cycle: pending.cycle,
                applied: Vec::new(),
                skipped,
                failed: Vec::new()
            });
        }

        self.commit_decay_cycle(pending).await
    }

    /// Replays every stored match and reports players whose rating differs.
    pub async fn verify_ratings(&self) -> Result<Vec<RatingMismatch>, DbError> {
        let tables = self.tables.lock().await;
        let stored: Vec<PlayerRatingState> = tables.players.values().map(|p| p.value.rating.clone()).collect();

        let replayed = replay_matches(stored.iter().map(|p| p.id.clone()), &tables.matches, &self.constants)?;

        Ok(verify(&stored, &replayed, &self.constants))
    }

    /// Rewrites every player's rating, counters and history from a replay of
    /// the stored matches. Returns the mismatches that were corrected.
    pub async fn rebuild_ratings(&self) -> Result<Vec<RatingMismatch>, DbError> {
        let mut tables = self.tables.lock().await;
        let stored: Vec<PlayerRatingState> = tables.players.values().map(|p| p.value.rating.clone()).collect();

        let replayed = replay_matches(stored.iter().map(|p| p.id.clone()), &tables.matches, &self.constants)?;
        let mismatches = verify(&stored, &replayed, &self.constants);

        for state in replayed.players() {
            if let Some(p) = tables.players.get_mut(&state.id) {
                p.value.rating = state.clone();
                p.version += 1;
            }
        }
        tables.history = replayed.history_entries();

        warn!("Rebuilt ratings from history, {} player(s) corrected", mismatches.len());
        Ok(mismatches)
    }
}

/// ISO week identifier a decay run at `now` belongs to, e.g. `2024-W22`
pub fn decay_period(now: DateTime<Utc>) -> String {
    let week = now.iso_week();

    format!("{}-W{:02}", week.year(), week.week())
}
