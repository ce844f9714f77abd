use serde_json::Value;
use std::{
    path::{Path, PathBuf},
    process::{Command, Output}
};
use uuid::Uuid;

struct DataFile(PathBuf);

impl DataFile {
    fn new() -> DataFile {
        DataFile(std::env::temp_dir().join(format!("ladder-cli-{}.json", Uuid::new_v4())))
    }

    fn path(&self) -> &Path {
        &self.0
    }
}

impl Drop for DataFile {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.0);
    }
}

fn run(data_file: &DataFile, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_chess-ladder"))
        .arg("--data-file")
        .arg(data_file.path())
        .args(args)
        .env("RUST_LOG", "error")
        .output()
        .expect("Failed to execute chess-ladder")
}

fn run_json(data_file: &DataFile, args: &[&str]) -> Value {
    let output = run(data_file, args);

    assert!(
        output.status.success(),
        "{:?} failed: {}",
        args,
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).expect("Output should be JSON")
}

fn add_player(data_file: &DataFile, name: &str) -> String {
    let player = run_json(data_file, &["add-player", name]);

    assert_eq!(player["name"], name);
    assert_eq!(player["currentRating"], 1200);
    player["id"].as_str().expect("Player should have an id").to_string()
}

#[test]
fn test_record_match_and_leaderboard() {
    let data_file = DataFile::new();
    let alice = add_player(&data_file, "Alice");
    let bob = add_player(&data_file, "Bob");

    let recorded = run_json(&data_file, &["record-match", &alice, &bob, "B"]);
    assert_eq!(recorded["record"]["winner"], "B");
    assert_eq!(recorded["outcome"]["playerA"]["ratingAfter"], 1184);
    assert_eq!(recorded["outcome"]["playerB"]["ratingAfter"], 1216);

    let board = run_json(&data_file, &["leaderboard"]);
    let rows = board.as_array().unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["name"], "Bob");
    assert_eq!(rows[0]["rank"], 1);
    assert_eq!(rows[0]["rating"], 1216);
    assert_eq!(rows[0]["winRate"], 1.0);
    assert_eq!(rows[1]["name"], "Alice");

    let history = run_json(&data_file, &["history", &alice]);
    assert_eq!(history.as_array().unwrap().len(), 1);
    assert_eq!(history[0]["rating"], 1184);

    let mismatches = run_json(&data_file, &["verify"]);
    assert_eq!(mismatches, Value::Array(vec![]));
}

#[test]
fn test_invalid_winner_exits_with_error() {
    let data_file = DataFile::new();
    let alice = add_player(&data_file, "Alice");
    let bob = add_player(&data_file, "Bob");

    let output = run(&data_file, &["record-match", &alice, &bob, "X"]);

    assert!(!output.status.success());
    assert_eq!(output.status.code(), Some(1));
    assert!(output.stdout.is_empty());

    let board = run_json(&data_file, &["leaderboard"]);
    assert!(board.as_array().unwrap().iter().all(|row| row["matchesPlayed"] == 0));
}

#[test]
fn test_unknown_player_history_exits_with_error() {
    let data_file = DataFile::new();

    let output = run(&data_file, &["history", "nobody"]);

    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn test_decay_dry_run_and_guard() {
    let data_file = DataFile::new();
    let alice = add_player(&data_file, "Alice");
    let bob = add_player(&data_file, "Bob");
    run_json(&data_file, &["record-match", &alice, &bob, "DRAW"]);

    // Both just played, so nobody decays and there is nothing to hand out
    let simulated = run_json(&data_file, &["decay", "--dry-run"]);
    assert_eq!(simulated["simulated"], true);
    assert_eq!(simulated["activePlayers"], 2);
    assert_eq!(simulated["totalDecay"], 0);
    assert_eq!(simulated["applied"], Value::Array(vec![]));

    let report = run_json(&data_file, &["decay"]);
    assert_eq!(report["simulated"], false);
    assert_eq!(report["decayedPlayers"], Value::Array(vec![]));
}

#[test]
fn test_preview_decay() {
    let data_file = DataFile::new();

    let result = run_json(
        &data_file,
        &[
            "preview-decay",
            "1500",
            "--last-active",
            "2024-04-17T00:00:00Z",
            "--now",
            "2024-06-01T00:00:00Z"
        ]
    );

    assert_eq!(result["inactiveDays"], 45);
    assert_eq!(result["decayAmount"], 30);
    assert_eq!(result["newRating"], 1470);
    assert_eq!(result["shouldDecay"], true);
}
