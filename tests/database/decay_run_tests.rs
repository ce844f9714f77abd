use chess_ladder::{
    database::{db::DbError, db_structs::DecayRunOptions},
    model::{error::RatingError, structures::winner::Winner}
};
use chrono::Duration;

use super::test_helpers::{now, TestLadder};

const FORCE: DecayRunOptions = DecayRunOptions {
    simulate: false,
    ignore_period_guard: true
};

#[tokio::test]
async fn test_decay_run_moves_points_to_active_players() {
    let ladder = TestLadder::seeded().await;

    let report = ladder
        .client
        .run_decay_cycle(now(), DecayRunOptions::default())
        .await
        .unwrap();

    assert_eq!(report.period, "2024-W23");
    assert_eq!(report.cycle.floor_used, 1000);
    assert_eq!(report.cycle.active_players, 2);
    // 60 days inactive: (60 - 7) / 7 = 7 further periods, 8 * 5 = 40 each
    assert_eq!(report.cycle.total_decay, 80);
    // 80 / 2 = 40, capped at 5
    assert_eq!(report.cycle.bonus_per_player, 5);
    assert_eq!(report.cycle.undistributed(), 70);
    assert_eq!(report.applied.len(), 4);
    assert!(report.failed.is_empty());

    assert_eq!(ladder.rating(0).await, 1176);
    assert_eq!(ladder.rating(1).await, 1144);
    assert_eq!(ladder.rating(2).await, 1205);
    assert_eq!(ladder.rating(3).await, 1205);
    assert_eq!(ladder.total_rating().await, 4800 - 70);
}

#[tokio::test]
async fn test_decay_run_records_system_matches() {
    let ladder = TestLadder::seeded().await;

    ladder
        .client
        .run_decay_cycle(now(), DecayRunOptions::default())
        .await
        .unwrap();

    let matches = ladder.client.matches().await;
    let system: Vec<_> = matches.iter().filter(|m| m.winner.is_system_event()).collect();
    assert_eq!(system.len(), 4);
    assert!(system.iter().all(|m| m.player_b_id == "SYSTEM" && m.timestamp == now()));

    let decay = system
        .iter()
        .find(|m| m.player_a_id == ladder.ids[0])
        .unwrap();
    assert_eq!(decay.winner, Winner::Decay);
    assert!(decay.id.starts_with("DECAY-"));
    assert_eq!((decay.rating_a_before, decay.rating_a_after), (1216, 1176));

    let bonus = system
        .iter()
        .find(|m| m.player_a_id == ladder.ids[2])
        .unwrap();
    assert_eq!(bonus.winner, Winner::ActivityBonus);
    assert!(bonus.id.starts_with("ACTIVITY_BONUS-"));

    // Decay does not count as activity
    let player = ladder.client.player(&ladder.ids[0]).await.unwrap();
    assert_eq!(player.rating.last_active_at, Some(now() - Duration::days(60)));
    assert_eq!(player.rating.matches_played, 1);

    let history = ladder.client.history(&ladder.ids[0]).await.unwrap();
    assert_eq!(history.last().unwrap().rating, 1176);
    assert_eq!(history.last().unwrap().match_id, decay.id);
}

#[tokio::test]
async fn test_simulated_run_writes_nothing() {
    let ladder = TestLadder::seeded().await;

    let report = ladder
        .client
        .run_decay_cycle(
            now(),
            DecayRunOptions {
                simulate: true,
                ignore_period_guard: false
            }
        )
        .await
        .unwrap();

    assert!(report.cycle.simulated);
    assert_eq!(report.cycle.decayed_players.len(), 2);
    assert_eq!(report.cycle.bonused_players.len(), 2);
    assert!(report.applied.is_empty());

    assert_eq!(ladder.rating(0).await, 1216);
    assert_eq!(ladder.client.matches().await.len(), 2);

    // The simulation did not consume the period
    assert!(ladder
        .client
        .run_decay_cycle(now(), DecayRunOptions::default())
        .await
        .is_ok());
}

#[tokio::test]
async fn test_second_run_in_same_week_is_refused() {
    let ladder = TestLadder::seeded().await;

    ladder
        .client
        .run_decay_cycle(now(), DecayRunOptions::default())
        .await
        .unwrap();

    let err = ladder
        .client
        .run_decay_cycle(now() + Duration::days(2), DecayRunOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, DbError::DecayAlreadyApplied(ref period) if period == "2024-W23"));
    assert_eq!(ladder.rating(0).await, 1176);

    // Forcing applies again, and the next week is free
    ladder.client.run_decay_cycle(now(), FORCE).await.unwrap();
    assert!(ladder.rating(0).await < 1176);

    assert!(ladder
        .client
        .run_decay_cycle(now() + Duration::days(7), DecayRunOptions::default())
        .await
        .is_ok());
}

#[tokio::test]
async fn test_run_without_active_players_is_noop() {
    let ladder = TestLadder::new(2).await;
    ladder.play(0, 1, "A", now() - Duration::days(30)).await;

    let report = ladder
        .client
        .run_decay_cycle(now(), DecayRunOptions::default())
        .await
        .unwrap();

    assert!(report.cycle.is_noop());
    assert_eq!(report.cycle.active_players, 0);
    assert_eq!(ladder.rating(0).await, 1216);
    assert_eq!(ladder.client.matches().await.len(), 1);

    // A no-op run does not mark the week as processed
    assert!(ladder
        .client
        .run_decay_cycle(now(), DecayRunOptions::default())
        .await
        .is_ok());
}

#[tokio::test]
async fn test_partial_failure_is_reported() {
    let ladder = TestLadder::seeded().await;

    let pending = ladder.client.prepare_decay_cycle(now(), false).await.unwrap();
    // Players 0 and 2 change between the snapshot and the writes
    ladder.play(0, 2, "B", now()).await;
    let after_match = (ladder.rating(0).await, ladder.rating(2).await);

    let err = ladder.client.commit_decay_cycle(pending).await.unwrap_err();

    match err {
        DbError::Rating(RatingError::Processing { applied, failed }) => {
            assert_eq!(applied, vec![ladder.ids[1].clone(), ladder.ids[3].clone()]);
            let failed_ids: Vec<_> = failed.iter().map(|f| f.player_id.clone()).collect();
            assert_eq!(failed_ids, vec![ladder.ids[0].clone(), ladder.ids[2].clone()]);
        }
        other => panic!("Expected a processing error, got {:?}", other)
    }

    // Conflicting players keep the match result, the others were written
    assert_eq!((ladder.rating(0).await, ladder.rating(2).await), after_match);
    assert_eq!(ladder.rating(1).await, 1144);
    assert_eq!(ladder.rating(3).await, 1205);

    // The week stays open for a re-run
    assert!(ladder
        .client
        .run_decay_cycle(now(), DecayRunOptions::default())
        .await
        .is_ok());
}

#[tokio::test]
async fn test_rerun_after_partial_failure_adjusts_each_player_once() {
    let ladder = TestLadder::seeded().await;

    let pending = ladder.client.prepare_decay_cycle(now(), false).await.unwrap();
    ladder.play(0, 2, "B", now()).await;
    let after_match = (ladder.rating(0).await, ladder.rating(2).await);
    assert!(ladder.client.commit_decay_cycle(pending).await.is_err());

    let report = ladder
        .client
        .run_decay_cycle(now(), DecayRunOptions::default())
        .await
        .unwrap();

    // Players written by the failed run are not decayed or bonused again
    assert_eq!(report.skipped, vec![ladder.ids[1].clone(), ladder.ids[3].clone()]);
    assert_eq!(ladder.rating(1).await, 1144);
    assert_eq!(ladder.rating(3).await, 1205);

    // The players whose writes failed are covered now; both just played, so both get the bonus
    assert_eq!(report.applied, vec![ladder.ids[0].clone(), ladder.ids[2].clone()]);
    assert_eq!(ladder.rating(0).await, after_match.0 + 5);
    assert_eq!(ladder.rating(2).await, after_match.1 + 5);

    let system = ladder
        .client
        .matches()
        .await
        .into_iter()
        .filter(|m| m.winner.is_system_event())
        .collect::<Vec<_>>();
    for id in &ladder.ids {
        assert_eq!(system.iter().filter(|m| &m.player_a_id == id).count(), 1);
    }

    // The week is complete now
    let err = ladder
        .client
        .run_decay_cycle(now(), DecayRunOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, DbError::DecayAlreadyApplied(_)));
    assert!(ladder.client.verify_ratings().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_partial_failure_lists_players() {
    let ladder = TestLadder::seeded().await;

    let pending = ladder.client.prepare_decay_cycle(now(), false).await.unwrap();
    ladder.play(0, 2, "B", now()).await;
    let err = ladder.client.commit_decay_cycle(pending).await.unwrap_err();

    let partial = err.partial_decay_run().expect("Partial run should list its players");
    assert_eq!(partial.applied, vec![ladder.ids[1].clone(), ladder.ids[3].clone()]);

    let json = serde_json::to_value(&partial).unwrap();
    assert_eq!(json["applied"][0], ladder.ids[1].as_str());
    assert_eq!(json["failed"][0]["playerId"], ladder.ids[0].as_str());
    assert!(json["failed"][1]["reason"].as_str().unwrap().contains("Concurrent write"));

    assert!(DbError::DecayAlreadyApplied("2024-W23".to_string())
        .partial_decay_run()
        .is_none());
}

#[tokio::test]
async fn test_back_dated_run_is_refused() {
    let ladder = TestLadder::seeded().await;
    ladder.play(1, 3, "A", now() + Duration::hours(2)).await;
    let before = ladder.total_rating().await;

    let err = ladder
        .client
        .run_decay_cycle(now(), DecayRunOptions::default())
        .await
        .unwrap_err();

    assert!(matches!(err, DbError::Rating(RatingError::Validation(_))));
    assert_eq!(ladder.total_rating().await, before);
    assert_eq!(ladder.client.matches().await.len(), 3);

    // Previewing the same date is still allowed
    let simulated = ladder
        .client
        .run_decay_cycle(
            now(),
            DecayRunOptions {
                simulate: true,
                ignore_period_guard: false
            }
        )
        .await;
    assert!(simulated.is_ok());

    // Dated after the match it goes through, and replays cleanly
    ladder
        .client
        .run_decay_cycle(now() + Duration::hours(3), DecayRunOptions::default())
        .await
        .unwrap();
    assert!(ladder.client.verify_ratings().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_history_replays_after_decay() {
    let ladder = TestLadder::seeded().await;

    ladder
        .client
        .run_decay_cycle(now(), DecayRunOptions::default())
        .await
        .unwrap();
    ladder.play(1, 2, "A", now() + Duration::hours(1)).await;

    assert!(ladder.client.verify_ratings().await.unwrap().is_empty());
}
