use chess_ladder::{database::db::DbError, model::error::RatingError};
use chrono::Duration;
use futures::future::join_all;

use super::test_helpers::{now, TestLadder};

#[tokio::test]
async fn test_stale_match_commit_is_rejected() {
    let ladder = TestLadder::new(3).await;

    // Read player 0 at version 0, then let another match write it first
    let pending = ladder.client.prepare_match(&ladder.request(0, 1, "A")).await.unwrap();
    ladder.play(0, 2, "B", now()).await;

    let err = ladder.client.commit_match(pending, now()).await.unwrap_err();

    match err {
        DbError::Rating(RatingError::ConcurrencyConflict {
            player_id,
            expected,
            actual
        }) => {
            assert_eq!(player_id, ladder.ids[0]);
            assert_eq!(expected, 0);
            assert_eq!(actual, 1);
        }
        other => panic!("Expected a concurrency conflict, got {:?}", other)
    }

    // Only the winning write landed
    assert_eq!(ladder.client.matches().await.len(), 1);
    assert_eq!(ladder.rating(1).await, 1200);
    assert_eq!(ladder.total_rating().await, 3 * 1200);
}

#[tokio::test]
async fn test_record_match_recomputes_after_conflict() {
    let ladder = TestLadder::new(3).await;

    let pending = ladder.client.prepare_match(&ladder.request(0, 1, "A")).await.unwrap();
    assert_eq!(pending.outcome.player_a.rating_after, 1216);
    ladder.play(0, 2, "A", now()).await;

    // The full record path reads again, so it sees 1216 instead of 1200
    let recorded = ladder
        .client
        .record_match(&ladder.request(0, 1, "A"), now() + Duration::minutes(1))
        .await
        .unwrap();

    assert_eq!(recorded.record.rating_a_before, 1216);
    assert!(recorded.record.rating_a_after > 1216);
    assert_eq!(ladder.total_rating().await, 3 * 1200);
}

#[tokio::test]
async fn test_concurrent_matches_preserve_total_rating() {
    let ladder = TestLadder::new(4).await;

    let requests: Vec<_> = (0..20).map(|i| ladder.request(i % 4, (i + 1) % 4, "A")).collect();
    let results = join_all(requests.iter().map(|r| ladder.client.record_match(r, now()))).await;

    let recorded = results.iter().filter(|r| r.is_ok()).count();
    for result in &results {
        if let Err(e) = result {
            assert!(matches!(e, DbError::Rating(RatingError::ConcurrencyConflict { .. })));
        }
    }

    assert!(recorded > 0);
    assert_eq!(ladder.client.matches().await.len(), recorded);
    assert_eq!(ladder.total_rating().await, 4 * 1200);

    let played: u32 = ladder
        .client
        .players()
        .await
        .iter()
        .map(|p| p.rating.matches_played)
        .sum();
    assert_eq!(played as usize, recorded * 2);
}
