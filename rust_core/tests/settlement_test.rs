//! Settlement rule table and the ingest → finish → settle flow

use chrono::Utc;
use serde_json::json;
use std::sync::Arc;
use tipmatch_rust_core::{
    evaluate, outcome_to_status, CoreConfig, Engine, InMemoryRegistry, IngestPayload, MarketType,
    MatchState, Outcome, ScoreData, TeamRecord,
};

fn settle(market: &str, score: ScoreData) -> (Outcome, Option<String>) {
    let result = evaluate(&MarketType::parse(market), &score);
    (result.outcome, result.reason)
}

#[test]
fn test_settlement_table() {
    let cases = [
        ("BTTS", ScoreData::full_time(3, 1), Outcome::Won),
        ("BTTS", ScoreData::full_time(1, 0), Outcome::Lost),
        ("KG VAR", ScoreData::full_time(0, 0), Outcome::Lost),
        ("Over 2.5", ScoreData::full_time(2, 1), Outcome::Won),
        ("2.5 ÜST", ScoreData::full_time(1, 1), Outcome::Lost),
        ("Over 1.5", ScoreData::full_time(1, 1), Outcome::Won),
        ("MS 1", ScoreData::full_time(2, 1), Outcome::Won),
        ("MS X", ScoreData::full_time(2, 1), Outcome::Lost),
        ("MS 2", ScoreData::full_time(0, 1), Outcome::Won),
    ];

    for (market, score, expected) in cases {
        let (outcome, reason) = settle(market, score.clone());
        assert_eq!(outcome, expected, "{} on {:?}", market, score);
        assert_eq!(reason, None);
    }
}

#[test]
fn test_void_reasons() {
    assert_eq!(
        settle("BTTS", ScoreData::full_time(2, -1)),
        (Outcome::Void, Some("INVALID_SCORE".to_string()))
    );
    assert_eq!(
        settle("IY 0.5 ÜST", ScoreData::full_time(2, 0)),
        (Outcome::Void, Some("HT_DATA_MISSING".to_string()))
    );
    assert_eq!(
        settle("Asian handicap -1", ScoreData::full_time(2, 0)),
        (Outcome::Void, Some("UNKNOWN_MARKET".to_string()))
    );
    assert_eq!(
        settle("Over 2.5", ScoreData::default()),
        (Outcome::Void, Some("SCORE_DATA_MISSING".to_string()))
    );
    assert_eq!(outcome_to_status(Outcome::Void), "void");
}

#[test]
fn test_half_time_values_from_provider_json() {
    let score = ScoreData::full_time(1, 1).with_half_time(json!("1"), json!(0));
    assert_eq!(settle("IY 0.5 ÜST", score).0, Outcome::Won);

    let goalless = ScoreData::full_time(1, 1).with_half_time(json!(0), json!(0));
    assert_eq!(settle("HT Over 0.5", goalless).0, Outcome::Lost);
}

#[tokio::test]
async fn test_ingest_then_settle() {
    let registry = Arc::new(InMemoryRegistry::new());
    registry.add_team(TeamRecord::new(1, "Galatasaray", None));
    registry.add_team(TeamRecord::new(2, "Fenerbahce", None));
    registry.add_match("derby", 1, 2, Utc::now(), MatchState::SecondHalf);
    let engine = Engine::in_memory(registry.clone(), CoreConfig::default());

    engine
        .ingestor
        .ingest(&IngestPayload::from_content(
            "tip-200",
            "bot",
            "Galatasaray - Fenerbahce | 1-1 | 70 | Super Lig | KG VAR",
        ))
        .await
        .unwrap();

    // Still live: nothing to settle
    let report = engine.settler.settle_pending(10).await.unwrap();
    assert_eq!(report.skipped, 1);
    assert!(registry.links()[0].outcome.is_none());

    registry.finish_match("derby", MatchState::Finished, ScoreData::full_time(2, 1));
    let report = engine.settler.settle_pending(10).await.unwrap();
    assert_eq!(report.settled, 1);

    let link = &registry.links()[0];
    assert_eq!(link.outcome, Some(Outcome::Won));
    assert_eq!(link.final_score.as_deref(), Some("2-1"));
}
