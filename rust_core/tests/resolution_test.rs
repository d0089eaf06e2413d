//! End-to-end resolution tests against the in-memory registry

use chrono::{Duration, Utc};
use std::sync::Arc;
use tipmatch_rust_core::{
    CoreConfig, Engine, InMemoryRegistry, IngestOutcome, IngestPayload, LinkStatus, MatchHints,
    MatchState, TeamRecord,
};

fn la_liga() -> Arc<InMemoryRegistry> {
    let registry = Arc::new(InMemoryRegistry::new());
    registry.add_team(TeamRecord::new(1, "Real Madrid", Some("RMA")));
    registry.add_team(TeamRecord::new(2, "Barcelona", Some("FCB")));
    registry.add_team(TeamRecord::new(3, "Atletico Madrid", Some("ATM")));
    registry.add_team(TeamRecord::new(4, "Sevilla", None));
    registry
}

#[tokio::test]
async fn test_pipe_payload_links_with_full_confidence() {
    let registry = la_liga();
    registry.add_match("clasico", 1, 2, Utc::now(), MatchState::FirstHalf);
    let engine = Engine::in_memory(registry.clone(), CoreConfig::default());

    let outcome = engine
        .ingestor
        .ingest(&IngestPayload::from_content(
            "tip-100",
            "goalbot",
            "Real Madrid - Barcelona | 1-0 | 23 | La Liga | MS 1",
        ))
        .await
        .unwrap();

    let link = match outcome {
        IngestOutcome::Linked(link) => link,
        other => panic!("expected a link, got {:?}", other),
    };
    assert_eq!(link.match_external_id, "clasico");
    assert_eq!(link.overall_confidence, 1.0);
    assert_eq!(link.home_confidence, 1.0);
    assert_eq!(link.away_confidence, 1.0);
    assert_eq!(link.status, LinkStatus::Matched);

    let predictions = registry.predictions();
    assert_eq!(predictions.len(), 1);
    let stored = &predictions[0];
    assert!(stored.processed);
    assert_eq!(stored.external_id, "tip-100");
    assert_eq!(stored.bot_name, "goalbot");
    assert_eq!(stored.home_team_name, "Real Madrid");
    assert_eq!(stored.away_team_name, "Barcelona");
    assert_eq!(stored.score_at_prediction.as_deref(), Some("1-0"));
    assert_eq!(stored.minute_at_prediction, Some(23));
    assert_eq!(stored.league_name.as_deref(), Some("La Liga"));
    assert_eq!(stored.market_type.as_deref(), Some("MS 1"));
    assert_eq!(stored.pending_reason, None);
}

#[tokio::test]
async fn test_nonsense_names_resolve_to_none() {
    let registry = la_liga();
    registry.add_match("clasico", 1, 2, Utc::now(), MatchState::FirstHalf);
    let engine = Engine::in_memory(registry, CoreConfig::default());

    let result = engine
        .matches
        .find_match_by_teams("Qqqq Zzzz", "Xxxx Wwww", &MatchHints::default())
        .await
        .unwrap();
    assert!(result.is_none());
}

#[tokio::test]
async fn test_single_live_fixture_skips_away_anchor() {
    let registry = la_liga();
    registry.add_match("clasico", 1, 2, Utc::now(), MatchState::SecondHalf);
    let engine = Engine::in_memory(registry.clone(), CoreConfig::default());

    let lookup = engine
        .matches
        .find_match_by_teams("Real Madrid", "Barca", &MatchHints::new(Some(60), None))
        .await
        .unwrap()
        .unwrap();

    assert_eq!(lookup.home.confidence, 1.0);
    let mean = (lookup.home.confidence + lookup.away.confidence) / 2.0;
    assert!((lookup.overall_confidence - mean).abs() < 1e-9);
    assert_eq!(lookup.away.team_id, 2);
    // The away-anchored branch never ran
    assert_eq!(registry.calls("live_matches_for_team"), 1);
}

#[tokio::test]
async fn test_alias_resolves_both_sides() {
    let registry = la_liga();
    registry.add_alias("Los Blancos", 1);
    registry.add_alias("Barça", 2);
    registry.add_match("clasico", 1, 2, Utc::now(), MatchState::HalfTime);
    let engine = Engine::in_memory(registry.clone(), CoreConfig::default());

    let outcome = engine
        .ingestor
        .ingest(&IngestPayload {
            external_id: "tip-101".to_string(),
            bot_name: "bot".to_string(),
            home_team: Some("los blancos".to_string()),
            away_team: Some("BARÇA".to_string()),
            ..Default::default()
        })
        .await
        .unwrap();

    assert!(outcome.is_linked());
    assert_eq!(registry.links()[0].overall_confidence, 1.0);
}

#[tokio::test]
async fn test_opponent_disambiguates_between_live_fixtures() {
    let registry = la_liga();
    let now = Utc::now();
    registry.add_match("derbi", 1, 3, now, MatchState::FirstHalf);
    registry.add_match("clasico", 2, 1, now - Duration::minutes(30), MatchState::FirstHalf);
    let engine = Engine::in_memory(registry, CoreConfig::default());

    let lookup = engine
        .matches
        .find_match_by_teams("Real Madrid", "Barcelona SC", &MatchHints::default())
        .await
        .unwrap()
        .unwrap();

    assert_eq!(lookup.match_external_id, "clasico");
    assert!(!lookup.degraded);
}

#[tokio::test]
async fn test_degraded_link_is_flagged() {
    let registry = la_liga();
    let now = Utc::now();
    registry.add_match("derbi", 1, 3, now, MatchState::FirstHalf);
    registry.add_match("clasico", 1, 2, now - Duration::minutes(30), MatchState::FirstHalf);
    let engine = Engine::in_memory(registry.clone(), CoreConfig::default());

    let outcome = engine
        .ingestor
        .ingest(&IngestPayload::from_content("tip-102", "bot", "Real Madrid - Qwxz"))
        .await
        .unwrap();

    assert!(outcome.is_linked());
    let link = &registry.links()[0];
    assert_eq!(link.status, LinkStatus::Degraded);
    assert_eq!(link.match_external_id, "derbi");
    assert!((link.overall_confidence - 0.8).abs() < 1e-9);
}

#[tokio::test]
async fn test_batch_ingest_isolates_malformed_payloads() {
    let registry = la_liga();
    registry.add_match("clasico", 1, 2, Utc::now(), MatchState::FirstHalf);
    let engine = Engine::in_memory(
        registry.clone(),
        CoreConfig::default().with_batch(2, std::time::Duration::ZERO),
    );

    let report = engine
        .ingestor
        .ingest_batch(vec![
            IngestPayload::from_content("a", "bot", "Real Madrid - Barcelona"),
            IngestPayload::from_content("b", "bot", "no teams here"),
            IngestPayload::from_content("c", "bot", "Sevilla - Atletico Madrid"),
        ])
        .await;

    assert_eq!(report.processed, 3);
    assert_eq!(report.linked, 1);
    assert_eq!(report.pending, 1);
    assert_eq!(report.failed, 1);
    assert_eq!(registry.predictions().len(), 2);
}
