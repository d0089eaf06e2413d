//! Settles linked predictions once their fixture is finished

use super::evaluate;
use crate::config::CoreConfig;
use crate::error::{CoreError, Result};
use crate::ingest::batch::{run_batch, BatchReport, UnitOutcome};
use crate::models::{MatchLink, SettlementResult};
use crate::registry::{with_timeout, MatchRegistry, PredictionStore};
use std::sync::Arc;
use tracing::{debug, info};

pub struct Settler {
    matches: Arc<dyn MatchRegistry>,
    store: Arc<dyn PredictionStore>,
    config: Arc<CoreConfig>,
}

impl Settler {
    pub fn new(
        matches: Arc<dyn MatchRegistry>,
        store: Arc<dyn PredictionStore>,
        config: Arc<CoreConfig>,
    ) -> Self {
        Self {
            matches,
            store,
            config,
        }
    }

    /// Settle one link. `None` when the link is already settled or its
    /// fixture has not finished yet.
    pub async fn settle_link(&self, link: &MatchLink) -> Result<Option<SettlementResult>> {
        if link.is_settled() {
            return Ok(None);
        }
        let timeout = self.config.query_timeout;

        let Some(finished) = with_timeout(
            timeout,
            "finished_match",
            self.matches.finished_match(&link.match_external_id),
        )
        .await?
        else {
            debug!("Fixture {} not finished yet", link.match_external_id);
            return Ok(None);
        };

        let prediction = with_timeout(
            timeout,
            "get_prediction",
            self.store.get_prediction(link.prediction_id),
        )
        .await?
        .ok_or_else(|| CoreError::NotFound(format!("prediction {}", link.prediction_id)))?;

        let market = prediction.market();
        let result = evaluate(&market, &finished.score);
        let final_score = finished.score.final_score_string();

        with_timeout(
            timeout,
            "record_settlement",
            self.store
                .record_settlement(link.id, &result, final_score.as_deref()),
        )
        .await?;

        info!(
            "Settled {} on {}: {} ({}{})",
            prediction.external_id,
            link.match_external_id,
            result.outcome.as_str(),
            market.type_name(),
            result
                .reason
                .as_deref()
                .map(|r| format!(", {}", r))
                .unwrap_or_default()
        );
        Ok(Some(result))
    }

    /// Settle up to `limit` unsettled links in paced groups
    pub async fn settle_pending(&self, limit: usize) -> Result<BatchReport> {
        let links = with_timeout(
            self.config.query_timeout,
            "unsettled_links",
            self.store.unsettled_links(limit),
        )
        .await?;

        let report = run_batch(
            links,
            &self.config,
            |link: &MatchLink| link.id.to_string(),
            |link| async move {
                let outcome = match self.settle_link(&link).await? {
                    Some(_) => UnitOutcome::Settled,
                    None => UnitOutcome::Skipped,
                };
                Ok::<_, CoreError>(outcome)
            },
        )
        .await;

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        LinkStatus, MatchState, NewMatchLink, NewPrediction, Outcome, ScoreData, TeamRecord,
    };
    use crate::registry::InMemoryRegistry;
    use chrono::Utc;

    async fn linked(registry: &InMemoryRegistry, market: &str) -> MatchLink {
        registry.add_team(TeamRecord::new(1, "Home", None));
        registry.add_team(TeamRecord::new(2, "Away", None));
        registry.add_match("m1", 1, 2, Utc::now(), MatchState::SecondHalf);

        let prediction = registry
            .create_prediction(&NewPrediction {
                external_id: "tip-1".to_string(),
                home_team_name: "Home".to_string(),
                away_team_name: "Away".to_string(),
                market_type: Some(market.to_string()),
                ..Default::default()
            })
            .await
            .unwrap();

        registry
            .link_prediction(&NewMatchLink {
                prediction_id: prediction.id,
                match_external_id: "m1".to_string(),
                home_confidence: 1.0,
                away_confidence: 1.0,
                overall_confidence: 1.0,
                status: LinkStatus::Matched,
            })
            .await
            .unwrap()
    }

    fn settler(registry: Arc<InMemoryRegistry>) -> Settler {
        Settler::new(registry.clone(), registry, Arc::new(CoreConfig::default()))
    }

    #[tokio::test]
    async fn test_unfinished_fixture_is_skipped() {
        let registry = Arc::new(InMemoryRegistry::new());
        let link = linked(&registry, "KG VAR").await;

        let result = settler(registry.clone()).settle_link(&link).await.unwrap();
        assert!(result.is_none());
        assert!(!registry.links()[0].is_settled());
    }

    #[tokio::test]
    async fn test_finished_fixture_is_settled() {
        let registry = Arc::new(InMemoryRegistry::new());
        let link = linked(&registry, "KG VAR").await;
        registry.finish_match("m1", MatchState::Finished, ScoreData::full_time(3, 1));

        let result = settler(registry.clone()).settle_link(&link).await.unwrap().unwrap();
        assert_eq!(result.outcome, Outcome::Won);

        let stored = &registry.links()[0];
        assert_eq!(stored.outcome, Some(Outcome::Won));
        assert_eq!(stored.final_score.as_deref(), Some("3-1"));
        assert!(stored.resolved_at.is_some());
    }

    #[tokio::test]
    async fn test_settle_pending_reports_counts() {
        let registry = Arc::new(InMemoryRegistry::new());
        linked(&registry, "IY 0.5 ÜST").await;
        registry.finish_match("m1", MatchState::Finished, ScoreData::full_time(1, 0));

        let report = settler(registry.clone()).settle_pending(10).await.unwrap();
        assert_eq!(report.processed, 1);
        assert_eq!(report.settled, 1);
        assert_eq!(registry.links()[0].outcome, Some(Outcome::Void));

        // Already settled links are no longer listed
        let again = settler(registry).settle_pending(10).await.unwrap();
        assert_eq!(again.processed, 0);
    }
}
