//! Prediction ingestion
//!
//! decode → parse → persist unprocessed → resolve fixture → link.
//! A prediction is flipped to processed only together with its link, in one
//! store call. Anything short of a confident link leaves it pending with a
//! reason, to be retried by `process_pending`.

use super::batch::{run_batch, BatchReport, UnitOutcome};
use super::decode::decode_payload;
use super::parser::parse_content;
use crate::config::CoreConfig;
use crate::error::{CoreError, Result};
use crate::matching::{MatchHints, MatchResolver};
use crate::models::{MatchLink, NewMatchLink, NewPrediction, PredictionRecord};
use crate::registry::{with_timeout, PredictionStore};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

pub const REASON_NO_MATCH: &str = "no match";

/// Raw prediction as delivered by a bot.
///
/// Either `content` (free text, possibly base64 encoded) or both team
/// fields must be present.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IngestPayload {
    pub external_id: String,
    pub bot_name: String,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub home_team: Option<String>,
    #[serde(default)]
    pub away_team: Option<String>,
    #[serde(default)]
    pub league_name: Option<String>,
    #[serde(default)]
    pub score: Option<String>,
    #[serde(default)]
    pub minute: Option<i32>,
    #[serde(default)]
    pub market_type: Option<String>,
    #[serde(default)]
    pub market_value: Option<String>,
}

impl IngestPayload {
    pub fn from_content(external_id: &str, bot_name: &str, content: &str) -> Self {
        Self {
            external_id: external_id.to_string(),
            bot_name: bot_name.to_string(),
            content: Some(content.to_string()),
            ..Default::default()
        }
    }

    fn supplied_teams(&self) -> Option<(&str, &str)> {
        let home = self.home_team.as_deref().map(str::trim).filter(|s| !s.is_empty())?;
        let away = self.away_team.as_deref().map(str::trim).filter(|s| !s.is_empty())?;
        Some((home, away))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum IngestOutcome {
    Linked(MatchLink),
    Pending { prediction_id: Uuid, reason: String },
}

impl IngestOutcome {
    pub fn is_linked(&self) -> bool {
        matches!(self, IngestOutcome::Linked(_))
    }
}

pub struct Ingestor {
    resolver: Arc<MatchResolver>,
    store: Arc<dyn PredictionStore>,
    config: Arc<CoreConfig>,
}

impl Ingestor {
    pub fn new(
        resolver: Arc<MatchResolver>,
        store: Arc<dyn PredictionStore>,
        config: Arc<CoreConfig>,
    ) -> Self {
        Self {
            resolver,
            store,
            config,
        }
    }

    /// Turn a payload into a structured prediction without persisting it
    pub fn prepare(&self, payload: &IngestPayload) -> Result<NewPrediction> {
        if let Some((home, away)) = payload.supplied_teams() {
            return Ok(NewPrediction {
                external_id: payload.external_id.clone(),
                bot_name: payload.bot_name.clone(),
                league_name: payload.league_name.clone(),
                home_team_name: home.to_string(),
                away_team_name: away.to_string(),
                score_at_prediction: payload.score.clone(),
                minute_at_prediction: payload.minute,
                market_type: payload.market_type.clone(),
                market_value: payload.market_value.clone(),
                raw_payload: match &payload.content {
                    Some(content) => content.clone(),
                    None => serde_json::to_string(payload)?,
                },
            });
        }

        let content = payload.content.as_deref().ok_or_else(|| {
            CoreError::malformed(&payload.external_id, "no content and no team fields")
        })?;
        let decoded = decode_payload(content);
        let parsed = parse_content(&decoded, &payload.external_id).ok_or_else(|| {
            CoreError::malformed(&payload.external_id, "no team names found in content")
        })?;

        let mut prediction = parsed.into_new_prediction(&payload.bot_name, content);
        // Explicit payload fields win over parsed ones
        if payload.league_name.is_some() {
            prediction.league_name = payload.league_name.clone();
        }
        if payload.market_type.is_some() {
            prediction.market_type = payload.market_type.clone();
            prediction.market_value = payload.market_value.clone();
        }
        Ok(prediction)
    }

    /// Ingest one payload.
    ///
    /// Malformed payloads fail before anything is persisted.
    pub async fn ingest(&self, payload: &IngestPayload) -> Result<IngestOutcome> {
        let prediction = self.prepare(payload)?;

        let record = with_timeout(
            self.config.query_timeout,
            "create_prediction",
            self.store.create_prediction(&prediction),
        )
        .await?;

        self.resolve_prediction(&record).await
    }

    /// Resolve a stored prediction and link it if confident enough
    pub async fn resolve_prediction(&self, prediction: &PredictionRecord) -> Result<IngestOutcome> {
        let timeout = self.config.query_timeout;
        let hints = MatchHints::new(
            prediction.minute_at_prediction,
            prediction.score_at_prediction.clone(),
        );

        let lookup = self
            .resolver
            .find_match_by_teams(
                &prediction.home_team_name,
                &prediction.away_team_name,
                &hints,
            )
            .await?;

        let reason = match lookup {
            Some(lookup) if lookup.overall_confidence >= self.config.confidence_floor => {
                let link = with_timeout(
                    timeout,
                    "link_prediction",
                    self.store
                        .link_prediction(&NewMatchLink::from_lookup(prediction.id, &lookup)),
                )
                .await?;
                info!(
                    "Linked prediction {} ({}) to {} at {:.3} [{}]",
                    prediction.external_id,
                    prediction.id,
                    link.match_external_id,
                    link.overall_confidence,
                    link.status.as_str()
                );
                return Ok(IngestOutcome::Linked(link));
            }
            Some(lookup) => format!("low confidence: {:.2}", lookup.overall_confidence),
            None => REASON_NO_MATCH.to_string(),
        };

        with_timeout(
            timeout,
            "mark_pending",
            self.store.mark_pending(prediction.id, &reason),
        )
        .await?;
        warn!(
            "Prediction {} left pending: {} ('{}' vs '{}')",
            prediction.external_id, reason, prediction.home_team_name, prediction.away_team_name
        );

        Ok(IngestOutcome::Pending {
            prediction_id: prediction.id,
            reason,
        })
    }

    /// Ingest payloads in paced groups
    pub async fn ingest_batch(&self, payloads: Vec<IngestPayload>) -> BatchReport {
        run_batch(
            payloads,
            &self.config,
            |p: &IngestPayload| p.external_id.clone(),
            |payload| async move { self.ingest(&payload).await.map(unit_outcome) },
        )
        .await
    }

    /// Retry resolution for up to `limit` pending predictions
    pub async fn process_pending(&self, limit: usize) -> Result<BatchReport> {
        let pending = with_timeout(
            self.config.query_timeout,
            "pending_predictions",
            self.store.pending_predictions(limit),
        )
        .await?;

        Ok(run_batch(
            pending,
            &self.config,
            |p: &PredictionRecord| p.external_id.clone(),
            |prediction| async move {
                self.resolve_prediction(&prediction)
                    .await
                    .map(unit_outcome)
            },
        )
        .await)
    }
}

fn unit_outcome(outcome: IngestOutcome) -> UnitOutcome {
    match outcome {
        IngestOutcome::Linked(_) => UnitOutcome::Linked,
        IngestOutcome::Pending { .. } => UnitOutcome::Pending,
    }
}
