//! In-memory registry and prediction store
//!
//! Implements all three collaborator traits over `parking_lot` locked maps.
//! Used by the test suites and by dry runs of the worker. Every trait method
//! bumps a per-operation call counter so tests can assert which lookups a
//! resolution path actually issued.

use super::{MatchRegistry, NamePattern, PredictionStore, TeamRegistry};
use crate::error::{CoreError, Result};
use crate::models::{
    FinishedMatch, MatchLink, MatchRecord, MatchState, NewMatchLink, NewPrediction,
    PredictionRecord, ScoreData, SettlementResult, TeamRecord,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use rustc_hash::FxHashMap;
use std::cmp::Reverse;
use uuid::Uuid;

#[derive(Debug, Clone)]
struct StoredMatch {
    record: MatchRecord,
    score: ScoreData,
}

#[derive(Default)]
struct Predictions {
    records: Vec<PredictionRecord>,
    links: Vec<MatchLink>,
}

#[derive(Default)]
pub struct InMemoryRegistry {
    teams: RwLock<Vec<TeamRecord>>,
    aliases: RwLock<FxHashMap<String, i64>>,
    matches: RwLock<Vec<StoredMatch>>,
    // One lock so link creation and the processed flip land together
    predictions: Mutex<Predictions>,
    calls: Mutex<FxHashMap<&'static str, usize>>,
}

impl InMemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_team(&self, team: TeamRecord) {
        let mut teams = self.teams.write();
        teams.retain(|t| t.id != team.id);
        teams.push(team);
        teams.sort_by_key(|t| t.id);
    }

    pub fn add_alias(&self, alias: &str, team_id: i64) {
        self.aliases
            .write()
            .insert(alias.trim().to_lowercase(), team_id);
    }

    /// Register a fixture between two known teams
    pub fn add_match(
        &self,
        external_id: &str,
        home_team_id: i64,
        away_team_id: i64,
        match_time: DateTime<Utc>,
        state: MatchState,
    ) {
        let name_of = |id: i64| {
            self.team(id)
                .map(|t| t.name)
                .unwrap_or_else(|| format!("team-{}", id))
        };
        let record = MatchRecord {
            external_id: external_id.to_string(),
            uuid: Uuid::new_v4(),
            home_team_id,
            away_team_id,
            match_time,
            state,
            home_name: name_of(home_team_id),
            away_name: name_of(away_team_id),
        };

        let mut matches = self.matches.write();
        matches.retain(|m| m.record.external_id != external_id);
        matches.push(StoredMatch {
            record,
            score: ScoreData::default(),
        });
    }

    /// Move a fixture to a final state with its score data
    pub fn finish_match(&self, external_id: &str, state: MatchState, score: ScoreData) {
        if let Some(stored) = self
            .matches
            .write()
            .iter_mut()
            .find(|m| m.record.external_id == external_id)
        {
            stored.record.state = state;
            stored.score = score;
        }
    }

    pub fn team(&self, id: i64) -> Option<TeamRecord> {
        self.teams.read().iter().find(|t| t.id == id).cloned()
    }

    pub fn predictions(&self) -> Vec<PredictionRecord> {
        self.predictions.lock().records.clone()
    }

    pub fn links(&self) -> Vec<MatchLink> {
        self.predictions.lock().links.clone()
    }

    /// Number of times a trait operation was called
    pub fn calls(&self, operation: &str) -> usize {
        self.calls.lock().get(operation).copied().unwrap_or(0)
    }

    pub fn reset_calls(&self) {
        self.calls.lock().clear();
    }

    fn record_call(&self, operation: &'static str) {
        *self.calls.lock().entry(operation).or_insert(0) += 1;
    }
}

fn eq_ignore_case(a: &str, b: &str) -> bool {
    a.trim().to_lowercase() == b.trim().to_lowercase()
}

#[async_trait]
impl TeamRegistry for InMemoryRegistry {
    async fn find_by_name(&self, name: &str) -> Result<Option<TeamRecord>> {
        self.record_call("find_by_name");
        Ok(self
            .teams
            .read()
            .iter()
            .find(|t| {
                eq_ignore_case(&t.name, name)
                    || t.short_name.as_deref().is_some_and(|s| eq_ignore_case(s, name))
            })
            .cloned())
    }

    async fn find_by_alias(&self, alias: &str) -> Result<Option<TeamRecord>> {
        self.record_call("find_by_alias");
        let team_id = self.aliases.read().get(&alias.trim().to_lowercase()).copied();
        Ok(team_id.and_then(|id| self.team(id)))
    }

    async fn search_by_tokens(&self, tokens: &[String], limit: usize) -> Result<Vec<TeamRecord>> {
        self.record_call("search_by_tokens");
        let tokens: Vec<String> = tokens.iter().map(|t| t.to_lowercase()).collect();
        Ok(self
            .teams
            .read()
            .iter()
            .filter(|t| {
                let name = t.name.to_lowercase();
                tokens.iter().all(|tok| name.contains(tok.as_str()))
            })
            .take(limit)
            .cloned()
            .collect())
    }

    async fn search_by_patterns(
        &self,
        patterns: &[NamePattern],
        limit: usize,
    ) -> Result<Vec<TeamRecord>> {
        self.record_call("search_by_patterns");
        Ok(self
            .teams
            .read()
            .iter()
            .filter(|t| {
                patterns.iter().any(|p| {
                    p.matches(&t.name) || t.short_name.as_deref().is_some_and(|s| p.matches(s))
                })
            })
            .take(limit)
            .cloned()
            .collect())
    }

    async fn scan(&self, limit: usize) -> Result<Vec<TeamRecord>> {
        self.record_call("scan");
        Ok(self.teams.read().iter().take(limit).cloned().collect())
    }
}

#[async_trait]
impl MatchRegistry for InMemoryRegistry {
    async fn live_matches_for_team(&self, team_id: i64, limit: usize) -> Result<Vec<MatchRecord>> {
        self.record_call("live_matches_for_team");
        let mut live: Vec<MatchRecord> = self
            .matches
            .read()
            .iter()
            .map(|m| &m.record)
            .filter(|m| m.state.is_live())
            .filter(|m| m.home_team_id == team_id || m.away_team_id == team_id)
            .cloned()
            .collect();
        live.sort_by_key(|m| (m.state.live_priority(), Reverse(m.match_time)));
        live.truncate(limit);
        Ok(live)
    }

    async fn finished_match(&self, external_id: &str) -> Result<Option<FinishedMatch>> {
        self.record_call("finished_match");
        Ok(self
            .matches
            .read()
            .iter()
            .find(|m| m.record.external_id == external_id && m.record.state == MatchState::Finished)
            .map(|m| FinishedMatch {
                external_id: m.record.external_id.clone(),
                state: m.record.state,
                score: m.score.clone(),
            }))
    }
}

#[async_trait]
impl PredictionStore for InMemoryRegistry {
    async fn create_prediction(&self, prediction: &NewPrediction) -> Result<PredictionRecord> {
        self.record_call("create_prediction");
        let record = PredictionRecord::from_new(prediction);
        self.predictions.lock().records.push(record.clone());
        Ok(record)
    }

    async fn get_prediction(&self, id: Uuid) -> Result<Option<PredictionRecord>> {
        self.record_call("get_prediction");
        Ok(self
            .predictions
            .lock()
            .records
            .iter()
            .find(|p| p.id == id)
            .cloned())
    }

    async fn link_prediction(&self, link: &NewMatchLink) -> Result<MatchLink> {
        self.record_call("link_prediction");
        let mut store = self.predictions.lock();

        let prediction = store
            .records
            .iter_mut()
            .find(|p| p.id == link.prediction_id && !p.processed)
            .ok_or_else(|| {
                CoreError::NotFound(format!("unprocessed prediction {}", link.prediction_id))
            })?;
        prediction.processed = true;
        prediction.pending_reason = None;

        let created = MatchLink::from_new(link);
        store.links.push(created.clone());
        Ok(created)
    }

    async fn mark_pending(&self, prediction_id: Uuid, reason: &str) -> Result<()> {
        self.record_call("mark_pending");
        let mut store = self.predictions.lock();
        let prediction = store
            .records
            .iter_mut()
            .find(|p| p.id == prediction_id)
            .ok_or_else(|| CoreError::NotFound(format!("prediction {}", prediction_id)))?;
        prediction.pending_reason = Some(reason.to_string());
        Ok(())
    }

    async fn pending_predictions(&self, limit: usize) -> Result<Vec<PredictionRecord>> {
        self.record_call("pending_predictions");
        let mut pending: Vec<PredictionRecord> = self
            .predictions
            .lock()
            .records
            .iter()
            .filter(|p| !p.processed)
            .cloned()
            .collect();
        pending.sort_by_key(|p| p.created_at);
        pending.truncate(limit);
        Ok(pending)
    }

    async fn unsettled_links(&self, limit: usize) -> Result<Vec<MatchLink>> {
        self.record_call("unsettled_links");
        let mut unsettled: Vec<MatchLink> = self
            .predictions
            .lock()
            .links
            .iter()
            .filter(|l| !l.is_settled())
            .cloned()
            .collect();
        unsettled.sort_by_key(|l| l.matched_at);
        unsettled.truncate(limit);
        Ok(unsettled)
    }

    async fn record_settlement(
        &self,
        link_id: Uuid,
        settlement: &SettlementResult,
        final_score: Option<&str>,
    ) -> Result<()> {
        self.record_call("record_settlement");
        let mut store = self.predictions.lock();
        let link = store
            .links
            .iter_mut()
            .find(|l| l.id == link_id && l.outcome.is_none())
            .ok_or_else(|| CoreError::NotFound(format!("unsettled match link {}", link_id)))?;
        link.outcome = Some(settlement.outcome);
        link.final_score = final_score.map(|s| s.to_string());
        link.resolved_at = Some(Utc::now());
        Ok(())
    }
}
