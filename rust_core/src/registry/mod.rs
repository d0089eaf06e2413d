//! Collaborator abstractions
//!
//! The engine never talks to a database or HTTP API directly. It consumes
//! three narrow contracts:
//! - `TeamRegistry`: canonical teams and operator-maintained aliases
//! - `MatchRegistry`: live fixtures and final scores
//! - `PredictionStore`: predictions, links and settlement results
//!
//! Postgres implementations live in `crate::db`; `memory::InMemoryRegistry`
//! implements all three for tests and dry runs.

use crate::error::{CoreError, Result};
use crate::models::{
    FinishedMatch, MatchLink, MatchRecord, NewMatchLink, NewPrediction, PredictionRecord,
    SettlementResult, TeamRecord,
};
use async_trait::async_trait;
use std::future::Future;
use std::time::Duration;
use uuid::Uuid;

pub mod memory;

pub use memory::InMemoryRegistry;

/// Case-insensitive name pattern for bounded candidate searches
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NamePattern {
    /// Name starts with the given text
    Prefix(String),
    /// Name contains the given text anywhere
    Contains(String),
}

impl NamePattern {
    pub fn matches(&self, name: &str) -> bool {
        let name = name.to_lowercase();
        match self {
            NamePattern::Prefix(p) => name.starts_with(&p.to_lowercase()),
            NamePattern::Contains(p) => name.contains(&p.to_lowercase()),
        }
    }

    /// SQL ILIKE form of the pattern
    pub fn to_like(&self) -> String {
        match self {
            NamePattern::Prefix(p) => format!("{}%", escape_like(p)),
            NamePattern::Contains(p) => format!("%{}%", escape_like(p)),
        }
    }
}

/// Escape LIKE wildcards so user text matches literally
pub fn escape_like(s: &str) -> String {
    s.replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_")
}

/// Canonical team registry (read-only)
#[async_trait]
pub trait TeamRegistry: Send + Sync {
    /// Exact case-insensitive match on canonical or short name
    async fn find_by_name(&self, name: &str) -> Result<Option<TeamRecord>>;

    /// Exact case-insensitive alias lookup
    async fn find_by_alias(&self, alias: &str) -> Result<Option<TeamRecord>>;

    /// Teams whose name contains every token, at most `limit`
    async fn search_by_tokens(&self, tokens: &[String], limit: usize) -> Result<Vec<TeamRecord>>;

    /// Teams whose name or short name matches any pattern, at most `limit`
    async fn search_by_patterns(
        &self,
        patterns: &[NamePattern],
        limit: usize,
    ) -> Result<Vec<TeamRecord>>;

    /// Bounded scan of the registry, last-resort candidate source
    async fn scan(&self, limit: usize) -> Result<Vec<TeamRecord>>;
}

/// Fixture registry (read-only)
#[async_trait]
pub trait MatchRegistry: Send + Sync {
    /// Live fixtures where the team plays home or away, actively playing
    /// states first, then most recent kickoff
    async fn live_matches_for_team(&self, team_id: i64, limit: usize) -> Result<Vec<MatchRecord>>;

    /// Final data for a fixture, `None` until the fixture is finished
    async fn finished_match(&self, external_id: &str) -> Result<Option<FinishedMatch>>;
}

/// Prediction persistence
#[async_trait]
pub trait PredictionStore: Send + Sync {
    /// Persist a new, unprocessed prediction
    async fn create_prediction(&self, prediction: &NewPrediction) -> Result<PredictionRecord>;

    async fn get_prediction(&self, id: Uuid) -> Result<Option<PredictionRecord>>;

    /// Create the link and flip the prediction to processed in one atomic unit
    async fn link_prediction(&self, link: &NewMatchLink) -> Result<MatchLink>;

    /// Record why a prediction is still unprocessed
    async fn mark_pending(&self, prediction_id: Uuid, reason: &str) -> Result<()>;

    /// Unprocessed predictions, oldest first
    async fn pending_predictions(&self, limit: usize) -> Result<Vec<PredictionRecord>>;

    /// Links without a settlement outcome, oldest first
    async fn unsettled_links(&self, limit: usize) -> Result<Vec<MatchLink>>;

    /// Write the settlement outcome onto a link
    async fn record_settlement(
        &self,
        link_id: Uuid,
        settlement: &SettlementResult,
        final_score: Option<&str>,
    ) -> Result<()>;
}

/// Run a collaborator call under a deadline.
///
/// An elapsed deadline drops the inner future, so a timed-out transaction is
/// never committed.
pub async fn with_timeout<T, F>(timeout: Duration, operation: &str, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(timeout, fut).await {
        Ok(result) => result,
        Err(_) => Err(CoreError::Timeout {
            operation: operation.to_string(),
            timeout_ms: timeout.as_millis() as u64,
        }),
    }
}
