//! TipMatch Core - prediction-to-match resolution and settlement.
//!
//! This crate provides:
//! - Team name normalization and similarity scoring
//! - Alias and fuzzy team resolution with qualifier-aware weighting
//! - Live fixture disambiguation through ordered anchor strategies
//! - Bot payload decoding, parsing and ingestion
//! - Deterministic WON/LOST/VOID settlement of finished fixtures
//! - Paced batch processing of pending predictions and unsettled links
//! - Postgres and in-memory implementations of the collaborator traits

pub mod config;
pub mod db;
pub mod error;
pub mod ingest;
pub mod matching;
pub mod models;
pub mod registry;
pub mod settlement;
pub mod utils;

use std::sync::Arc;

pub use config::CoreConfig;
pub use error::{CoreError, Result};
pub use ingest::{BatchReport, IngestOutcome, IngestPayload, Ingestor};
pub use matching::{MatchHints, MatchResolver, TeamResolver};
pub use models::*;
pub use registry::{InMemoryRegistry, MatchRegistry, PredictionStore, TeamRegistry};
pub use settlement::{evaluate, outcome_to_status, Settler};

/// Fully wired engine: resolvers, ingestor and settler sharing one config
pub struct Engine {
    pub config: Arc<CoreConfig>,
    pub teams: Arc<TeamResolver>,
    pub matches: Arc<MatchResolver>,
    pub ingestor: Ingestor,
    pub settler: Settler,
}

impl Engine {
    pub fn new(
        team_registry: Arc<dyn TeamRegistry>,
        match_registry: Arc<dyn MatchRegistry>,
        store: Arc<dyn PredictionStore>,
        config: CoreConfig,
    ) -> Self {
        let config = Arc::new(config);
        let teams = Arc::new(TeamResolver::new(team_registry, config.clone()));
        let matches = Arc::new(MatchResolver::new(
            teams.clone(),
            match_registry.clone(),
            config.clone(),
        ));
        let ingestor = Ingestor::new(matches.clone(), store.clone(), config.clone());
        let settler = Settler::new(match_registry, store, config.clone());

        Self {
            config,
            teams,
            matches,
            ingestor,
            settler,
        }
    }

    /// Engine over a single in-memory registry
    pub fn in_memory(registry: Arc<InMemoryRegistry>, config: CoreConfig) -> Self {
        Self::new(registry.clone(), registry.clone(), registry, config)
    }
}
