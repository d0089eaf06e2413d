//! Resolution Abstractions
//!
//! Team resolution (`team`), qualifier weighting (`qualifier`) and fixture
//! resolution (`fixture`). Fixture resolution is an ordered list of
//! `ResolutionStrategy` implementations tried one after another until one
//! finds a fixture.

use crate::error::Result;
use crate::models::MatchLookupResult;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub mod fixture;
pub mod qualifier;
pub mod team;

pub use fixture::{AnchorStrategy, MatchResolver};
pub use qualifier::{QualifierKind, QualifierWeights};
pub use team::TeamResolver;

/// Context the bot reported alongside the team names.
///
/// Carried through resolution for logging; fixture selection does not use it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MatchHints {
    pub minute: Option<i32>,
    pub score: Option<String>,
}

impl MatchHints {
    pub fn new(minute: Option<i32>, score: Option<String>) -> Self {
        Self { minute, score }
    }
}

/// Result of one resolution strategy
#[derive(Debug, Clone, PartialEq)]
pub enum StrategyOutcome {
    Found(MatchLookupResult),
    NotFound,
}

/// One way of turning a pair of raw team names into a live fixture
#[async_trait]
pub trait ResolutionStrategy: Send + Sync {
    /// Strategy name for logging
    fn name(&self) -> &'static str;

    async fn attempt(
        &self,
        home_name: &str,
        away_name: &str,
        hints: &MatchHints,
    ) -> Result<StrategyOutcome>;
}
