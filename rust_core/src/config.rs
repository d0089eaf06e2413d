//! Engine configuration
//!
//! One `CoreConfig` is built at startup and shared by the team resolver, the
//! match resolver, the ingestor and the batch runners, so the confidence
//! floor cannot drift between layers.

use crate::matching::qualifier::QualifierWeights;
use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Minimum confidence for a team resolution or a fixture link
pub const DEFAULT_CONFIDENCE_FLOOR: f64 = 0.6;

/// Candidate cap for the token-anchored search
pub const DEFAULT_TOKEN_CANDIDATE_LIMIT: usize = 20;

/// Candidate cap for the prefix/substring fallback
pub const DEFAULT_PREFIX_CANDIDATE_LIMIT: usize = 50;

/// Last-resort registry scan size
pub const DEFAULT_SCAN_LIMIT: usize = 1000;

/// Live fixtures considered per anchored team
pub const DEFAULT_LIVE_MATCH_LIMIT: usize = 5;

/// Multiplier applied to the anchor confidence when no opponent clears the floor
pub const DEFAULT_DEGRADED_FACTOR: f64 = 0.8;

#[derive(Debug, Clone)]
pub struct CoreConfig {
    pub confidence_floor: f64,
    pub token_candidate_limit: usize,
    pub prefix_candidate_limit: usize,
    pub scan_limit: usize,
    pub live_match_limit: usize,
    pub degraded_factor: f64,
    /// Upper bound for every registry lookup and store write
    pub query_timeout: Duration,
    /// Units processed concurrently per batch group
    pub batch_size: usize,
    /// Pause between batch groups
    pub batch_pause: Duration,
    pub qualifier_weights: QualifierWeights,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            confidence_floor: DEFAULT_CONFIDENCE_FLOOR,
            token_candidate_limit: DEFAULT_TOKEN_CANDIDATE_LIMIT,
            prefix_candidate_limit: DEFAULT_PREFIX_CANDIDATE_LIMIT,
            scan_limit: DEFAULT_SCAN_LIMIT,
            live_match_limit: DEFAULT_LIVE_MATCH_LIMIT,
            degraded_factor: DEFAULT_DEGRADED_FACTOR,
            query_timeout: Duration::from_secs(5),
            batch_size: 5,
            batch_pause: Duration::from_millis(500),
            qualifier_weights: QualifierWeights::default(),
        }
    }
}

impl CoreConfig {
    /// Load configuration from environment variables with defaults
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            confidence_floor: env_parse("TIPMATCH_CONFIDENCE_FLOOR")
                .unwrap_or(defaults.confidence_floor)
                .clamp(0.0, 1.0),
            token_candidate_limit: env_parse("TIPMATCH_TOKEN_CANDIDATE_LIMIT")
                .unwrap_or(defaults.token_candidate_limit),
            prefix_candidate_limit: env_parse("TIPMATCH_PREFIX_CANDIDATE_LIMIT")
                .unwrap_or(defaults.prefix_candidate_limit),
            scan_limit: env_parse("TIPMATCH_SCAN_LIMIT").unwrap_or(defaults.scan_limit),
            live_match_limit: env_parse("TIPMATCH_LIVE_MATCH_LIMIT")
                .unwrap_or(defaults.live_match_limit),
            degraded_factor: env_parse("TIPMATCH_DEGRADED_FACTOR")
                .unwrap_or(defaults.degraded_factor)
                .clamp(0.0, 1.0),
            query_timeout: env_parse("TIPMATCH_QUERY_TIMEOUT_MS")
                .map(Duration::from_millis)
                .unwrap_or(defaults.query_timeout),
            batch_size: env_parse::<usize>("TIPMATCH_BATCH_SIZE")
                .unwrap_or(defaults.batch_size)
                .max(1),
            batch_pause: env_parse("TIPMATCH_BATCH_PAUSE_MS")
                .map(Duration::from_millis)
                .unwrap_or(defaults.batch_pause),
            qualifier_weights: QualifierWeights::from_env(),
        }
    }

    /// Configuration with a different confidence floor
    pub fn with_confidence_floor(mut self, floor: f64) -> Self {
        self.confidence_floor = floor.clamp(0.0, 1.0);
        self
    }

    pub fn with_batch(mut self, size: usize, pause: Duration) -> Self {
        self.batch_size = size.max(1);
        self.batch_pause = pause;
        self
    }
}

pub(crate) fn env_parse<T: FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|v| v.trim().parse().ok())
}
