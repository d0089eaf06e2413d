// Shared models for the TipMatch resolution and settlement engine
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub mod market_type;

pub use market_type::MarketType;

// ============================================================================
// Registry Records (read-only to the core)
// ============================================================================

/// Canonical team identity from the sports-data registry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct TeamRecord {
    pub id: i64,
    pub name: String,
    pub short_name: Option<String>,
}

impl TeamRecord {
    pub fn new(id: i64, name: &str, short_name: Option<&str>) -> Self {
        Self {
            id,
            name: name.to_string(),
            short_name: short_name.map(|s| s.to_string()),
        }
    }
}

/// Operator-maintained raw name variant for a team
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct TeamAlias {
    pub alias: String,
    pub team_id: i64,
}

// ============================================================================
// Fixture Lifecycle
// ============================================================================

/// Fixture lifecycle state as reported by the sports-data provider.
///
/// Numeric ids follow the provider's status codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchState {
    Abnormal,
    NotStarted,
    FirstHalf,
    HalfTime,
    SecondHalf,
    Overtime,
    PenaltyShootout,
    Finished,
    Delayed,
    Interrupted,
    Cancelled,
    ToBeDetermined,
}

/// States in which play is in progress
pub const LIVE_STATES: [MatchState; 5] = [
    MatchState::FirstHalf,
    MatchState::HalfTime,
    MatchState::SecondHalf,
    MatchState::Overtime,
    MatchState::PenaltyShootout,
];

impl MatchState {
    pub fn from_id(id: i16) -> Self {
        match id {
            1 => MatchState::NotStarted,
            2 => MatchState::FirstHalf,
            3 => MatchState::HalfTime,
            4 => MatchState::SecondHalf,
            5 | 6 => MatchState::Overtime,
            7 => MatchState::PenaltyShootout,
            8 => MatchState::Finished,
            9 => MatchState::Delayed,
            10 => MatchState::Interrupted,
            12 => MatchState::Cancelled,
            13 => MatchState::ToBeDetermined,
            _ => MatchState::Abnormal,
        }
    }

    pub fn id(&self) -> i16 {
        match self {
            MatchState::Abnormal => 0,
            MatchState::NotStarted => 1,
            MatchState::FirstHalf => 2,
            MatchState::HalfTime => 3,
            MatchState::SecondHalf => 4,
            MatchState::Overtime => 5,
            MatchState::PenaltyShootout => 7,
            MatchState::Finished => 8,
            MatchState::Delayed => 9,
            MatchState::Interrupted => 10,
            MatchState::Cancelled => 12,
            MatchState::ToBeDetermined => 13,
        }
    }

    pub fn is_live(&self) -> bool {
        LIVE_STATES.contains(self)
    }

    /// Ordering key for live candidates: actively playing before half-time.
    /// Non-live states sort last.
    pub fn live_priority(&self) -> u8 {
        match self {
            MatchState::FirstHalf
            | MatchState::SecondHalf
            | MatchState::Overtime
            | MatchState::PenaltyShootout => 0,
            MatchState::HalfTime => 1,
            _ => 2,
        }
    }
}

/// Fixture as returned by the match registry's live query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchRecord {
    pub external_id: String,
    pub uuid: Uuid,
    pub home_team_id: i64,
    pub away_team_id: i64,
    pub match_time: DateTime<Utc>,
    pub state: MatchState,
    pub home_name: String,
    pub away_name: String,
}

impl MatchRecord {
    /// Opponent of `team_id` in this fixture, as (id, name)
    pub fn opponent_of(&self, team_id: i64) -> (i64, &str) {
        if self.home_team_id == team_id {
            (self.away_team_id, &self.away_name)
        } else {
            (self.home_team_id, &self.home_name)
        }
    }
}

/// Score components of a fixture, as stored by the registry.
///
/// Half-time values arrive as raw JSON from the provider and may be absent
/// or non-numeric until the provider fills them in.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreData {
    pub home: Option<i32>,
    pub away: Option<i32>,
    #[serde(default)]
    pub half_time_home: Option<serde_json::Value>,
    #[serde(default)]
    pub half_time_away: Option<serde_json::Value>,
}

impl ScoreData {
    pub fn full_time(home: i32, away: i32) -> Self {
        Self {
            home: Some(home),
            away: Some(away),
            ..Default::default()
        }
    }

    pub fn with_half_time(mut self, home: serde_json::Value, away: serde_json::Value) -> Self {
        self.half_time_home = Some(home);
        self.half_time_away = Some(away);
        self
    }

    /// "H-A" display string, None when either side is missing
    pub fn final_score_string(&self) -> Option<String> {
        match (self.home, self.away) {
            (Some(h), Some(a)) => Some(format!("{}-{}", h, a)),
            _ => None,
        }
    }
}

/// Final data for a fixture the registry considers finished
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinishedMatch {
    pub external_id: String,
    pub state: MatchState,
    pub score: ScoreData,
}

// ============================================================================
// Predictions & Links
// ============================================================================

/// Structured prediction before it is persisted
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewPrediction {
    pub external_id: String,
    pub bot_name: String,
    pub league_name: Option<String>,
    pub home_team_name: String,
    pub away_team_name: String,
    pub score_at_prediction: Option<String>,
    pub minute_at_prediction: Option<i32>,
    pub market_type: Option<String>,
    pub market_value: Option<String>,
    pub raw_payload: String,
}

/// Persisted prediction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct PredictionRecord {
    pub id: Uuid,
    pub external_id: String,
    pub bot_name: String,
    pub league_name: Option<String>,
    pub home_team_name: String,
    pub away_team_name: String,
    pub score_at_prediction: Option<String>,
    pub minute_at_prediction: Option<i32>,
    pub market_type: Option<String>,
    pub market_value: Option<String>,
    pub raw_payload: String,
    pub processed: bool,
    pub pending_reason: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl PredictionRecord {
    /// Build the persisted form of a new prediction (unprocessed)
    pub fn from_new(new: &NewPrediction) -> Self {
        Self {
            id: Uuid::new_v4(),
            external_id: new.external_id.clone(),
            bot_name: new.bot_name.clone(),
            league_name: new.league_name.clone(),
            home_team_name: new.home_team_name.clone(),
            away_team_name: new.away_team_name.clone(),
            score_at_prediction: new.score_at_prediction.clone(),
            minute_at_prediction: new.minute_at_prediction,
            market_type: new.market_type.clone(),
            market_value: new.market_value.clone(),
            raw_payload: new.raw_payload.clone(),
            processed: false,
            pending_reason: None,
            created_at: Utc::now(),
        }
    }

    pub fn market(&self) -> MarketType {
        MarketType::from_parts(self.market_type.as_deref(), self.market_value.as_deref())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkStatus {
    /// Linked through a confident team and opponent resolution
    Matched,
    /// Linked through the first-candidate fallback; may point at the wrong fixture
    Degraded,
}

impl LinkStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LinkStatus::Matched => "matched",
            LinkStatus::Degraded => "degraded",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "degraded" => LinkStatus::Degraded,
            _ => LinkStatus::Matched,
        }
    }
}

/// Link to be created between a prediction and a fixture
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewMatchLink {
    pub prediction_id: Uuid,
    pub match_external_id: String,
    pub home_confidence: f64,
    pub away_confidence: f64,
    pub overall_confidence: f64,
    pub status: LinkStatus,
}

impl NewMatchLink {
    pub fn from_lookup(prediction_id: Uuid, lookup: &MatchLookupResult) -> Self {
        Self {
            prediction_id,
            match_external_id: lookup.match_external_id.clone(),
            home_confidence: lookup.home.confidence,
            away_confidence: lookup.away.confidence,
            overall_confidence: lookup.overall_confidence,
            status: if lookup.degraded {
                LinkStatus::Degraded
            } else {
                LinkStatus::Matched
            },
        }
    }
}

/// Persisted prediction-to-fixture link
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchLink {
    pub id: Uuid,
    pub prediction_id: Uuid,
    pub match_external_id: String,
    pub home_confidence: f64,
    pub away_confidence: f64,
    pub overall_confidence: f64,
    pub status: LinkStatus,
    pub matched_at: DateTime<Utc>,
    // Settlement fields, filled once the fixture finishes
    pub outcome: Option<Outcome>,
    pub final_score: Option<String>,
    pub resolved_at: Option<DateTime<Utc>>,
}

impl MatchLink {
    pub fn from_new(new: &NewMatchLink) -> Self {
        Self {
            id: Uuid::new_v4(),
            prediction_id: new.prediction_id,
            match_external_id: new.match_external_id.clone(),
            home_confidence: new.home_confidence,
            away_confidence: new.away_confidence,
            overall_confidence: new.overall_confidence,
            status: new.status,
            matched_at: Utc::now(),
            outcome: None,
            final_score: None,
            resolved_at: None,
        }
    }

    pub fn is_settled(&self) -> bool {
        self.outcome.is_some()
    }
}

// ============================================================================
// Resolution Results (transient)
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchMethod {
    Exact,
    Normalized,
    Fuzzy,
    Partial,
}

impl MatchMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchMethod::Exact => "exact",
            MatchMethod::Normalized => "normalized",
            MatchMethod::Fuzzy => "fuzzy",
            MatchMethod::Partial => "partial",
        }
    }
}

/// Result of resolving one raw team name
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamMatchResult {
    pub team_id: i64,
    pub team_name: String,
    pub confidence: f64,
    pub method: MatchMethod,
}

impl TeamMatchResult {
    pub fn new(team: &TeamRecord, confidence: f64, method: MatchMethod) -> Self {
        Self {
            team_id: team.id,
            team_name: team.name.clone(),
            confidence: confidence.clamp(0.0, 1.0),
            method,
        }
    }

    pub fn exact(team: &TeamRecord) -> Self {
        Self::new(team, 1.0, MatchMethod::Exact)
    }
}

/// Which side of the prediction anchored the fixture lookup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnchorSide {
    Home,
    Away,
}

/// Result of resolving a prediction to a live fixture
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchLookupResult {
    pub match_external_id: String,
    pub match_uuid: Uuid,
    pub home: TeamMatchResult,
    pub away: TeamMatchResult,
    pub overall_confidence: f64,
    pub match_time: DateTime<Utc>,
    pub state: MatchState,
    pub anchor: AnchorSide,
    /// True when no opponent cleared the floor and the first candidate was taken
    pub degraded: bool,
}

// ============================================================================
// Settlement
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Outcome {
    Won,
    Lost,
    Void,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Won => "WON",
            Outcome::Lost => "LOST",
            Outcome::Void => "VOID",
        }
    }

    /// Lowercase status string used for persistence
    pub fn to_status(&self) -> String {
        self.as_str().to_lowercase()
    }

    pub fn from_status(status: &str) -> Option<Self> {
        match status.to_ascii_lowercase().as_str() {
            "won" => Some(Outcome::Won),
            "lost" => Some(Outcome::Lost),
            "void" => Some(Outcome::Void),
            _ => None,
        }
    }
}

/// Outcome of evaluating one market against a finished fixture
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettlementResult {
    pub outcome: Outcome,
    /// Human-readable rule that was applied
    pub rule: String,
    /// Machine-readable reason, set for VOID outcomes
    pub reason: Option<String>,
    /// Score data the decision was based on
    pub snapshot: serde_json::Value,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_match_state_ids_roundtrip_for_known_states() {
        for state in [
            MatchState::NotStarted,
            MatchState::FirstHalf,
            MatchState::HalfTime,
            MatchState::SecondHalf,
            MatchState::Overtime,
            MatchState::PenaltyShootout,
            MatchState::Finished,
            MatchState::Cancelled,
        ] {
            assert_eq!(MatchState::from_id(state.id()), state);
        }
        assert_eq!(MatchState::from_id(42), MatchState::Abnormal);
    }

    #[test]
    fn test_live_states() {
        assert!(MatchState::HalfTime.is_live());
        assert!(MatchState::PenaltyShootout.is_live());
        assert!(!MatchState::NotStarted.is_live());
        assert!(!MatchState::Finished.is_live());
        assert!(MatchState::SecondHalf.live_priority() < MatchState::HalfTime.live_priority());
    }

    #[test]
    fn test_opponent_of() {
        let record = MatchRecord {
            external_id: "m1".to_string(),
            uuid: Uuid::new_v4(),
            home_team_id: 1,
            away_team_id: 2,
            match_time: Utc::now(),
            state: MatchState::FirstHalf,
            home_name: "Real Madrid".to_string(),
            away_name: "Barcelona".to_string(),
        };
        assert_eq!(record.opponent_of(1), (2, "Barcelona"));
        assert_eq!(record.opponent_of(2), (1, "Real Madrid"));
    }

    #[test]
    fn test_outcome_status() {
        assert_eq!(Outcome::Won.to_status(), "won");
        assert_eq!(Outcome::Void.to_status(), "void");
        assert_eq!(Outcome::from_status("LOST"), Some(Outcome::Lost));
        assert_eq!(Outcome::from_status("pending"), None);
    }

    #[test]
    fn test_team_match_result_clamps_confidence() {
        let team = TeamRecord::new(7, "Galatasaray", Some("GS"));
        let result = TeamMatchResult::new(&team, 1.3, MatchMethod::Fuzzy);
        assert_eq!(result.confidence, 1.0);
    }

    #[test]
    fn test_final_score_string() {
        assert_eq!(ScoreData::full_time(2, 1).final_score_string().as_deref(), Some("2-1"));
        assert_eq!(ScoreData::default().final_score_string(), None);
    }
}
