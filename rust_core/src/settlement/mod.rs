//! Settlement Rule Engine
//!
//! Pure evaluation of a market against a finished fixture's score. No
//! outcome is ever inferred from data that is not there: a missing or
//! invalid datum settles VOID with a reason code.

use crate::models::{MarketType, Outcome, ScoreData, SettlementResult};
use serde_json::{json, Value};

pub mod settler;

pub use settler::Settler;

pub const REASON_SCORE_DATA_MISSING: &str = "SCORE_DATA_MISSING";
pub const REASON_INVALID_SCORE: &str = "INVALID_SCORE";
pub const REASON_HT_DATA_MISSING: &str = "HT_DATA_MISSING";
pub const REASON_UNKNOWN_MARKET: &str = "UNKNOWN_MARKET";

/// Evaluate a market against final score data
pub fn evaluate(market: &MarketType, score: &ScoreData) -> SettlementResult {
    let snapshot = snapshot(score);

    match market {
        MarketType::Unknown { label } => void(
            format!("unknown market '{}'", label),
            REASON_UNKNOWN_MARKET,
            snapshot,
        ),
        MarketType::HalfTimeOver05 => {
            let (Some(ht_home), Some(ht_away)) = (
                half_time_goals(score.half_time_home.as_ref()),
                half_time_goals(score.half_time_away.as_ref()),
            ) else {
                return void("ht_home + ht_away >= 1", REASON_HT_DATA_MISSING, snapshot);
            };
            if ht_home < 0 || ht_away < 0 {
                return void("ht_home + ht_away >= 1", REASON_INVALID_SCORE, snapshot);
            }
            decided(ht_home + ht_away >= 1, "ht_home + ht_away >= 1", snapshot)
        }
        full_time => {
            let (Some(home), Some(away)) = (score.home, score.away) else {
                return void(full_time_rule(full_time), REASON_SCORE_DATA_MISSING, snapshot);
            };
            if home < 0 || away < 0 {
                return void(full_time_rule(full_time), REASON_INVALID_SCORE, snapshot);
            }

            let won = match full_time {
                MarketType::BothTeamsScore => home > 0 && away > 0,
                MarketType::Over25 => home + away >= 3,
                MarketType::Over15 => home + away >= 2,
                MarketType::HomeWin => home > away,
                MarketType::Draw => home == away,
                MarketType::AwayWin => away > home,
                MarketType::HalfTimeOver05 | MarketType::Unknown { .. } => false,
            };
            decided(won, full_time_rule(full_time), snapshot)
        }
    }
}

/// Lowercase persistence form of an outcome
pub fn outcome_to_status(outcome: Outcome) -> String {
    outcome.to_status()
}

fn full_time_rule(market: &MarketType) -> &'static str {
    match market {
        MarketType::BothTeamsScore => "home > 0 && away > 0",
        MarketType::Over25 => "home + away >= 3",
        MarketType::Over15 => "home + away >= 2",
        MarketType::HomeWin => "home > away",
        MarketType::Draw => "home == away",
        MarketType::AwayWin => "away > home",
        MarketType::HalfTimeOver05 => "ht_home + ht_away >= 1",
        MarketType::Unknown { .. } => "none",
    }
}

/// Half-time goals from the provider's raw JSON value: a whole number, as
/// JSON or as a numeric string ("1", "1.0"). Anything else counts as missing.
fn half_time_goals(value: Option<&Value>) -> Option<i64> {
    let goals = match value? {
        Value::Number(n) => n.as_i64().map(|g| g as f64).or_else(|| n.as_f64())?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    (goals.is_finite() && goals.fract() == 0.0).then(|| goals as i64)
}

fn snapshot(score: &ScoreData) -> Value {
    json!({
        "home": score.home,
        "away": score.away,
        "half_time_home": score.half_time_home,
        "half_time_away": score.half_time_away,
    })
}

fn decided(won: bool, rule: impl Into<String>, snapshot: Value) -> SettlementResult {
    SettlementResult {
        outcome: if won { Outcome::Won } else { Outcome::Lost },
        rule: rule.into(),
        reason: None,
        snapshot,
    }
}

fn void(rule: impl Into<String>, reason: &str, snapshot: Value) -> SettlementResult {
    SettlementResult {
        outcome: Outcome::Void,
        rule: rule.into(),
        reason: Some(reason.to_string()),
        snapshot,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(market: MarketType, score: ScoreData) -> (Outcome, Option<String>) {
        let result = evaluate(&market, &score);
        (result.outcome, result.reason)
    }

    #[test]
    fn test_both_teams_score() {
        let m = || MarketType::BothTeamsScore;
        assert_eq!(outcome(m(), ScoreData::full_time(3, 1)).0, Outcome::Won);
        assert_eq!(outcome(m(), ScoreData::full_time(1, 0)).0, Outcome::Lost);
        assert_eq!(outcome(m(), ScoreData::full_time(0, 0)).0, Outcome::Lost);
        assert_eq!(
            outcome(m(), ScoreData::full_time(2, -1)),
            (Outcome::Void, Some(REASON_INVALID_SCORE.to_string()))
        );
    }

    #[test]
    fn test_over_lines() {
        assert_eq!(outcome(MarketType::Over25, ScoreData::full_time(2, 1)).0, Outcome::Won);
        assert_eq!(outcome(MarketType::Over25, ScoreData::full_time(1, 1)).0, Outcome::Lost);
        assert_eq!(outcome(MarketType::Over15, ScoreData::full_time(2, 0)).0, Outcome::Won);
        assert_eq!(outcome(MarketType::Over15, ScoreData::full_time(0, 1)).0, Outcome::Lost);
    }

    #[test]
    fn test_full_time_result() {
        let score = ScoreData::full_time(1, 0);
        assert_eq!(outcome(MarketType::HomeWin, score.clone()).0, Outcome::Won);
        assert_eq!(outcome(MarketType::Draw, score.clone()).0, Outcome::Lost);
        assert_eq!(outcome(MarketType::AwayWin, score).0, Outcome::Lost);
        assert_eq!(outcome(MarketType::Draw, ScoreData::full_time(2, 2)).0, Outcome::Won);
    }

    #[test]
    fn test_missing_full_time_score_is_void() {
        let score = ScoreData {
            home: Some(1),
            ..Default::default()
        };
        assert_eq!(
            outcome(MarketType::Over25, score),
            (Outcome::Void, Some(REASON_SCORE_DATA_MISSING.to_string()))
        );
    }

    #[test]
    fn test_half_time_over() {
        let base = ScoreData::full_time(2, 0);
        assert_eq!(
            outcome(MarketType::HalfTimeOver05, base.clone().with_half_time(json!(1), json!(0))).0,
            Outcome::Won
        );
        assert_eq!(
            outcome(MarketType::HalfTimeOver05, base.clone().with_half_time(json!("0"), json!("0")))
                .0,
            Outcome::Lost
        );
        assert_eq!(
            outcome(MarketType::HalfTimeOver05, base.clone()),
            (Outcome::Void, Some(REASON_HT_DATA_MISSING.to_string()))
        );
        assert_eq!(
            outcome(MarketType::HalfTimeOver05, base.with_half_time(json!("-"), json!(null))),
            (Outcome::Void, Some(REASON_HT_DATA_MISSING.to_string()))
        );
    }

    #[test]
    fn test_half_time_whole_floats() {
        let base = ScoreData::full_time(2, 0);
        let ht = |h: Value, a: Value| {
            outcome(MarketType::HalfTimeOver05, base.clone().with_half_time(h, a))
        };

        assert_eq!(ht(json!(1.0), json!(0.0)), (Outcome::Won, None));
        assert_eq!(ht(json!(0.0), json!("0.0")), (Outcome::Lost, None));
        assert_eq!(ht(json!(" 1.0 "), json!(0)), (Outcome::Won, None));
        assert_eq!(
            ht(json!(0.5), json!(0)),
            (Outcome::Void, Some(REASON_HT_DATA_MISSING.to_string()))
        );
        assert_eq!(
            ht(json!(-1.0), json!(0)),
            (Outcome::Void, Some(REASON_INVALID_SCORE.to_string()))
        );
    }

    #[test]
    fn test_unknown_market_is_void() {
        let market = MarketType::parse("Corners over 9.5");
        let result = evaluate(&market, &ScoreData::full_time(1, 1));
        assert_eq!(result.outcome, Outcome::Void);
        assert_eq!(result.reason.as_deref(), Some(REASON_UNKNOWN_MARKET));
    }

    #[test]
    fn test_snapshot_carries_score() {
        let result = evaluate(&MarketType::Over15, &ScoreData::full_time(1, 2));
        assert_eq!(result.snapshot["home"], json!(1));
        assert_eq!(result.snapshot["away"], json!(2));
        assert_eq!(outcome_to_status(result.outcome), "won");
    }
}
