//! Prediction content parser
//!
//! Bots publish in three shapes, tried in order:
//! 1. JSON object with team fields
//! 2. `Teams | Score | Minute | League | Prediction`
//! 3. Bare `Home - Away`

use crate::models::NewPrediction;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::OnceLock;
use tracing::debug;

/// Structured fields extracted from one bot message
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParsedPrediction {
    pub external_id: String,
    pub home_team: String,
    pub away_team: String,
    pub score: Option<String>,
    pub minute: Option<i32>,
    pub league: Option<String>,
    pub market_type: Option<String>,
    pub market_value: Option<String>,
}

impl ParsedPrediction {
    pub fn into_new_prediction(self, bot_name: &str, raw_payload: &str) -> NewPrediction {
        NewPrediction {
            external_id: self.external_id,
            bot_name: bot_name.to_string(),
            league_name: self.league,
            home_team_name: self.home_team,
            away_team_name: self.away_team,
            score_at_prediction: self.score,
            minute_at_prediction: self.minute,
            market_type: self.market_type,
            market_value: self.market_value,
            raw_payload: raw_payload.to_string(),
        }
    }
}

const HOME_KEYS: &[&str] = &["home_team", "homeTeam", "home", "home_team_name"];
const AWAY_KEYS: &[&str] = &["away_team", "awayTeam", "away", "away_team_name"];
const TEXT_KEYS: &[&str] = &["content", "text", "message"];

fn team_separator_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)\s+(?:-|–|vs\.?|v)\s+").expect("static regex"))
}

fn digits_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\d+").expect("static regex"))
}

/// Parse bot content into structured fields, `None` when no shape matches
pub fn parse_content(content: &str, external_id: &str) -> Option<ParsedPrediction> {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        return None;
    }

    // A well-formed JSON object is only read as a record; anything else falls
    // through the text formats in turn
    let parsed = match serde_json::from_str::<Value>(trimmed) {
        Ok(Value::Object(obj)) => parse_json(&obj, external_id),
        _ => parse_pipe(trimmed, external_id).or_else(|| parse_bare(trimmed, external_id)),
    };

    if parsed.is_none() {
        debug!("Unparseable content for {}: {:?}", external_id, trimmed);
    }
    parsed
}

fn parse_json(obj: &Map<String, Value>, external_id: &str) -> Option<ParsedPrediction> {
    match (string_field(obj, HOME_KEYS), string_field(obj, AWAY_KEYS)) {
        (Some(home_team), Some(away_team)) => Some(ParsedPrediction {
            external_id: external_id.to_string(),
            home_team,
            away_team,
            score: string_field(obj, &["score", "current_score"]),
            minute: obj.get("minute").and_then(minute_value),
            league: string_field(obj, &["league", "league_name"]),
            market_type: string_field(obj, &["prediction", "market", "market_type"]),
            market_value: string_field(obj, &["market_value", "value"]),
        }),
        // Envelope around a text message
        _ => string_field(obj, TEXT_KEYS).and_then(|text| {
            if text.trim_start().starts_with('{') {
                None
            } else {
                parse_content(&text, external_id)
            }
        }),
    }
}

fn parse_pipe(content: &str, external_id: &str) -> Option<ParsedPrediction> {
    content
        .lines()
        .filter(|l| l.contains('|'))
        .find_map(|line| parse_pipe_line(line, external_id))
}

fn parse_pipe_line(line: &str, external_id: &str) -> Option<ParsedPrediction> {
    let parts: Vec<&str> = line.split('|').map(str::trim).collect();
    let (home_team, away_team) = split_teams(parts.first()?)?;

    let field = |i: usize| {
        parts
            .get(i)
            .filter(|s| !s.is_empty())
            .map(|s| s.to_string())
    };

    Some(ParsedPrediction {
        external_id: external_id.to_string(),
        home_team,
        away_team,
        score: field(1),
        minute: field(2).as_deref().and_then(parse_minute),
        league: field(3),
        market_type: field(4),
        market_value: None,
    })
}

/// First line without pipes that holds a team pair
fn parse_bare(content: &str, external_id: &str) -> Option<ParsedPrediction> {
    let (home_team, away_team) = content
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.contains('|'))
        .find_map(split_teams)?;
    Some(ParsedPrediction {
        external_id: external_id.to_string(),
        home_team,
        away_team,
        ..Default::default()
    })
}

/// Split "Home - Away" / "Home vs Away"; a bare hyphen is the last resort
fn split_teams(teams: &str) -> Option<(String, String)> {
    let mut parts = team_separator_regex().splitn(teams, 2);
    let (home, away) = match (parts.next(), parts.next()) {
        (Some(h), Some(a)) => (h, a),
        _ => teams.split_once('-')?,
    };

    let (home, away) = (home.trim(), away.trim());
    if home.is_empty() || away.is_empty() {
        return None;
    }
    Some((home.to_string(), away.to_string()))
}

/// First run of digits: "23", "23'" and "45+2" give 23, 23 and 45
fn parse_minute(text: &str) -> Option<i32> {
    digits_regex().find(text)?.as_str().parse().ok()
}

fn minute_value(value: &Value) -> Option<i32> {
    match value {
        Value::Number(n) => n.as_i64().and_then(|m| i32::try_from(m).ok()),
        Value::String(s) => parse_minute(s),
        _ => None,
    }
}

fn string_field(obj: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| match obj.get(*key)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pipe_format() {
        let parsed =
            parse_content("Real Madrid - Barcelona | 1-0 | 23 | La Liga | MS 1", "tip-1").unwrap();
        assert_eq!(parsed.home_team, "Real Madrid");
        assert_eq!(parsed.away_team, "Barcelona");
        assert_eq!(parsed.score.as_deref(), Some("1-0"));
        assert_eq!(parsed.minute, Some(23));
        assert_eq!(parsed.league.as_deref(), Some("La Liga"));
        assert_eq!(parsed.market_type.as_deref(), Some("MS 1"));
        assert_eq!(parsed.external_id, "tip-1");
    }

    #[test]
    fn test_pipe_format_with_vs_and_sparse_fields() {
        let parsed = parse_content("Arsenal vs Chelsea | | 45+2' |", "tip-2").unwrap();
        assert_eq!(parsed.home_team, "Arsenal");
        assert_eq!(parsed.away_team, "Chelsea");
        assert_eq!(parsed.score, None);
        assert_eq!(parsed.minute, Some(45));
        assert_eq!(parsed.league, None);
    }

    #[test]
    fn test_hyphenated_team_names() {
        let parsed = parse_content("Paris Saint-Germain - Lyon", "tip-3").unwrap();
        assert_eq!(parsed.home_team, "Paris Saint-Germain");
        assert_eq!(parsed.away_team, "Lyon");

        let tight = parse_content("Galatasaray-Fenerbahce", "tip-4").unwrap();
        assert_eq!(tight.home_team, "Galatasaray");
        assert_eq!(tight.away_team, "Fenerbahce");
    }

    #[test]
    fn test_json_format() {
        let content = r#"{"home_team":"Ajax","away_team":"PSV","minute":"67","score":"1-1","league":"Eredivisie","prediction":"2.5 ÜST"}"#;
        let parsed = parse_content(content, "tip-5").unwrap();
        assert_eq!(parsed.home_team, "Ajax");
        assert_eq!(parsed.away_team, "PSV");
        assert_eq!(parsed.minute, Some(67));
        assert_eq!(parsed.market_type.as_deref(), Some("2.5 ÜST"));
    }

    #[test]
    fn test_json_envelope_with_text() {
        let content = r#"{"message":"Ajax - PSV | 0-0 | 12 | Eredivisie | KG VAR"}"#;
        let parsed = parse_content(content, "tip-6").unwrap();
        assert_eq!(parsed.home_team, "Ajax");
        assert_eq!(parsed.minute, Some(12));
    }

    #[test]
    fn test_brace_prefix_falls_through_to_pipe() {
        let parsed = parse_content(
            "{Tip} Real Madrid - Barcelona | 1-0 | 23 | La Liga | MS 1",
            "tip-7",
        )
        .unwrap();
        assert_eq!(parsed.home_team, "{Tip} Real Madrid");
        assert_eq!(parsed.away_team, "Barcelona");
        assert_eq!(parsed.minute, Some(23));
        assert_eq!(parsed.market_type.as_deref(), Some("MS 1"));
    }

    #[test]
    fn test_pipe_header_falls_through_to_bare_line() {
        let parsed = parse_content("LIVE | TIP\nReal Madrid - Barcelona", "tip-8").unwrap();
        assert_eq!(parsed.home_team, "Real Madrid");
        assert_eq!(parsed.away_team, "Barcelona");
        assert_eq!(parsed.score, None);
    }

    #[test]
    fn test_later_pipe_line_is_used() {
        let content = "HOT | PICK\nAjax - PSV | 0-0 | 12 | Eredivisie | BTTS";
        let parsed = parse_content(content, "tip-9").unwrap();
        assert_eq!(parsed.home_team, "Ajax");
        assert_eq!(parsed.market_type.as_deref(), Some("BTTS"));
    }

    #[test]
    fn test_unparseable() {
        assert!(parse_content("", "x").is_none());
        assert!(parse_content("Goal alert!", "x").is_none());
        assert!(parse_content("{\"foo\": 1}", "x").is_none());
        assert!(parse_content("{\"note\": \"pre-match\"}", "x").is_none());
        assert!(parse_content("{not json", "x").is_none());
        assert!(parse_content(" - Barcelona | 1-0", "x").is_none());
        assert!(parse_content("Arsenal | 1-0 | 45", "x").is_none());
    }
}
