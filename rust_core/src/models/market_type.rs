//! Prediction market taxonomy
//!
//! Bots publish market labels in free text, in English or Turkish
//! ("KG VAR", "2.5 ÜST", "IY 0.5 ÜST", "MS 1"). This module maps those labels
//! onto the markets the settlement engine knows how to evaluate.

use serde::{Deserialize, Serialize};

/// Market a prediction was made on
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MarketType {
    /// Both teams score at least once
    BothTeamsScore,
    /// Three or more goals at full time
    Over25,
    /// Two or more goals at full time
    Over15,
    /// At least one goal in the first half
    HalfTimeOver05,
    /// Full-time result: home win
    HomeWin,
    /// Full-time result: draw
    Draw,
    /// Full-time result: away win
    AwayWin,
    /// Anything else, kept verbatim for auditing
    Unknown { label: String },
}

impl MarketType {
    /// Parse a market label from a bot message.
    ///
    /// Matching is case-insensitive and tolerant of separators, so
    /// "Over 2.5", "over_2_5", "O2.5" and "2.5 ÜST" all land on `Over25`.
    pub fn parse(label: &str) -> Self {
        let key = canonical_label(label);

        match key.as_str() {
            "btts" | "bothteamsscore" | "bothteamstoscore" | "gg" | "kgvar" | "kg" => {
                Self::BothTeamsScore
            }
            "over25" | "o25" | "25ust" | "25over" | "ust25" => Self::Over25,
            "over15" | "o15" | "15ust" | "15over" | "ust15" => Self::Over15,
            "htover05" | "halftimeover05" | "1hover05" | "fhover05" | "iy05ust" | "iy05"
            | "iyust05" => Self::HalfTimeOver05,
            "ms1" | "1" | "homewin" | "home" | "fulltime1" | "ft1" => Self::HomeWin,
            "msx" | "ms0" | "x" | "draw" | "ftx" => Self::Draw,
            "ms2" | "2" | "awaywin" | "away" | "fulltime2" | "ft2" => Self::AwayWin,
            _ => Self::Unknown {
                label: label.trim().to_string(),
            },
        }
    }

    /// Parse a market from separate type and value fields.
    ///
    /// Structured payloads sometimes split "MS" and "1"; both halves are
    /// joined before parsing.
    pub fn from_parts(market_type: Option<&str>, market_value: Option<&str>) -> Self {
        match (market_type, market_value) {
            (Some(t), Some(v)) if !v.trim().is_empty() => {
                let combined = Self::parse(&format!("{} {}", t, v));
                if combined.is_known() {
                    combined
                } else {
                    Self::parse(t)
                }
            }
            (Some(t), _) => Self::parse(t),
            (None, Some(v)) => Self::parse(v),
            (None, None) => Self::Unknown {
                label: String::new(),
            },
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, Self::Unknown { .. })
    }

    /// Stable identifier used in logs and persisted rule descriptions
    pub fn type_name(&self) -> &str {
        match self {
            Self::BothTeamsScore => "both_teams_score",
            Self::Over25 => "over_2_5",
            Self::Over15 => "over_1_5",
            Self::HalfTimeOver05 => "ht_over_0_5",
            Self::HomeWin => "home_win",
            Self::Draw => "draw",
            Self::AwayWin => "away_win",
            Self::Unknown { .. } => "unknown",
        }
    }
}

/// Lowercase, fold Turkish letters and drop separators.
fn canonical_label(label: &str) -> String {
    label
        .trim()
        .to_lowercase()
        .chars()
        .map(|c| match c {
            'ü' => 'u',
            'ı' | 'İ' => 'i',
            'ş' => 's',
            'ğ' => 'g',
            'ö' => 'o',
            'ç' => 'c',
            other => other,
        })
        .filter(|c| c.is_alphanumeric())
        .collect()
}
