//! Qualifier-aware confidence adjustment
//!
//! Normalization strips "(W)", "U19" and "Reserves" so that similarity works
//! on the club name alone. The roster kind is read back from the raw name
//! here and turned into a multiplier, so "Arsenal" does not resolve to
//! "Arsenal Women" just because the normalized names are identical.

use crate::config::env_parse;
use crate::utils::normalize::{is_age_group_token, lowercase_words};
use serde::{Deserialize, Serialize};

const WOMEN_WORDS: &[&str] = &[
    "w", "women", "womens", "woman", "ladies", "fem", "feminino", "femenino", "femminile",
    "frauen", "damen", "wfc",
];

const YOUTH_WORDS: &[&str] = &["youth", "junior", "juniors", "academy"];

const RESERVE_WORDS: &[&str] = &["reserve", "reserves", "res", "ii"];

/// Roster a team name refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QualifierKind {
    Main,
    Reserve,
    Youth,
    Women,
}

impl QualifierKind {
    /// Detect the roster kind from a raw (un-normalized) team name.
    ///
    /// Women wins over youth, youth over reserve: "Brazil U20 Women" is a
    /// women's side first.
    pub fn detect(raw: &str) -> Self {
        let words = lowercase_words(raw);

        if words.iter().any(|w| WOMEN_WORDS.contains(&w.as_str())) {
            QualifierKind::Women
        } else if words
            .iter()
            .any(|w| YOUTH_WORDS.contains(&w.as_str()) || is_age_group_token(w))
        {
            QualifierKind::Youth
        } else if words.iter().any(|w| RESERVE_WORDS.contains(&w.as_str())) {
            QualifierKind::Reserve
        } else {
            QualifierKind::Main
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            QualifierKind::Main => "main",
            QualifierKind::Reserve => "reserve",
            QualifierKind::Youth => "youth",
            QualifierKind::Women => "women",
        }
    }
}

/// Multipliers applied to a candidate's similarity by roster kind
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualifierWeights {
    pub reserve: f64,
    pub youth: f64,
    /// Women's candidate for a query that states no gender
    pub women_unqualified_query: f64,
    /// Women's candidate for a query carrying some other qualifier
    pub women_qualified_query: f64,
    /// Main-roster candidate for a query that names a qualified roster
    pub main_for_qualified_query: f64,
    pub main_boost: f64,
    pub main_boost_min_similarity: f64,
}

impl Default for QualifierWeights {
    fn default() -> Self {
        Self {
            reserve: 0.85,
            youth: 0.85,
            women_unqualified_query: 0.6,
            women_qualified_query: 0.85,
            main_for_qualified_query: 0.85,
            main_boost: 1.05,
            main_boost_min_similarity: 0.75,
        }
    }
}

impl QualifierWeights {
    /// Weights from `TIPMATCH_WEIGHT_*` variables, defaults otherwise
    pub fn from_env() -> Self {
        let d = Self::default();
        Self {
            reserve: env_parse("TIPMATCH_WEIGHT_RESERVE").unwrap_or(d.reserve),
            youth: env_parse("TIPMATCH_WEIGHT_YOUTH").unwrap_or(d.youth),
            women_unqualified_query: env_parse("TIPMATCH_WEIGHT_WOMEN_UNQUALIFIED")
                .unwrap_or(d.women_unqualified_query),
            women_qualified_query: env_parse("TIPMATCH_WEIGHT_WOMEN_QUALIFIED")
                .unwrap_or(d.women_qualified_query),
            main_for_qualified_query: env_parse("TIPMATCH_WEIGHT_MAIN_QUALIFIED")
                .unwrap_or(d.main_for_qualified_query),
            main_boost: env_parse("TIPMATCH_WEIGHT_MAIN_BOOST").unwrap_or(d.main_boost),
            main_boost_min_similarity: env_parse("TIPMATCH_WEIGHT_MAIN_BOOST_MIN_SIM")
                .unwrap_or(d.main_boost_min_similarity),
        }
    }

    /// Penalty multiplier for a candidate of `candidate` kind against a query
    /// of `query` kind. Matching kinds are neutral.
    pub fn multiplier(&self, candidate: QualifierKind, query: QualifierKind) -> f64 {
        if candidate == query {
            return 1.0;
        }
        match candidate {
            QualifierKind::Reserve => self.reserve,
            QualifierKind::Youth => self.youth,
            QualifierKind::Women if query == QualifierKind::Main => self.women_unqualified_query,
            QualifierKind::Women => self.women_qualified_query,
            QualifierKind::Main => self.main_for_qualified_query,
        }
    }

    /// Adjust a raw similarity for roster kinds, capped at 1.0.
    ///
    /// The main-roster boost needs both sides on the main roster, a raw
    /// similarity at or above `main_boost_min_similarity` and at least one
    /// shared distinguishing token.
    pub fn adjust(
        &self,
        similarity: f64,
        candidate: QualifierKind,
        query: QualifierKind,
        shares_distinguishing_token: bool,
    ) -> f64 {
        let mut score = similarity * self.multiplier(candidate, query);

        if candidate == QualifierKind::Main
            && query == QualifierKind::Main
            && shares_distinguishing_token
            && similarity >= self.main_boost_min_similarity
        {
            score *= self.main_boost;
        }

        score.clamp(0.0, 1.0)
    }
}
