//! Match Resolver
//!
//! Anchors on whichever side of the prediction resolves to a team, pulls
//! that team's live fixtures and picks the one whose opponent looks like the
//! other raw name.

use super::{MatchHints, ResolutionStrategy, StrategyOutcome};
use crate::config::CoreConfig;
use crate::error::Result;
use crate::matching::team::TeamResolver;
use crate::models::{AnchorSide, MatchLookupResult, MatchMethod, MatchRecord, TeamMatchResult};
use crate::registry::{with_timeout, MatchRegistry};
use crate::utils::normalize::normalize;
use crate::utils::similarity::calculate_similarity;
use async_trait::async_trait;
use std::cmp::Reverse;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Anchor on one side, disambiguate on the other
pub struct AnchorStrategy {
    side: AnchorSide,
    teams: Arc<TeamResolver>,
    matches: Arc<dyn MatchRegistry>,
    config: Arc<CoreConfig>,
}

impl AnchorStrategy {
    pub fn new(
        side: AnchorSide,
        teams: Arc<TeamResolver>,
        matches: Arc<dyn MatchRegistry>,
        config: Arc<CoreConfig>,
    ) -> Self {
        Self {
            side,
            teams,
            matches,
            config,
        }
    }

    /// Live fixtures for the anchor team: active play first, then latest kickoff
    async fn live_candidates(&self, team_id: i64) -> Result<Vec<MatchRecord>> {
        let limit = self.config.live_match_limit;
        let mut candidates = with_timeout(
            self.config.query_timeout,
            "live_matches_for_team",
            self.matches.live_matches_for_team(team_id, limit),
        )
        .await?;

        candidates.retain(|m| m.state.is_live());
        candidates.sort_by_key(|m| (m.state.live_priority(), Reverse(m.match_time)));
        candidates.truncate(limit);
        Ok(candidates)
    }

    /// Score the other raw name against a fixture's opponent
    fn opponent_result(
        &self,
        fixture: &MatchRecord,
        anchor_team_id: i64,
        other_normalized: &str,
    ) -> TeamMatchResult {
        let (opponent_id, opponent_name) = fixture.opponent_of(anchor_team_id);
        let similarity = calculate_similarity(other_normalized, &normalize(opponent_name));
        TeamMatchResult {
            team_id: opponent_id,
            team_name: opponent_name.to_string(),
            confidence: similarity.clamp(0.0, 1.0),
            method: if similarity > 0.8 {
                MatchMethod::Fuzzy
            } else {
                MatchMethod::Partial
            },
        }
    }

    /// Single candidate: resolve the other side for the record. A resolution
    /// that lands on a different team falls back to opponent similarity.
    async fn bookkeeping_result(
        &self,
        fixture: &MatchRecord,
        anchor_team_id: i64,
        other_raw: &str,
    ) -> Result<TeamMatchResult> {
        let (opponent_id, _) = fixture.opponent_of(anchor_team_id);
        match self.teams.resolve(other_raw).await? {
            Some(resolved) if resolved.team_id == opponent_id => Ok(resolved),
            _ => Ok(self.opponent_result(fixture, anchor_team_id, &normalize(other_raw))),
        }
    }

    fn lookup(
        &self,
        fixture: &MatchRecord,
        anchor: TeamMatchResult,
        other: TeamMatchResult,
        overall: f64,
        degraded: bool,
    ) -> MatchLookupResult {
        let (home, away) = match self.side {
            AnchorSide::Home => (anchor, other),
            AnchorSide::Away => (other, anchor),
        };
        MatchLookupResult {
            match_external_id: fixture.external_id.clone(),
            match_uuid: fixture.uuid,
            home,
            away,
            overall_confidence: overall.clamp(0.0, 1.0),
            match_time: fixture.match_time,
            state: fixture.state,
            anchor: self.side,
            degraded,
        }
    }
}

#[async_trait]
impl ResolutionStrategy for AnchorStrategy {
    fn name(&self) -> &'static str {
        match self.side {
            AnchorSide::Home => "home_anchor",
            AnchorSide::Away => "away_anchor",
        }
    }

    async fn attempt(
        &self,
        home_name: &str,
        away_name: &str,
        _hints: &MatchHints,
    ) -> Result<StrategyOutcome> {
        let (anchor_raw, other_raw) = match self.side {
            AnchorSide::Home => (home_name, away_name),
            AnchorSide::Away => (away_name, home_name),
        };

        let anchor = match self.teams.resolve(anchor_raw).await? {
            Some(result) if result.confidence >= self.config.confidence_floor => result,
            _ => {
                debug!("{}: '{}' did not resolve", self.name(), anchor_raw);
                return Ok(StrategyOutcome::NotFound);
            }
        };

        let candidates = self.live_candidates(anchor.team_id).await?;
        debug!(
            "{}: {} ({}) has {} live fixture(s)",
            self.name(),
            anchor.team_name,
            anchor.team_id,
            candidates.len()
        );

        let Some(first) = candidates.first() else {
            return Ok(StrategyOutcome::NotFound);
        };

        if candidates.len() == 1 {
            let other = self.bookkeeping_result(first, anchor.team_id, other_raw).await?;
            let overall = (anchor.confidence + other.confidence) / 2.0;
            return Ok(StrategyOutcome::Found(
                self.lookup(first, anchor, other, overall, false),
            ));
        }

        let other_normalized = normalize(other_raw);
        for fixture in &candidates {
            let other = self.opponent_result(fixture, anchor.team_id, &other_normalized);
            if other.confidence >= self.config.confidence_floor {
                let overall = (anchor.confidence + other.confidence) / 2.0;
                return Ok(StrategyOutcome::Found(
                    self.lookup(fixture, anchor, other, overall, false),
                ));
            }
        }

        let other = self.opponent_result(first, anchor.team_id, &other_normalized);
        let overall = anchor.confidence * self.config.degraded_factor;
        warn!(
            "{}: no opponent of {} resembles '{}' among {} fixtures, taking {} (degraded)",
            self.name(),
            anchor.team_name,
            other_raw,
            candidates.len(),
            first.external_id
        );
        Ok(StrategyOutcome::Found(
            self.lookup(first, anchor, other, overall, true),
        ))
    }
}

/// Ordered list of resolution strategies
pub struct MatchResolver {
    strategies: Vec<Box<dyn ResolutionStrategy>>,
}

impl MatchResolver {
    /// Home-anchored, then away-anchored
    pub fn new(
        teams: Arc<TeamResolver>,
        matches: Arc<dyn MatchRegistry>,
        config: Arc<CoreConfig>,
    ) -> Self {
        let strategies: Vec<Box<dyn ResolutionStrategy>> = vec![
            Box::new(AnchorStrategy::new(
                AnchorSide::Home,
                teams.clone(),
                matches.clone(),
                config.clone(),
            )),
            Box::new(AnchorStrategy::new(AnchorSide::Away, teams, matches, config)),
        ];
        Self { strategies }
    }

    pub fn with_strategies(strategies: Vec<Box<dyn ResolutionStrategy>>) -> Self {
        Self { strategies }
    }

    /// Resolve a prediction's team names to a live fixture.
    ///
    /// `None` when no strategy finds one; unresolved names are not errors.
    pub async fn find_match_by_teams(
        &self,
        home_name: &str,
        away_name: &str,
        hints: &MatchHints,
    ) -> Result<Option<MatchLookupResult>> {
        debug!(
            "Resolving '{}' vs '{}' (minute {:?}, score {:?})",
            home_name, away_name, hints.minute, hints.score
        );

        for strategy in &self.strategies {
            match strategy.attempt(home_name, away_name, hints).await? {
                StrategyOutcome::Found(lookup) => {
                    info!(
                        "Matched '{}' vs '{}' -> {} via {} (confidence {:.3}{})",
                        home_name,
                        away_name,
                        lookup.match_external_id,
                        strategy.name(),
                        lookup.overall_confidence,
                        if lookup.degraded { ", degraded" } else { "" }
                    );
                    return Ok(Some(lookup));
                }
                StrategyOutcome::NotFound => continue,
            }
        }

        warn!("No live match found for '{}' vs '{}'", home_name, away_name);
        Ok(None)
    }
}
