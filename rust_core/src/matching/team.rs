//! Team Resolver
//!
//! Resolves one raw team name from a bot message to a canonical team.
//! Strategies run in order and short-circuit on the first hit:
//! 1. Alias table (operator curated, confidence 1.0)
//! 2. Exact name / short name (confidence 1.0)
//! 3. Token-anchored candidate search scored with qualifier weights
//! 4. Prefix/substring fallback, then a bounded registry scan
//!
//! Nothing is cached: every call re-queries the registry.

use crate::config::CoreConfig;
use crate::error::Result;
use crate::matching::qualifier::QualifierKind;
use crate::models::{MatchMethod, TeamMatchResult, TeamRecord};
use crate::registry::{with_timeout, NamePattern, TeamRegistry};
use crate::utils::normalize::{distinguishing_tokens, normalize, tokenize};
use crate::utils::similarity::{calculate_similarity, partial_match};
use rayon::prelude::*;
use rustc_hash::FxHashSet;
use std::sync::Arc;
use tracing::debug;

/// Weight of the containment score in the prefix fallback
const PARTIAL_WEIGHT: f64 = 0.9;

/// Method threshold: above this a scored match is reported as fuzzy
const FUZZY_METHOD_THRESHOLD: f64 = 0.8;

pub struct TeamResolver {
    registry: Arc<dyn TeamRegistry>,
    config: Arc<CoreConfig>,
}

impl TeamResolver {
    pub fn new(registry: Arc<dyn TeamRegistry>, config: Arc<CoreConfig>) -> Self {
        Self { registry, config }
    }

    pub fn config(&self) -> &CoreConfig {
        &self.config
    }

    /// Resolve a raw name: alias lookup first, then the scored chain.
    ///
    /// Returns `None` when no candidate clears the confidence floor.
    pub async fn resolve(&self, raw_name: &str) -> Result<Option<TeamMatchResult>> {
        let raw = raw_name.trim();
        if raw.is_empty() {
            return Ok(None);
        }

        if let Some(hit) = self.find_team_by_alias(raw).await? {
            return Ok(Some(hit));
        }

        self.find_best_match(raw).await
    }

    /// Exact case-insensitive alias lookup
    pub async fn find_team_by_alias(&self, raw_name: &str) -> Result<Option<TeamMatchResult>> {
        let team = with_timeout(
            self.config.query_timeout,
            "find_by_alias",
            self.registry.find_by_alias(raw_name),
        )
        .await?;

        Ok(team.map(|t| {
            debug!("Alias hit: '{}' -> {} ({})", raw_name, t.name, t.id);
            TeamMatchResult::exact(&t)
        }))
    }

    /// Exact → token-anchored → prefix fallback
    pub async fn find_best_match(&self, raw_name: &str) -> Result<Option<TeamMatchResult>> {
        let timeout = self.config.query_timeout;

        if let Some(team) =
            with_timeout(timeout, "find_by_name", self.registry.find_by_name(raw_name)).await?
        {
            debug!("Exact hit: '{}' -> {} ({})", raw_name, team.name, team.id);
            return Ok(Some(TeamMatchResult::exact(&team)));
        }

        let normalized = normalize(raw_name);
        if normalized.is_empty() {
            return Ok(None);
        }
        let query_kind = QualifierKind::detect(raw_name);

        if let Some(hit) = self.token_search(raw_name, &normalized, query_kind).await? {
            return Ok(Some(hit));
        }

        self.prefix_search(raw_name, &normalized).await
    }

    async fn token_search(
        &self,
        raw_name: &str,
        normalized: &str,
        query_kind: QualifierKind,
    ) -> Result<Option<TeamMatchResult>> {
        let tokens = anchor_tokens(normalized);
        if tokens.is_empty() {
            return Ok(None);
        }

        let candidates = with_timeout(
            self.config.query_timeout,
            "search_by_tokens",
            self.registry
                .search_by_tokens(&tokens, self.config.token_candidate_limit),
        )
        .await?;

        let best = candidates
            .iter()
            .take(self.config.token_candidate_limit)
            .map(|team| score_token_candidate(team, normalized, query_kind, &self.config))
            .reduce(keep_best);

        match best {
            Some(result) if result.confidence >= self.config.confidence_floor => {
                debug!(
                    "Token match: '{}' -> {} ({:.3}, {})",
                    raw_name,
                    result.team_name,
                    result.confidence,
                    result.method.as_str()
                );
                Ok(Some(result))
            }
            _ => Ok(None),
        }
    }

    async fn prefix_search(
        &self,
        raw_name: &str,
        normalized: &str,
    ) -> Result<Option<TeamMatchResult>> {
        let timeout = self.config.query_timeout;
        let patterns = prefix_patterns(raw_name, normalized);

        let mut candidates = with_timeout(
            timeout,
            "search_by_patterns",
            self.registry
                .search_by_patterns(&patterns, self.config.prefix_candidate_limit),
        )
        .await?;
        candidates.truncate(self.config.prefix_candidate_limit);

        if candidates.is_empty() {
            debug!("No prefix candidates for '{}', scanning registry", raw_name);
            candidates = with_timeout(
                timeout,
                "scan",
                self.registry.scan(self.config.scan_limit),
            )
            .await?;
            candidates.truncate(self.config.scan_limit);
        }

        let best = candidates
            .par_iter()
            .map(|team| score_prefix_candidate(team, normalized))
            .reduce_with(keep_best);

        match best {
            Some(result) if result.confidence >= self.config.confidence_floor => {
                debug!(
                    "Fallback match: '{}' -> {} ({:.3}, {})",
                    raw_name,
                    result.team_name,
                    result.confidence,
                    result.method.as_str()
                );
                Ok(Some(result))
            }
            _ => Ok(None),
        }
    }
}

/// First two normalized tokens longer than one character
fn anchor_tokens(normalized: &str) -> Vec<String> {
    tokenize(normalized)
        .into_iter()
        .filter(|t| t.chars().count() > 1)
        .take(2)
        .map(|t| t.to_string())
        .collect()
}

/// Substring patterns for the fallback search: the first 2, 3 and 4
/// characters of the raw name, the normalized name and its first 10 characters
fn prefix_patterns(raw_name: &str, normalized: &str) -> Vec<NamePattern> {
    let raw = raw_name.trim().to_lowercase();
    let mut seen = FxHashSet::default();
    let mut patterns = Vec::new();

    let mut push = |pattern: NamePattern| {
        if seen.insert(pattern.clone()) {
            patterns.push(pattern);
        }
    };

    for len in [2, 3, 4] {
        if raw.chars().count() >= len {
            push(NamePattern::Prefix(raw.chars().take(len).collect()));
        }
    }
    push(NamePattern::Contains(normalized.to_string()));
    if normalized.chars().count() > 10 {
        push(NamePattern::Contains(normalized.chars().take(10).collect()));
    }

    patterns
}

fn score_token_candidate(
    team: &TeamRecord,
    normalized_query: &str,
    query_kind: QualifierKind,
    config: &CoreConfig,
) -> TeamMatchResult {
    let candidate = normalize(&team.name);
    let similarity = calculate_similarity(normalized_query, &candidate);

    let query_tokens: FxHashSet<&str> = distinguishing_tokens(normalized_query)
        .into_iter()
        .collect();
    let shares_token = distinguishing_tokens(&candidate)
        .iter()
        .any(|t| query_tokens.contains(t));

    let candidate_kind = QualifierKind::detect(&team.name);
    let confidence =
        config
            .qualifier_weights
            .adjust(similarity, candidate_kind, query_kind, shares_token);

    let method = if candidate == normalized_query {
        MatchMethod::Normalized
    } else if confidence > FUZZY_METHOD_THRESHOLD {
        MatchMethod::Fuzzy
    } else {
        MatchMethod::Partial
    };

    TeamMatchResult::new(team, confidence, method)
}

fn score_prefix_candidate(team: &TeamRecord, normalized_query: &str) -> TeamMatchResult {
    let candidate = normalize(&team.name);
    let name_sim = calculate_similarity(normalized_query, &candidate);
    let short_sim = team
        .short_name
        .as_deref()
        .map(|s| calculate_similarity(normalized_query, &normalize(s)))
        .unwrap_or(0.0);
    let partial = PARTIAL_WEIGHT * partial_match(normalized_query, &candidate);

    let score = name_sim.max(short_sim).max(partial);
    let method = if score > FUZZY_METHOD_THRESHOLD {
        MatchMethod::Fuzzy
    } else {
        MatchMethod::Partial
    };

    TeamMatchResult::new(team, score, method)
}

/// Keep the higher-confidence result; ties keep the earlier candidate
fn keep_best(best: TeamMatchResult, next: TeamMatchResult) -> TeamMatchResult {
    if next.confidence > best.confidence {
        next
    } else {
        best
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::InMemoryRegistry;

    fn resolver(registry: Arc<InMemoryRegistry>) -> TeamResolver {
        TeamResolver::new(registry, Arc::new(CoreConfig::default()))
    }

    #[test]
    fn test_anchor_tokens() {
        assert_eq!(anchor_tokens("al ittihad jeddah"), vec!["al", "ittihad"]);
        assert_eq!(anchor_tokens("a bc de"), vec!["bc", "de"]);
        assert!(anchor_tokens("x").is_empty());
    }

    #[test]
    fn test_prefix_patterns() {
        let patterns = prefix_patterns("Fenerbahce SK", "fenerbahce");
        assert_eq!(
            patterns,
            vec![
                NamePattern::Prefix("fe".to_string()),
                NamePattern::Prefix("fen".to_string()),
                NamePattern::Prefix("fene".to_string()),
                NamePattern::Contains("fenerbahce".to_string()),
            ]
        );
        assert_eq!(prefix_patterns("A", "a").len(), 1);
    }

    #[tokio::test]
    async fn test_alias_hit_is_exact() {
        let registry = Arc::new(InMemoryRegistry::new());
        registry.add_team(TeamRecord::new(10, "Galatasaray", None));
        registry.add_alias("Cimbom", 10);

        let result = resolver(registry).resolve("cimbom").await.unwrap().unwrap();
        assert_eq!(result.team_id, 10);
        assert_eq!(result.confidence, 1.0);
        assert_eq!(result.method, MatchMethod::Exact);
    }

    #[tokio::test]
    async fn test_exact_name_and_short_name() {
        let registry = Arc::new(InMemoryRegistry::new());
        registry.add_team(TeamRecord::new(1, "Real Madrid", Some("RMA")));
        let resolver = resolver(registry);

        let by_name = resolver.resolve("REAL MADRID").await.unwrap().unwrap();
        assert_eq!((by_name.team_id, by_name.confidence), (1, 1.0));

        let by_short = resolver.resolve("rma").await.unwrap().unwrap();
        assert_eq!(by_short.method, MatchMethod::Exact);
    }

    #[tokio::test]
    async fn test_token_search_prefers_main_roster() {
        let registry = Arc::new(InMemoryRegistry::new());
        registry.add_team(TeamRecord::new(1, "Arsenal FC", None));
        registry.add_team(TeamRecord::new(2, "Arsenal Women", None));
        let resolver = resolver(registry);

        let main = resolver.resolve("Arsenal").await.unwrap().unwrap();
        assert_eq!(main.team_id, 1);
        assert_eq!(main.method, MatchMethod::Normalized);

        let women = resolver.resolve("Arsenal (W)").await.unwrap().unwrap();
        assert_eq!(women.team_id, 2);
    }

    #[tokio::test]
    async fn test_token_search_fuzzy() {
        let registry = Arc::new(InMemoryRegistry::new());
        registry.add_team(TeamRecord::new(3, "Al Ittihad Club", None));
        registry.add_team(TeamRecord::new(4, "Al Hilal", None));

        let result = resolver(registry)
            .resolve("Al Ittihad Jeddah")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(result.team_id, 3);
        assert!(result.confidence >= 0.6);
    }

    #[tokio::test]
    async fn test_prefix_fallback_handles_typo() {
        let registry = Arc::new(InMemoryRegistry::new());
        registry.add_team(TeamRecord::new(5, "Fenerbahce", None));

        let result = resolver(registry).resolve("Fenerbahçe").await.unwrap().unwrap();
        assert_eq!(result.team_id, 5);
        assert_eq!(result.method, MatchMethod::Fuzzy);
    }

    #[tokio::test]
    async fn test_scan_fallback_when_no_prefix_candidates() {
        let registry = Arc::new(InMemoryRegistry::new());
        registry.add_team(TeamRecord::new(6, "Besiktas", None));

        let result = resolver(registry.clone()).resolve("Vesiktas").await.unwrap().unwrap();
        assert_eq!(result.team_id, 6);
        assert_eq!(registry.calls("scan"), 1);
    }

    #[tokio::test]
    async fn test_unresolvable_name_is_none() {
        let registry = Arc::new(InMemoryRegistry::new());
        registry.add_team(TeamRecord::new(1, "Real Madrid", None));
        let resolver = resolver(registry);

        assert!(resolver.resolve("Zzqx Unknown Town").await.unwrap().is_none());
        assert!(resolver.resolve("   ").await.unwrap().is_none());
        assert!(resolver.resolve("()").await.unwrap().is_none());
    }
}
