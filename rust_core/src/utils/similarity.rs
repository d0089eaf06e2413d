//! Similarity scoring between normalized team names
//!
//! All scores are in [0, 1], symmetric, and 1.0 for identical non-empty input.

use strsim::levenshtein;

/// Per-token best at or above this counts as a matched word
const WORD_MATCH_THRESHOLD: f64 = 0.8;
/// Weight of the per-word average in the blended score
const WORD_BASE_WEIGHT: f64 = 0.6;
/// Weight of the whole-string similarity in the blended score
const FULL_STRING_WEIGHT: f64 = 0.4;
/// Bonus per unit of matched-word ratio
const WORD_MATCH_BONUS: f64 = 0.15;

/// Standard character-level edit distance
pub fn levenshtein_distance(a: &str, b: &str) -> usize {
    levenshtein(a, b)
}

/// `1 - distance / max_len` over characters
pub fn full_similarity(a: &str, b: &str) -> f64 {
    let max_len = a.chars().count().max(b.chars().count());
    if max_len == 0 {
        return 1.0;
    }
    let distance = levenshtein_distance(a, b);
    (1.0 - distance as f64 / max_len as f64).clamp(0.0, 1.0)
}

/// Similarity between two normalized names.
///
/// Names with two or more words on both sides are compared word by word and
/// blended with the whole-string score, so "al ittihad jeddah" stays close
/// to "al ittihad" while a different city qualifier still costs something.
pub fn calculate_similarity(a: &str, b: &str) -> f64 {
    let a = a.trim();
    let b = b.trim();

    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    if a == b {
        return 1.0;
    }

    let a_words: Vec<&str> = a.split_whitespace().collect();
    let b_words: Vec<&str> = b.split_whitespace().collect();

    if a_words.len() < 2 || b_words.len() < 2 {
        return full_similarity(a, b);
    }

    // Average both directions so the score stays symmetric when the word
    // counts differ.
    let (base_ab, ratio_ab) = word_alignment(&a_words, &b_words);
    let (base_ba, ratio_ba) = word_alignment(&b_words, &a_words);
    let base = (base_ab + base_ba) / 2.0;
    let match_ratio = (ratio_ab + ratio_ba) / 2.0;

    let blended = WORD_BASE_WEIGHT * base
        + FULL_STRING_WEIGHT * full_similarity(a, b)
        + match_ratio * WORD_MATCH_BONUS;

    blended.min(1.0)
}

/// For each word of `from`, its best similarity against any word of `to`.
/// Returns (mean of bests, fraction of bests at or above the match threshold).
fn word_alignment(from: &[&str], to: &[&str]) -> (f64, f64) {
    let bests: Vec<f64> = from
        .iter()
        .map(|word| {
            if to.contains(word) {
                return 1.0;
            }
            to.iter()
                .map(|other| full_similarity(word, other))
                .fold(0.0, f64::max)
        })
        .collect();

    let count = bests.len() as f64;
    let base = bests.iter().sum::<f64>() / count;
    let matched = bests.iter().filter(|s| **s >= WORD_MATCH_THRESHOLD).count() as f64;

    (base, matched / count)
}

/// Containment score: shorter/longer length when one contains the other
pub fn partial_match(a: &str, b: &str) -> f64 {
    let a = a.trim();
    let b = b.trim();

    if a.is_empty() || b.is_empty() {
        return 0.0;
    }

    let (shorter, longer) = if a.chars().count() <= b.chars().count() {
        (a, b)
    } else {
        (b, a)
    };

    if longer.contains(shorter) {
        shorter.chars().count() as f64 / longer.chars().count() as f64
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::normalize::normalize;

    #[test]
    fn test_levenshtein_distance() {
        assert_eq!(levenshtein_distance("kitten", "sitting"), 3);
        assert_eq!(levenshtein_distance("", "abc"), 3);
        assert_eq!(levenshtein_distance("same", "same"), 0);
        assert_eq!(levenshtein_distance("muembe", "mwembe"), 1);
    }

    #[test]
    fn test_similarity_edge_cases() {
        assert_eq!(calculate_similarity("", "arsenal"), 0.0);
        assert_eq!(calculate_similarity("arsenal", ""), 0.0);
        assert_eq!(calculate_similarity("", ""), 0.0);
        assert_eq!(calculate_similarity("arsenal", "arsenal"), 1.0);
        assert_eq!(calculate_similarity("real madrid", "real madrid"), 1.0);
    }

    #[test]
    fn test_similarity_symmetric_and_bounded() {
        let names = [
            "al ittihad jeddah",
            "al ittihad",
            "real madrid",
            "madrid",
            "muembe makumbi city",
            "bayern munich",
            "x",
        ];
        for a in names {
            for b in names {
                let ab = calculate_similarity(a, b);
                let ba = calculate_similarity(b, a);
                assert!((ab - ba).abs() < 1e-12, "asymmetric for {} / {}", a, b);
                assert!((0.0..=1.0).contains(&ab), "out of range for {} / {}", a, b);
            }
        }
    }

    #[test]
    fn test_single_character_difference_in_three_word_name() {
        let a = normalize("Muembe Makumbi City FC");
        let b = normalize("Mwembe Makumbi City FC");
        assert!(calculate_similarity(&a, &b) >= 0.6);
    }

    #[test]
    fn test_word_blend_rewards_shared_tokens() {
        let jeddah = normalize("Al Ittihad Jeddah");
        let club = normalize("Al Ittihad Club");
        let unrelated = normalize("Bayern Munich");

        let shared = calculate_similarity(&jeddah, &club);
        assert!(shared > calculate_similarity(&jeddah, &unrelated) + 0.3);
        assert!(shared > calculate_similarity(&club, &unrelated) + 0.3);
    }

    #[test]
    fn test_single_word_falls_back_to_full_similarity() {
        let score = calculate_similarity("barcelona", "barcelona sc");
        assert!((score - full_similarity("barcelona", "barcelona sc")).abs() < 1e-12);
    }

    #[test]
    fn test_partial_match() {
        assert_eq!(partial_match("madrid", "real madrid"), 6.0 / 11.0);
        assert_eq!(partial_match("real madrid", "madrid"), 6.0 / 11.0);
        assert_eq!(partial_match("madrid", "barcelona"), 0.0);
        assert_eq!(partial_match("", "madrid"), 0.0);
    }
}
