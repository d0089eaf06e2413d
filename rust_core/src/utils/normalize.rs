//! Team name normalization
//!
//! Bots and providers spell the same club many ways: "Arsenal FC",
//! "Arsenal (W)", "ARSENAL", "Arsenal U21". `normalize` reduces a raw name to
//! the form used for similarity scoring. Qualifiers (gender, age group,
//! reserve) are stripped here; callers that need to tell a women's team from
//! the main roster read them from the raw name via `QualifierKind`.

use regex::Regex;
use std::sync::OnceLock;

/// Tokens that mark a women's, youth or reserve side
const QUALIFIER_WORDS: &[&str] = &[
    "w", "women", "womens", "woman", "ladies", "fem", "feminino", "femenino", "femminile",
    "frauen", "damen", "wfc", "reserve", "reserves", "res", "ii", "youth", "junior", "juniors",
    "academy",
];

/// Generic club-type suffixes, stripped only at the end of a name
const CLUB_SUFFIXES: &[&str] = &[
    "fc", "sc", "cf", "afc", "fk", "sk", "if", "bk", "ac", "club", "united", "utd", "calcio",
];

/// Words too common to identify a club on their own
const GENERIC_WORDS: &[&str] = &[
    "fc", "sc", "cf", "afc", "fk", "sk", "ac", "club", "united", "utd", "city", "town", "real",
    "sporting", "athletic", "atletico", "deportivo", "de", "del", "la", "el", "al", "the", "of",
    "sport", "sports", "cd", "cs", "ca", "sv", "vfb", "vfl",
];

fn paren_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\(([^()]*)\)").expect("static regex"))
}

fn age_group_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(u|sub|under)-?\d{1,2}$").expect("static regex"))
}

/// Whether a lowercase token is an age-group marker such as "u19" or "sub-20"
pub fn is_age_group_token(token: &str) -> bool {
    age_group_regex().is_match(token)
}

/// Whether a lowercase token is a gender/age/reserve qualifier
pub fn is_qualifier_token(token: &str) -> bool {
    QUALIFIER_WORDS.contains(&token) || is_age_group_token(token)
}

pub fn is_club_suffix(token: &str) -> bool {
    CLUB_SUFFIXES.contains(&token)
}

/// Check if a word is too generic to be a reliable identifier
pub fn is_generic_word(token: &str) -> bool {
    GENERIC_WORDS.contains(&token)
}

/// A parenthetical group is a qualifier when every word in it is one
fn is_qualifier_group(content: &str) -> bool {
    let words = lowercase_words(content);
    !words.is_empty() && words.iter().all(|w| is_qualifier_token(w))
}

/// Lowercase and split on anything that is not alphanumeric.
///
/// Dots and apostrophes are dropped rather than split on so that "F.C." and
/// "Newell's" stay single words.
pub fn lowercase_words(s: &str) -> Vec<String> {
    let lowered = s.to_lowercase();
    let mut cleaned = String::with_capacity(lowered.len());
    for c in lowered.chars() {
        if c.is_alphanumeric() {
            cleaned.push(c);
        } else if matches!(c, '.' | '\'' | '’' | '`') || is_combining_mark(c) {
            continue;
        } else {
            cleaned.push(' ');
        }
    }
    merge_age_groups(cleaned.split_whitespace())
}

/// "Sub-20", "U 19" and "under (21)" become a single "u20"-style word.
///
/// Runs on words, so the separator between marker and digits can be any
/// run of punctuation or whitespace.
fn merge_age_groups<'a>(words: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut merged: Vec<String> = Vec::new();
    let mut words = words.peekable();

    while let Some(word) = words.next() {
        let is_marker = matches!(word, "u" | "sub" | "under");
        match words.peek() {
            Some(next) if is_marker && is_age_digits(next) => {
                merged.push(format!("u{}", next));
                words.next();
            }
            _ => merged.push(word.to_string()),
        }
    }
    merged
}

fn is_age_digits(word: &str) -> bool {
    (1..=2).contains(&word.len()) && word.bytes().all(|b| b.is_ascii_digit())
}

fn is_combining_mark(c: char) -> bool {
    matches!(c as u32, 0x0300..=0x036F)
}

/// Normalize a raw team name for comparison.
///
/// Total and idempotent: `normalize(&normalize(x)) == normalize(x)`.
pub fn normalize(name: &str) -> String {
    let lowered = name.to_lowercase();

    let without_groups = paren_regex().replace_all(&lowered, |caps: &regex::Captures| {
        if is_qualifier_group(&caps[1]) {
            " ".to_string()
        } else {
            format!(" {} ", &caps[1])
        }
    });

    let mut words = lowercase_words(&without_groups);

    // Strip trailing qualifiers and club suffixes until neither applies,
    // always keeping at least one word.
    while words.len() > 1 {
        let last = words[words.len() - 1].as_str();
        if is_qualifier_token(last) || is_club_suffix(last) {
            words.pop();
        } else {
            break;
        }
    }

    words.join(" ")
}

/// Whitespace tokens of an already normalized name
pub fn tokenize(normalized: &str) -> Vec<&str> {
    normalized.split_whitespace().collect()
}

/// Tokens that identify a club: not generic and longer than one character
pub fn distinguishing_tokens(normalized: &str) -> Vec<&str> {
    tokenize(normalized)
        .into_iter()
        .filter(|t| t.chars().count() > 1 && !is_generic_word(t))
        .collect()
}
