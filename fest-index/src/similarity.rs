/*!
String similarity primitives used for fuzzy matching query tokens.

Everything here is case insensitive and measures length in Unicode scalar
values rather than bytes.
*/

use std::cmp;

use strsim;

/// The similarity assigned when one string contains the other.
const CONTAINS_SIMILARITY: f64 = 0.9;

/// Returns the Levenshtein edit distance between `a` and `b`, ignoring case.
///
/// This is a proper metric: it is symmetric, zero if and only if the strings
/// are equal (case insensitively) and satisfies the triangle inequality.
pub fn edit_distance(a: &str, b: &str) -> usize {
    strsim::levenshtein(&a.to_lowercase(), &b.to_lowercase())
}

/// Returns a similarity score in the range `[0, 1]` for the given strings.
///
/// Both strings are trimmed and compared case insensitively. Identical
/// strings score `1.0`, and a string containing the other scores `0.9`.
/// Otherwise the score is the fraction of the longer string left untouched by
/// the edit distance. Short strings have an absolute tolerance too: when the
/// longer string has at most 6 characters and the distance is at most 2, the
/// score is at least `0.7`, and when it has at most 10 characters and the
/// distance is at most 3, the score is at least `0.6`.
///
/// If either string is empty, then this returns `0.0`.
pub fn similarity(a: &str, b: &str) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let (a, b) = (a.trim().to_lowercase(), b.trim().to_lowercase());
    if a == b {
        return 1.0;
    }
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    if a.contains(&*b) || b.contains(&*a) {
        return CONTAINS_SIMILARITY;
    }

    let distance = strsim::levenshtein(&a, &b);
    let max_len = cmp::max(a.chars().count(), b.chars().count());
    let sim = (max_len - distance) as f64 / max_len as f64;
    if max_len <= 6 && distance <= 2 {
        sim.max(0.7)
    } else if max_len <= 10 && distance <= 3 {
        sim.max(0.6)
    } else {
        sim
    }
}

/// Returns the minimum similarity a word must have with `token` in order for
/// the token to match it.
///
/// Longer tokens get a lower threshold, since a single typo is a smaller
/// fraction of a long word.
pub fn threshold(token: &str) -> f64 {
    match token.chars().count() {
        0..=3 => 0.6,
        4..=5 => 0.55,
        6..=8 => 0.5,
        _ => 0.45,
    }
}

/// Returns true if and only if the query token matches the given word.
///
/// A token matches when it is equal to the word, when either one contains
/// the other or when their `similarity` reaches the token's `threshold`.
/// Comparisons ignore case and surrounding whitespace. Empty strings never
/// match.
pub fn token_matches_word(token: &str, word: &str) -> bool {
    let (token, word) = (token.trim().to_lowercase(), word.trim().to_lowercase());
    if token.is_empty() || word.is_empty() {
        return false;
    }
    if token == word || word.contains(&*token) || token.contains(&*word) {
        return true;
    }
    similarity(&token, &word) >= threshold(&token)
}
