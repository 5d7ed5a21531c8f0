//! Word-set similarity and keyword extraction.

use once_cell::sync::Lazy;
use std::collections::HashSet;

/// Words dropped by [`extract_keywords`].
pub const KEYWORD_STOP_WORDS: &[&str] = &[
    "and", "the", "this", "that", "with", "from", "have", "been", "were", "they", "their",
    "what", "when", "where", "which", "would", "could", "should", "about",
];

static KEYWORD_STOP_SET: Lazy<HashSet<&'static str>> =
    Lazy::new(|| KEYWORD_STOP_WORDS.iter().copied().collect());

/// Lower-cased whitespace tokens.
pub(crate) fn tokens(text: &str) -> Vec<String> {
    text.split_whitespace().map(|w| w.to_lowercase()).collect()
}

/// Jaccard similarity of the two texts' lower-cased word sets, in `[0, 1]`.
///
/// Two empty texts have similarity 0.
pub fn jaccard_similarity(a: &str, b: &str) -> f64 {
    let set_a: HashSet<String> = tokens(a).into_iter().collect();
    let set_b: HashSet<String> = tokens(b).into_iter().collect();
    set_jaccard(&set_a, &set_b)
}

pub(crate) fn set_jaccard<T: Eq + std::hash::Hash>(a: &HashSet<T>, b: &HashSet<T>) -> f64 {
    let union = a.union(b).count();
    if union == 0 {
        return 0.0;
    }
    a.intersection(b).count() as f64 / union as f64
}

/// Lower-cased tokens longer than three characters, minus stop words.
///
/// Order and duplicates are preserved.
pub fn extract_keywords(text: &str) -> Vec<String> {
    tokens(text)
        .into_iter()
        .filter(|w| w.chars().count() > 3 && !KEYWORD_STOP_SET.contains(w.as_str()))
        .collect()
}

/// Deduplicated keyword set.
pub(crate) fn keyword_set(text: &str) -> HashSet<String> {
    extract_keywords(text).into_iter().collect()
}
