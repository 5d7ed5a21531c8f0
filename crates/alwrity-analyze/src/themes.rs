//! N-gram theme extraction and thematic overlap.

use once_cell::sync::Lazy;
use std::collections::{HashMap, HashSet};

use alwrity_core::ScoringConfig;

use crate::text::{set_jaccard, tokens};

/// Smaller stop list used for theme tokens.
pub const THEME_STOP_WORDS: &[&str] = &[
    "and", "the", "this", "that", "with", "from", "have", "been", "were", "they", "their",
];

static THEME_STOP_SET: Lazy<HashSet<&'static str>> =
    Lazy::new(|| THEME_STOP_WORDS.iter().copied().collect());

/// The `limit` most frequent bigrams and trigrams of `text`.
///
/// All bigrams are collected before trigrams; equal counts keep first-seen order.
pub fn extract_themes(text: &str, limit: usize) -> Vec<String> {
    let words: Vec<String> = tokens(text)
        .into_iter()
        .filter(|w| w.chars().count() > 3 && !THEME_STOP_SET.contains(w.as_str()))
        .collect();

    let mut counts: Vec<(String, usize)> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut bump = |gram: String| match index.get(&gram) {
        Some(&i) => counts[i].1 += 1,
        None => {
            index.insert(gram.clone(), counts.len());
            counts.push((gram, 1));
        }
    };

    for pair in words.windows(2) {
        bump(pair.join(" "));
    }
    for triple in words.windows(3) {
        bump(triple.join(" "));
    }

    // sort_by is stable
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts.into_iter().take(limit).map(|(gram, _)| gram).collect()
}

/// Jaccard similarity of two themes' word sets.
pub fn theme_similarity(a: &str, b: &str) -> f64 {
    let set_a: HashSet<&str> = a.split(' ').filter(|w| !w.is_empty()).collect();
    let set_b: HashSet<&str> = b.split(' ').filter(|w| !w.is_empty()).collect();
    set_jaccard(&set_a, &set_b)
}

/// Share of themes in `a` that closely match a theme in `b`, in `[0, 100]`.
pub fn calculate_thematic_connection(a: &str, b: &str, config: &ScoringConfig) -> f64 {
    let themes_a = extract_themes(a, config.max_themes);
    let themes_b = extract_themes(b, config.max_themes);
    if themes_a.is_empty() || themes_b.is_empty() {
        return 0.0;
    }

    let matched = themes_a
        .iter()
        .filter(|ta| {
            themes_b
                .iter()
                .any(|tb| theme_similarity(ta, tb) > config.theme_match_threshold)
        })
        .count();

    let denom = themes_a.len().max(themes_b.len()) as f64;
    (matched as f64 / denom * 100.0).clamp(0.0, 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_themes_ranks_by_frequency() {
        let text = "content marketing drives growth. content marketing builds trust. \
                    content marketing works";
        let themes = extract_themes(text, 10);
        assert_eq!(themes[0], "content marketing");
    }

    #[test]
    fn test_extract_themes_ties_keep_first_seen() {
        // All bigrams appear once: order is positional, bigrams before trigrams.
        let themes = extract_themes("alpha beta gamma delta", 10);
        assert_eq!(
            themes,
            vec![
                "alpha beta",
                "beta gamma",
                "gamma delta",
                "alpha beta gamma",
                "beta gamma delta",
            ]
        );
    }

    #[test]
    fn test_extract_themes_limit() {
        let text = "one1 two2 three3 four4 five5 six6 seven7 eight8 nine9 ten10 eleven11 twelve12";
        assert_eq!(extract_themes(text, 10).len(), 10);
        assert_eq!(extract_themes(text, 3).len(), 3);
    }

    #[test]
    fn test_extract_themes_skips_stop_words_and_short() {
        assert!(extract_themes("the and with a of to", 10).is_empty());
    }

    #[test]
    fn test_theme_similarity() {
        assert_eq!(theme_similarity("search engine", "search engine"), 1.0);
        assert!((theme_similarity("search engine", "engine optimization") - 1.0 / 3.0).abs() < 1e-9);
        assert_eq!(theme_similarity("", ""), 0.0);
    }

    #[test]
    fn test_thematic_connection_empty_is_zero() {
        let cfg = ScoringConfig::default();
        assert_eq!(calculate_thematic_connection("", "", &cfg), 0.0);
        assert_eq!(calculate_thematic_connection("search engine ranking", "", &cfg), 0.0);
    }

    #[test]
    fn test_thematic_connection_identical() {
        let cfg = ScoringConfig::default();
        let text = "search engine optimization improves organic search engine traffic";
        assert_eq!(calculate_thematic_connection(text, text, &cfg), 100.0);
    }

    #[test]
    fn test_thematic_connection_bounded() {
        let cfg = ScoringConfig::default();
        let samples = [
            "",
            "word",
            "keyword research keyword research keyword research",
            "completely unrelated gardening tomatoes compost soil",
            "keyword research tools help writers find keyword research ideas",
        ];
        for a in &samples {
            for b in &samples {
                let score = calculate_thematic_connection(a, b, &cfg);
                assert!((0.0..=100.0).contains(&score), "{} vs {} -> {}", a, b, score);
            }
        }
    }
}
