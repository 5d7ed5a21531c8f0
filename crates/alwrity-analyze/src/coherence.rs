//! Keyword-overlap coherence between two texts.

use crate::text::keyword_set;

/// Shared keywords over the larger keyword set, in `[0, 100]`.
pub fn calculate_coherence(a: &str, b: &str) -> f64 {
    let kw_a = keyword_set(a);
    let kw_b = keyword_set(b);
    let denom = kw_a.len().max(kw_b.len());
    if denom == 0 {
        return 0.0;
    }
    kw_a.intersection(&kw_b).count() as f64 / denom as f64 * 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coherence_symmetric() {
        let pairs = [
            ("keyword research drives content", "content strategy needs research"),
            ("apples oranges", "bananas"),
            ("", "something meaningful here"),
            ("same same same words", "same words"),
        ];
        for (a, b) in pairs {
            assert_eq!(calculate_coherence(a, b), calculate_coherence(b, a));
        }
    }

    #[test]
    fn test_coherence_empty() {
        assert_eq!(calculate_coherence("", ""), 0.0);
        assert_eq!(calculate_coherence("the and", "with from"), 0.0);
    }

    #[test]
    fn test_coherence_ratio() {
        // {keyword, research, drives, content} vs {content, strategy, needs, research}
        let score = calculate_coherence(
            "keyword research drives content",
            "content strategy needs research",
        );
        assert_eq!(score, 50.0);
    }
}
