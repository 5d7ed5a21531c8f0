//! Transition and keyword-progression heuristics for narrative flow.

use serde::{Deserialize, Serialize};

use alwrity_core::ScoringConfig;

use crate::text::keyword_set;

/// Connectives that lead into what follows.
pub const FORWARD_TRANSITIONS: &[&str] = &[
    "therefore",
    "thus",
    "consequently",
    "as a result",
    "hence",
    "accordingly",
    "next",
    "then",
    "subsequently",
    "following this",
    "afterward",
    "later",
    "furthermore",
    "moreover",
    "in addition",
    "additionally",
    "also",
    "besides",
    "similarly",
    "likewise",
    "in the same way",
    "comparatively",
];

/// Connectives that refer back to what came before.
pub const BACKWARD_TRANSITIONS: &[&str] = &[
    "previously",
    "as mentioned earlier",
    "as discussed above",
    "referring back to",
    "in light of",
    "given the above",
    "with this in mind",
    "considering this",
    "building on this",
    "expanding on this",
];

/// Which neighbor a comparison looks at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Previous,
    Next,
}

/// Connective-phrase score in `[0, 100]`.
///
/// `Next` scans `b` for forward connectives, `Previous` scans `a` for
/// backward ones. Each distinct phrase present earns `transition_bonus`.
pub fn check_transitional_phrases(
    a: &str,
    b: &str,
    direction: Direction,
    config: &ScoringConfig,
) -> f64 {
    let (haystack, phrases) = match direction {
        Direction::Next => (b.to_lowercase(), FORWARD_TRANSITIONS),
        Direction::Previous => (a.to_lowercase(), BACKWARD_TRANSITIONS),
    };
    let matches = phrases.iter().filter(|p| haystack.contains(*p)).count();
    (matches as f64 * config.transition_bonus).min(100.0)
}

/// Keyword carry-over score in `[0, 100]`.
///
/// `Next` measures how much of `a`'s vocabulary reappears in `b`;
/// `Previous` measures how much of `b`'s reappears in `a`.
pub fn check_logical_progression(a: &str, b: &str, direction: Direction) -> f64 {
    let (source, target) = match direction {
        Direction::Next => (keyword_set(a), keyword_set(b)),
        Direction::Previous => (keyword_set(b), keyword_set(a)),
    };
    if source.is_empty() {
        return 0.0;
    }
    let shared = source.intersection(&target).count();
    (shared as f64 / source.len() as f64 * 100.0).min(100.0)
}

/// Weighted blend of transitional and progression scores.
pub fn calculate_narrative_flow(
    a: &str,
    b: &str,
    direction: Direction,
    config: &ScoringConfig,
) -> f64 {
    let transitional = check_transitional_phrases(a, b, direction, config);
    let progression = check_logical_progression(a, b, direction);
    config.transition_weight * transitional + config.progression_weight * progression
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transitions_capped_at_100() {
        let cfg = ScoringConfig::default();
        let b = "Therefore we act. Moreover it helps. Furthermore, additionally, \
                 we likewise grow. Consequently sales rise.";
        assert_eq!(check_transitional_phrases("", b, Direction::Next, &cfg), 100.0);
    }

    #[test]
    fn test_transitions_none_is_zero() {
        let cfg = ScoringConfig::default();
        let b = "Plain sentence without any connective words.";
        assert_eq!(check_transitional_phrases("", b, Direction::Next, &cfg), 0.0);
    }

    #[test]
    fn test_transitions_direction_selects_text() {
        let cfg = ScoringConfig::default();
        let a = "As mentioned earlier, budgets matter.";
        let b = "Plain.";
        assert_eq!(check_transitional_phrases(a, b, Direction::Previous, &cfg), 20.0);
        // Forward scan ignores `a`.
        assert_eq!(check_transitional_phrases(a, b, Direction::Next, &cfg), 0.0);
    }

    #[test]
    fn test_transitions_bonus_configurable() {
        let cfg = ScoringConfig {
            transition_bonus: 30.0,
            ..Default::default()
        };
        assert_eq!(
            check_transitional_phrases("", "therefore", Direction::Next, &cfg),
            30.0
        );
    }

    #[test]
    fn test_progression_next() {
        // keywords(a) = {rust, memory}; only "memory" reappears in b.
        let score = check_logical_progression("rust memory", "memory safety", Direction::Next);
        assert_eq!(score, 50.0);
    }

    #[test]
    fn test_progression_previous_swaps_source() {
        // source = keywords(b) = {memory, safety, guarantees}; "memory" in a.
        let score = check_logical_progression(
            "rust memory",
            "memory safety guarantees",
            Direction::Previous,
        );
        assert!((score - 100.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_progression_empty_source() {
        assert_eq!(check_logical_progression("", "anything here", Direction::Next), 0.0);
    }

    #[test]
    fn test_narrative_flow_weights() {
        let cfg = ScoringConfig::default();
        // transitional = 20 (one "therefore"), progression = 100
        let flow = calculate_narrative_flow(
            "budget planning",
            "therefore budget planning",
            Direction::Next,
            &cfg,
        );
        assert!((flow - (0.6 * 20.0 + 0.4 * 100.0)).abs() < 1e-9);
    }
}
