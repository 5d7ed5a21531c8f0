//! Section quality scorer.
//!
//! Combines the similarity, theme, coherence and flow heuristics into the
//! five per-section sub-scores. Neighbors are defined purely by position in
//! the outline; an empty neighbor counts as absent.

use alwrity_core::{QualityScores, ScoringConfig};
use tracing::debug;

use crate::coherence::calculate_coherence;
use crate::flow::{calculate_narrative_flow, Direction};
use crate::text::jaccard_similarity;
use crate::themes::calculate_thematic_connection;

/// Texts adjacent to the section being scored.
#[derive(Debug, Clone, Copy, Default)]
pub struct NeighborContext<'a> {
    pub previous: Option<&'a str>,
    pub next: Option<&'a str>,
}

impl<'a> NeighborContext<'a> {
    /// Neighbors of `index` within `texts`, skipping blank ones.
    pub fn from_texts<S: AsRef<str>>(texts: &'a [S], index: usize) -> Self {
        let pick = |i: usize| {
            texts
                .get(i)
                .map(|t| t.as_ref())
                .filter(|t| !t.trim().is_empty())
        };
        Self {
            previous: index.checked_sub(1).and_then(pick),
            next: index.checked_add(1).and_then(pick),
        }
    }

    /// Same as `new` but drops blank strings.
    pub fn new(previous: Option<&'a str>, next: Option<&'a str>) -> Self {
        Self {
            previous: previous.filter(|t| !t.trim().is_empty()),
            next: next.filter(|t| !t.trim().is_empty()),
        }
    }
}

/// Scores generated sections against the rest of their outline.
#[derive(Debug, Clone, Default)]
pub struct SectionScorer {
    config: ScoringConfig,
}

impl SectionScorer {
    pub fn new(config: ScoringConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    /// Score the section at `index` of `texts` against its outline.
    pub fn score<S: AsRef<str>>(&self, texts: &[S], index: usize) -> QualityScores {
        let text = texts.get(index).map(|t| t.as_ref()).unwrap_or("");
        let neighbors = NeighborContext::from_texts(texts, index);
        self.score_with_neighbors(text, texts, index, neighbors)
    }

    /// Score `text` as if it sat at `index`, with explicit neighbors.
    pub fn score_with_neighbors<S: AsRef<str>>(
        &self,
        text: &str,
        texts: &[S],
        index: usize,
        neighbors: NeighborContext<'_>,
    ) -> QualityScores {
        let scores = QualityScores {
            uniqueness_score: self.uniqueness_score(text, texts, index),
            contextual_score: self.contextual_score(text, neighbors),
            coherence_score: self.neighbor_average(text, neighbors, |t, n, _| {
                calculate_coherence(t, n)
            }),
            thematic_score: self.neighbor_average(text, neighbors, |t, n, _| {
                calculate_thematic_connection(t, n, &self.config)
            }),
            narrative_flow_score: self.narrative_flow_score(text, neighbors),
        };
        debug!(
            "Scored section {}: uniqueness={:.1} contextual={:.1} coherence={:.1} thematic={:.1} flow={:.1}",
            index,
            scores.uniqueness_score,
            scores.contextual_score,
            scores.coherence_score,
            scores.thematic_score,
            scores.narrative_flow_score
        );
        scores
    }

    /// 100 minus a distance-weighted similarity penalty against every other section.
    ///
    /// The other sections are renumbered with `index` removed: those before it
    /// keep their position, those after shift back by one. Distance is taken
    /// between that renumbered position and `index`, so the section right after
    /// `index` sits at distance 0.
    pub fn uniqueness_score<S: AsRef<str>>(&self, text: &str, texts: &[S], index: usize) -> f64 {
        let penalty: f64 = texts
            .iter()
            .enumerate()
            .filter(|(j, _)| *j != index)
            .map(|(_, other)| other.as_ref())
            .enumerate()
            .filter(|(_, other)| !other.trim().is_empty())
            .map(|(adjusted, other)| {
                let distance = adjusted.abs_diff(index) as f64;
                let weight = 1.0 / (distance + 1.0);
                jaccard_similarity(text, other) * self.config.uniqueness_penalty * weight
            })
            .sum();
        (100.0 - penalty).clamp(0.0, 100.0)
    }

    /// Running average of 100 with a composite score against each neighbor.
    pub fn contextual_score(&self, text: &str, neighbors: NeighborContext<'_>) -> f64 {
        let mut score = 100.0;
        if let Some(prev) = neighbors.previous {
            score = (score + self.composite(text, prev, Direction::Previous)) / 2.0;
        }
        if let Some(next) = neighbors.next {
            score = (score + self.composite(text, next, Direction::Next)) / 2.0;
        }
        score.clamp(0.0, 100.0)
    }

    /// Narrative flow toward whichever neighbors exist, averaged over both when present.
    pub fn narrative_flow_score(&self, text: &str, neighbors: NeighborContext<'_>) -> f64 {
        self.neighbor_average(text, neighbors, |t, n, dir| {
            calculate_narrative_flow(t, n, dir, &self.config)
        })
    }

    fn composite(&self, text: &str, neighbor: &str, direction: Direction) -> f64 {
        let c = &self.config;
        c.coherence_weight * calculate_coherence(text, neighbor)
            + c.thematic_weight * calculate_thematic_connection(text, neighbor, c)
            + c.narrative_weight * calculate_narrative_flow(text, neighbor, direction, c)
    }

    fn neighbor_average<F>(&self, text: &str, neighbors: NeighborContext<'_>, f: F) -> f64
    where
        F: Fn(&str, &str, Direction) -> f64,
    {
        let values: Vec<f64> = [
            neighbors.previous.map(|p| f(text, p, Direction::Previous)),
            neighbors.next.map(|n| f(text, n, Direction::Next)),
        ]
        .into_iter()
        .flatten()
        .collect();

        if values.is_empty() {
            return 0.0;
        }
        (values.iter().sum::<f64>() / values.len() as f64).clamp(0.0, 100.0)
    }
}
