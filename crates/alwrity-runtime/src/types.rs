//! Runtime types.

use alwrity_core::{QualityScores, SectionType};
use serde::{Deserialize, Serialize};

/// One section of an outline. Position in the outline defines its neighbors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutlineSection {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub keywords: Vec<String>,
    pub estimated_word_count: u32,
    pub section_type: SectionType,
    #[serde(default)]
    pub key_points: Vec<String>,
    /// Generated or edited text. Empty until generated.
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub optimization_score: u8,
    /// Present only after generation; cleared when neighbors change.
    #[serde(flatten)]
    pub scores: Option<QualityScores>,
}

impl OutlineSection {
    pub fn has_content(&self) -> bool {
        !self.content.trim().is_empty()
    }
}

/// Per-section generation state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GenerationStatus {
    Pending,
    Generating,
    Completed,
    Error,
}

impl GenerationStatus {
    /// Whether `self -> next` is a legal step.
    ///
    /// Terminal states only leave through a new generation request.
    pub fn can_transition_to(self, next: GenerationStatus) -> bool {
        use GenerationStatus::*;
        matches!(
            (self, next),
            (Pending, Generating)
                | (Generating, Completed)
                | (Generating, Error)
                | (Completed, Generating)
                | (Error, Generating)
        )
    }
}

impl std::fmt::Display for GenerationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Generating => write!(f, "generating"),
            Self::Completed => write!(f, "completed"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// Transient progress for one section.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationProgress {
    pub status: GenerationStatus,
    pub message: String,
    #[serde(flatten)]
    pub scores: Option<QualityScores>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Default for GenerationProgress {
    fn default() -> Self {
        Self {
            status: GenerationStatus::Pending,
            message: "Waiting to generate".into(),
            scores: None,
            error: None,
        }
    }
}

/// Result of one section generation attempt.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionOutcome {
    pub section_id: String,
    pub status: GenerationStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scores: Option<QualityScores>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SectionOutcome {
    pub fn completed(section_id: impl Into<String>, scores: QualityScores) -> Self {
        Self {
            section_id: section_id.into(),
            status: GenerationStatus::Completed,
            scores: Some(scores),
            error: None,
        }
    }

    pub fn failed(section_id: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            section_id: section_id.into(),
            status: GenerationStatus::Error,
            scores: None,
            error: Some(error.into()),
        }
    }
}

/// Aggregate result of a generate-all run. Partial success is normal.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationReport {
    /// Sections queued at the start of the run.
    pub total: usize,
    pub attempted: usize,
    pub completed: usize,
    pub failed: usize,
    /// Sections left alone because another caller was generating them.
    pub skipped: Vec<String>,
    pub cancelled: bool,
    pub outcomes: Vec<SectionOutcome>,
}

impl GenerationReport {
    pub fn new(total: usize) -> Self {
        Self {
            total,
            ..Default::default()
        }
    }

    pub fn record(&mut self, outcome: SectionOutcome) {
        self.attempted += 1;
        match outcome.status {
            GenerationStatus::Completed => self.completed += 1,
            _ => self.failed += 1,
        }
        self.outcomes.push(outcome);
    }

    pub fn record_skipped(&mut self, section_id: impl Into<String>) {
        self.skipped.push(section_id.into());
    }

    /// "N of M sections generated".
    pub fn summary(&self) -> String {
        let mut s = format!("{} of {} sections generated", self.completed, self.total);
        if self.cancelled {
            s.push_str(" (cancelled)");
        }
        s
    }
}
