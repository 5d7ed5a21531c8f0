//! Content types shared across crates.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Role a section plays within an outline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionType {
    Introduction,
    Body,
    Conclusion,
    Faq,
    CaseStudy,
}

impl Default for SectionType {
    fn default() -> Self {
        Self::Body
    }
}

impl std::fmt::Display for SectionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Introduction => write!(f, "introduction"),
            Self::Body => write!(f, "body"),
            Self::Conclusion => write!(f, "conclusion"),
            Self::Faq => write!(f, "faq"),
            Self::CaseStudy => write!(f, "case_study"),
        }
    }
}

impl std::str::FromStr for SectionType {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace([' ', '-'], "_").as_str() {
            "introduction" | "intro" => Ok(Self::Introduction),
            "body" => Ok(Self::Body),
            "conclusion" => Ok(Self::Conclusion),
            "faq" => Ok(Self::Faq),
            "case_study" => Ok(Self::CaseStudy),
            other => Err(crate::Error::InvalidInput(format!(
                "unknown section type: {}",
                other
            ))),
        }
    }
}

/// The five per-section quality sub-scores, each in `[0, 100]`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QualityScores {
    pub uniqueness_score: f64,
    pub contextual_score: f64,
    pub coherence_score: f64,
    pub thematic_score: f64,
    pub narrative_flow_score: f64,
}

impl QualityScores {
    /// Rounded mean of the five sub-scores, used as the section's optimization score.
    pub fn optimization_score(&self) -> u8 {
        let sum = self.uniqueness_score
            + self.contextual_score
            + self.coherence_score
            + self.thematic_score
            + self.narrative_flow_score;
        (sum / 5.0).round().clamp(0.0, 100.0) as u8
    }
}

/// Aggregated search-performance numbers for one period.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SearchMetrics {
    pub clicks: f64,
    pub impressions: f64,
    pub ctr: f64,
    pub position: f64,
}

/// One day of search-performance data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyMetrics {
    pub date: NaiveDate,
    #[serde(flatten)]
    pub metrics: SearchMetrics,
}

/// Inclusive date range for analytics queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateRange {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl DateRange {
    /// Build a range, swapping the ends if given backwards.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        if start <= end {
            Self {
                start_date: start,
                end_date: end,
            }
        } else {
            Self {
                start_date: end,
                end_date: start,
            }
        }
    }
}
