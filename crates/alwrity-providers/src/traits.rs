//! Collaborator contracts consumed by the generation runtime.

use async_trait::async_trait;

use alwrity_core::{DailyMetrics, DateRange, Result};

use crate::types::{OutlineRequest, PlannedSection, SectionRequest};

/// AI provider for outlines and section prose.
///
/// Implementations must accept single-section requests in any order.
#[async_trait]
pub trait ContentProvider: Send + Sync {
    async fn generate_outline(&self, request: &OutlineRequest) -> Result<Vec<PlannedSection>>;

    async fn generate_section(&self, request: &SectionRequest) -> Result<String>;
}

/// Search-performance source.
///
/// Without a session, calls fail with `Error::Unauthenticated`; an
/// authenticated query with no rows returns an empty series.
#[async_trait]
pub trait SearchAnalytics: Send + Sync {
    async fn daily_metrics(&self, range: &DateRange) -> Result<Vec<DailyMetrics>>;

    fn is_authenticated(&self) -> bool;
}
