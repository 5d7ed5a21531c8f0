//! Content version records.

use alwrity_core::SearchMetrics;
use serde::{Deserialize, Serialize};

/// Snapshot of the full content at one save.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentVersion {
    pub id: String,
    pub content: String,
    /// Save instant in epoch milliseconds.
    pub timestamp: i64,
    /// Most recent day of search metrics, attached after a performance fetch.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metrics: Option<SearchMetrics>,
}

impl ContentVersion {
    pub fn new(id: impl Into<String>, content: impl Into<String>, timestamp: i64) -> Self {
        Self {
            id: id.into(),
            content: content.into(),
            timestamp,
            metrics: None,
        }
    }

    pub fn word_count(&self) -> usize {
        self.content.split_whitespace().count()
    }
}
