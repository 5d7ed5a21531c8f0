//! Storage-agnostic interface for content versions.

use alwrity_core::{Result, SearchMetrics};

use crate::types::ContentVersion;

/// Persistence for [`ContentVersion`] snapshots.
///
/// Versions are immutable once saved apart from their attached metrics.
pub trait VersionRepository: Send + Sync {
    /// Insert a new version. Fails with `InvalidInput` if the id already exists.
    fn save(&self, version: &ContentVersion) -> Result<()>;

    /// All versions, oldest first.
    fn list(&self) -> Result<Vec<ContentVersion>>;

    fn get(&self, id: &str) -> Result<Option<ContentVersion>>;

    /// Replace the attached metrics. Returns false if the version does not exist.
    fn update_metrics(&self, id: &str, metrics: &SearchMetrics) -> Result<bool>;

    /// Remove a version. Returns false if it did not exist.
    fn delete(&self, id: &str) -> Result<bool>;

    fn count(&self) -> Result<usize> {
        Ok(self.list()?.len())
    }
}
