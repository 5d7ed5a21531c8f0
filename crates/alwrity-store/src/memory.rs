//! Process-local version repository.

use parking_lot::RwLock;

use crate::repository::VersionRepository;
use crate::types::ContentVersion;
use alwrity_core::{Error, Result, SearchMetrics};

/// Versions kept in memory only; lost on restart.
#[derive(Default)]
pub struct MemoryVersionStore {
    versions: RwLock<Vec<ContentVersion>>,
}

impl MemoryVersionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl VersionRepository for MemoryVersionStore {
    fn save(&self, version: &ContentVersion) -> Result<()> {
        let mut versions = self.versions.write();
        if versions.iter().any(|v| v.id == version.id) {
            return Err(Error::InvalidInput(format!(
                "version {} already exists",
                version.id
            )));
        }
        versions.push(version.clone());
        Ok(())
    }

    fn list(&self) -> Result<Vec<ContentVersion>> {
        let mut out = self.versions.read().clone();
        out.sort_by(|a, b| a.timestamp.cmp(&b.timestamp).then_with(|| a.id.cmp(&b.id)));
        Ok(out)
    }

    fn get(&self, id: &str) -> Result<Option<ContentVersion>> {
        Ok(self.versions.read().iter().find(|v| v.id == id).cloned())
    }

    fn update_metrics(&self, id: &str, metrics: &SearchMetrics) -> Result<bool> {
        let mut versions = self.versions.write();
        match versions.iter_mut().find(|v| v.id == id) {
            Some(v) => {
                v.metrics = Some(*metrics);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn delete(&self, id: &str) -> Result<bool> {
        let mut versions = self.versions.write();
        let before = versions.len();
        versions.retain(|v| v.id != id);
        Ok(versions.len() != before)
    }
}
