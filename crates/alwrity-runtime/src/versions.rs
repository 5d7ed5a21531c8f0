//! Content version tracking and search-performance correlation.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use parking_lot::RwLock;
use serde::Serialize;
use tracing::{info, warn};

use alwrity_analyze::jaccard_similarity;
use alwrity_core::{Clock, DailyMetrics, DateRange, Error, Result, SearchMetrics};
use alwrity_providers::SearchAnalytics;
use alwrity_store::{ContentVersion, VersionRepository};

/// Result of fetching search performance for one version.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceReport {
    pub version_id: String,
    pub range: DateRange,
    pub series: Vec<DailyMetrics>,
    /// Most recent day in the series; also written onto the version.
    pub latest: Option<SearchMetrics>,
}

/// One side of a version comparison.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionSide {
    pub version: ContentVersion,
    pub word_count: usize,
    /// Empty when the fetch for this side failed.
    pub series: Vec<DailyMetrics>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionComparison {
    pub left: VersionSide,
    pub right: VersionSide,
    /// Word-level Jaccard similarity of the two contents, `[0, 1]`.
    pub content_similarity: f64,
    /// `right` word count minus `left` word count.
    pub word_count_delta: i64,
}

/// Saves content snapshots and attaches search metrics to them.
pub struct VersionTracker {
    repo: Arc<dyn VersionRepository>,
    analytics: Arc<dyn SearchAnalytics>,
    clock: Arc<dyn Clock>,
    /// Last fetched daily series per version, for charting.
    series: RwLock<HashMap<String, Vec<DailyMetrics>>>,
}

impl VersionTracker {
    pub fn new(
        repo: Arc<dyn VersionRepository>,
        analytics: Arc<dyn SearchAnalytics>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            repo,
            analytics,
            clock,
            series: RwLock::new(HashMap::new()),
        }
    }

    /// Snapshot `content`. Blank content is ignored and yields `None`.
    pub fn save_version(&self, content: &str) -> Result<Option<ContentVersion>> {
        if content.trim().is_empty() {
            return Ok(None);
        }
        let timestamp = self.clock.now_millis();
        let id = self.unique_id(timestamp)?;
        let version = ContentVersion::new(id, content, timestamp);
        self.repo.save(&version)?;
        info!(
            "Saved version {} ({} words)",
            version.id,
            version.word_count()
        );
        Ok(Some(version))
    }

    fn unique_id(&self, timestamp: i64) -> Result<String> {
        let base = timestamp.to_string();
        if self.repo.get(&base)?.is_none() {
            return Ok(base);
        }
        let mut n = 1;
        loop {
            let candidate = format!("{}-{}", base, n);
            if self.repo.get(&candidate)?.is_none() {
                return Ok(candidate);
            }
            n += 1;
        }
    }

    pub fn list_versions(&self) -> Result<Vec<ContentVersion>> {
        self.repo.list()
    }

    pub fn get_version(&self, id: &str) -> Result<ContentVersion> {
        self.repo
            .get(id)?
            .ok_or_else(|| Error::NotFound(format!("version {}", id)))
    }

    pub fn delete_version(&self, id: &str) -> Result<bool> {
        let deleted = self.repo.delete(id)?;
        if deleted {
            self.series.write().remove(id);
            info!("Deleted version {}", id);
        }
        Ok(deleted)
    }

    pub fn cached_series(&self, id: &str) -> Option<Vec<DailyMetrics>> {
        self.series.read().get(id).cloned()
    }

    /// Fetch daily metrics from the version's save date through today.
    ///
    /// The most recent day overwrites the version's attached metrics. An
    /// empty series leaves them untouched.
    pub async fn fetch_performance(&self, id: &str) -> Result<PerformanceReport> {
        if !self.analytics.is_authenticated() {
            return Err(Error::Unauthenticated(
                "connect Search Console to fetch performance data".into(),
            ));
        }
        let version = self.get_version(id)?;
        let range = DateRange::new(
            date_of(version.timestamp)?,
            self.clock.now().date_naive(),
        );

        let series = self.analytics.daily_metrics(&range).await?;
        let latest = series.iter().max_by_key(|d| d.date).map(|d| d.metrics);
        if let Some(metrics) = &latest {
            self.repo.update_metrics(id, metrics)?;
        }
        info!(
            "Fetched {} days of metrics for version {} ({} to {})",
            series.len(),
            id,
            range.start_date,
            range.end_date
        );
        self.series.write().insert(id.to_string(), series.clone());

        Ok(PerformanceReport {
            version_id: id.to_string(),
            range,
            series,
            latest,
        })
    }

    /// Fetch both versions' performance concurrently and summarise the diff.
    ///
    /// Losing authentication aborts the comparison. Any other failure only
    /// empties that side's series.
    pub async fn compare_versions(&self, left_id: &str, right_id: &str) -> Result<VersionComparison> {
        if left_id == right_id {
            return Err(Error::InvalidInput(
                "select two different versions to compare".into(),
            ));
        }
        let left = self.get_version(left_id)?;
        let right = self.get_version(right_id)?;

        let (left_fetch, right_fetch) = tokio::join!(
            self.fetch_performance(left_id),
            self.fetch_performance(right_id)
        );

        let content_similarity = jaccard_similarity(&left.content, &right.content);
        let word_count_delta = right.word_count() as i64 - left.word_count() as i64;

        Ok(VersionComparison {
            left: self.side(left, left_fetch)?,
            right: self.side(right, right_fetch)?,
            content_similarity,
            word_count_delta,
        })
    }

    fn side(
        &self,
        version: ContentVersion,
        fetched: Result<PerformanceReport>,
    ) -> Result<VersionSide> {
        match fetched {
            Ok(report) => {
                let version = self.get_version(&version.id).unwrap_or(version);
                Ok(VersionSide {
                    word_count: version.word_count(),
                    version,
                    series: report.series,
                    error: None,
                })
            }
            Err(e @ Error::Unauthenticated(_)) => Err(e),
            Err(e) => {
                warn!("Performance fetch failed for version {}: {}", version.id, e);
                Ok(VersionSide {
                    word_count: version.word_count(),
                    version,
                    series: Vec::new(),
                    error: Some(e.to_string()),
                })
            }
        }
    }
}

fn date_of(millis: i64) -> Result<NaiveDate> {
    DateTime::<Utc>::from_timestamp_millis(millis)
        .map(|dt| dt.date_naive())
        .ok_or_else(|| Error::InvalidInput(format!("timestamp {} out of range", millis)))
}
