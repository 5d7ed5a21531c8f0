//! Outline planning with a result cache.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info};
use uuid::Uuid;

use alwrity_core::{Clock, Error, GenerationConfig, Result};
use alwrity_providers::{ContentProvider, OutlineRequest, PlannedSection};

use crate::cache::{outline_cache_key, TtlCache};
use crate::types::OutlineSection;

/// Sections ready to load into an [`crate::OutlineState`].
#[derive(Debug, Clone)]
pub struct PlannedOutline {
    pub title: String,
    pub sections: Vec<OutlineSection>,
    /// True when served from the cache without a provider call.
    pub cached: bool,
}

pub struct OutlinePlanner {
    provider: Arc<dyn ContentProvider>,
    cache: TtlCache<Vec<PlannedSection>>,
}

impl OutlinePlanner {
    pub fn new(
        provider: Arc<dyn ContentProvider>,
        config: &GenerationConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            provider,
            cache: TtlCache::new(
                config.outline_cache_capacity,
                Duration::from_secs(config.outline_cache_ttl_secs),
                clock,
            ),
        }
    }

    pub async fn plan(&self, request: &OutlineRequest) -> Result<PlannedOutline> {
        let subject = request
            .subject()
            .ok_or_else(|| Error::InvalidInput("title or query is required".into()))?
            .to_string();

        let key = outline_cache_key(request)?;
        if let Some(planned) = self.cache.get(&key) {
            debug!("Outline cache hit for \"{}\"", subject);
            return Ok(PlannedOutline {
                title: subject,
                sections: materialize(planned),
                cached: true,
            });
        }

        let planned = self.provider.generate_outline(request).await?;
        if planned.is_empty() {
            return Err(Error::Generation(format!(
                "provider returned an empty outline for \"{}\"",
                subject
            )));
        }
        info!("Planned {} sections for \"{}\"", planned.len(), subject);
        self.cache.put(key, planned.clone());

        Ok(PlannedOutline {
            title: subject,
            sections: materialize(planned),
            cached: false,
        })
    }

    pub fn clear_cache(&self) {
        self.cache.clear();
    }
}

/// Fresh ids each time, so a cached plan never shares ids with a live outline.
fn materialize(planned: Vec<PlannedSection>) -> Vec<OutlineSection> {
    planned
        .into_iter()
        .map(|p| OutlineSection {
            id: Uuid::new_v4().to_string(),
            title: p.title,
            keywords: p.keywords,
            estimated_word_count: p.word_count.max(1),
            section_type: p.section_type,
            key_points: p.key_points,
            content: String::new(),
            optimization_score: p.optimization_score.min(100),
            scores: None,
        })
        .collect()
}
