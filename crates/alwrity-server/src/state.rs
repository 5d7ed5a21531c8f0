//! Shared application state.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;

use alwrity_core::{AlwrityConfig, Clock, Result};
use alwrity_providers::{
    ContentProvider, LLMConfig, LlmContentProvider, OutlineRequest, PlannedSection,
    SearchAnalytics, SectionRequest,
};
use alwrity_runtime::{GenerationReport, OutlinePlanner, OutlineState, SectionGenerator, VersionTracker};
use alwrity_store::VersionRepository;

/// Content provider resolved from the live LLM config on every call, so a
/// key saved through the config route takes effect without a restart.
pub struct ConfiguredProvider {
    config: Arc<RwLock<LLMConfig>>,
}

impl ConfiguredProvider {
    fn resolve(&self) -> Result<LlmContentProvider> {
        LlmContentProvider::from_config(&self.config.read())
    }
}

#[async_trait]
impl ContentProvider for ConfiguredProvider {
    async fn generate_outline(&self, request: &OutlineRequest) -> Result<Vec<PlannedSection>> {
        let provider = self.resolve()?;
        provider.generate_outline(request).await
    }

    async fn generate_section(&self, request: &SectionRequest) -> Result<String> {
        let provider = self.resolve()?;
        provider.generate_section(request).await
    }
}

/// Shared application state accessible from all route handlers.
pub struct AppState {
    pub config: AlwrityConfig,
    pub llm_config: Arc<RwLock<LLMConfig>>,
    pub analytics: Arc<dyn SearchAnalytics>,
    pub planner: OutlinePlanner,
    pub generator: SectionGenerator,
    pub tracker: VersionTracker,
    pub outlines: RwLock<HashMap<String, Arc<OutlineState>>>,
    /// Last generate-all report per outline.
    pub reports: RwLock<HashMap<String, GenerationReport>>,
}

impl AppState {
    pub fn new(
        config: AlwrityConfig,
        versions: Arc<dyn VersionRepository>,
        analytics: Arc<dyn SearchAnalytics>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let llm_config = Arc::new(RwLock::new(LLMConfig::load(
            &config.data_paths.llm_config_file,
        )));
        let provider = Arc::new(ConfiguredProvider {
            config: llm_config.clone(),
        });
        Self::with_provider(config, llm_config, provider, versions, analytics, clock)
    }

    pub fn with_provider(
        config: AlwrityConfig,
        llm_config: Arc<RwLock<LLMConfig>>,
        provider: Arc<dyn ContentProvider>,
        versions: Arc<dyn VersionRepository>,
        analytics: Arc<dyn SearchAnalytics>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let planner = OutlinePlanner::new(provider.clone(), &config.generation, clock.clone());
        let generator =
            SectionGenerator::new(provider, config.scoring.clone(), &config.generation);
        let tracker = VersionTracker::new(versions, analytics.clone(), clock);

        Self {
            config,
            llm_config,
            analytics,
            planner,
            generator,
            tracker,
            outlines: RwLock::new(HashMap::new()),
            reports: RwLock::new(HashMap::new()),
        }
    }

    pub fn outline(&self, id: &str) -> Option<Arc<OutlineState>> {
        self.outlines.read().get(id).cloned()
    }

    pub fn insert_outline(&self, outline: OutlineState) -> Arc<OutlineState> {
        let outline = Arc::new(outline);
        self.outlines
            .write()
            .insert(outline.id().to_string(), outline.clone());
        outline
    }
}
