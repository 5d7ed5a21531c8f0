//! Configuration and data directory management.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Paths to all ALwrity data locations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataPaths {
    /// Root data directory (e.g., `data/`).
    pub root: PathBuf,
    /// SQLite database directory (`data/db/`).
    pub db: PathBuf,
    /// LLM configuration (`data/llm-config.json`).
    pub llm_config_file: PathBuf,
    /// Scoring and generation settings (`data/alwrity.json`).
    pub settings_file: PathBuf,
}

impl DataPaths {
    /// Create data paths from a root directory. Creates directories if needed.
    pub fn new(root: impl AsRef<Path>) -> std::io::Result<Self> {
        let root = root.as_ref().to_path_buf();
        let paths = Self {
            db: root.join("db"),
            llm_config_file: root.join("llm-config.json"),
            settings_file: root.join("alwrity.json"),
            root,
        };
        std::fs::create_dir_all(&paths.db)?;
        Ok(paths)
    }
}

/// Tunable constants of the section quality heuristics.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ScoringConfig {
    /// Points awarded per connective phrase found.
    pub transition_bonus: f64,
    /// Minimum word-set similarity for two themes to match.
    pub theme_match_threshold: f64,
    /// Weight of the transitional score in narrative flow.
    pub transition_weight: f64,
    /// Weight of the keyword progression score in narrative flow.
    pub progression_weight: f64,
    /// Penalty multiplier per unit of similarity to another section.
    pub uniqueness_penalty: f64,
    pub coherence_weight: f64,
    pub thematic_weight: f64,
    pub narrative_weight: f64,
    /// Number of top n-grams kept as themes.
    pub max_themes: usize,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            transition_bonus: 20.0,
            theme_match_threshold: 0.7,
            transition_weight: 0.6,
            progression_weight: 0.4,
            uniqueness_penalty: 25.0,
            coherence_weight: 0.4,
            thematic_weight: 0.4,
            narrative_weight: 0.2,
            max_themes: 10,
        }
    }
}

/// Generation orchestration settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GenerationConfig {
    /// Delay before progress state is reconciled after a run.
    pub settle_delay_ms: u64,
    /// How long a planned outline stays cached.
    pub outline_cache_ttl_secs: u64,
    /// Maximum number of cached outlines.
    pub outline_cache_capacity: usize,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            settle_delay_ms: 500,
            outline_cache_ttl_secs: 3600,
            outline_cache_capacity: 100,
        }
    }
}

/// Settings persisted in `alwrity.json`. Every field is optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub scoring: ScoringConfig,
    pub generation: GenerationConfig,
}

impl Settings {
    /// Load settings from a JSON file. A missing file yields defaults.
    pub fn load(path: &Path) -> crate::Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(raw) => {
                let settings: Settings = serde_json::from_str(&raw)
                    .map_err(|e| crate::Error::Config(format!("{}: {}", path.display(), e)))?;
                info!("Loaded settings from {}", path.display());
                Ok(settings)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Top-level ALwrity configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlwrityConfig {
    /// HTTP server port.
    pub port: u16,
    /// Data directory paths.
    pub data_paths: DataPaths,
    pub scoring: ScoringConfig,
    pub generation: GenerationConfig,
}

impl AlwrityConfig {
    /// Create configuration from environment, settings file and defaults.
    pub fn from_env(data_dir: impl AsRef<Path>) -> crate::Result<Self> {
        let port = std::env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(3004);

        let data_paths = DataPaths::new(data_dir)?;
        let settings = Settings::load(&data_paths.settings_file).unwrap_or_else(|e| {
            warn!("Ignoring unreadable settings: {}", e);
            Settings::default()
        });

        Ok(Self {
            port,
            data_paths,
            scoring: settings.scoring,
            generation: settings.generation,
        })
    }
}
