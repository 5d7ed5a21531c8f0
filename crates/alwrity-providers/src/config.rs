//! Provider configuration: LLM selection persisted to JSON, analytics from env.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::types::{LLMConfigResponse, LLMConfigUpdate, LLMProvider};

pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-1.5-flash";

pub const OPENAI_MODELS: &[&str] = &["gpt-4o", "gpt-4o-mini", "gpt-4-turbo", "gpt-3.5-turbo"];
pub const GEMINI_MODELS: &[&str] = &["gemini-1.5-pro", "gemini-1.5-flash", "gemini-2.0-flash"];
pub const DEFAULT_GSC_BASE_URL: &str = "https://www.googleapis.com/";

/// Stored LLM configuration (persisted to llm-config.json).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LLMConfig {
    #[serde(default = "default_preferred")]
    pub preferred_provider: String,
    #[serde(default)]
    pub openai_api_key: Option<String>,
    #[serde(default)]
    pub gemini_api_key: Option<String>,
    #[serde(default = "default_openai_model")]
    pub openai_model: String,
    #[serde(default = "default_gemini_model")]
    pub gemini_model: String,
    /// Sampling temperature for section prose.
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    /// Upper bound on tokens per completion.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: usize,
    /// Path to config file for saving.
    #[serde(skip)]
    pub config_path: PathBuf,
}

fn default_preferred() -> String {
    "auto".into()
}
fn default_openai_model() -> String {
    DEFAULT_OPENAI_MODEL.into()
}
fn default_gemini_model() -> String {
    DEFAULT_GEMINI_MODEL.into()
}
fn default_temperature() -> f64 {
    0.7
}
fn default_max_tokens() -> usize {
    2048
}

impl Default for LLMConfig {
    fn default() -> Self {
        Self {
            preferred_provider: "auto".into(),
            openai_api_key: None,
            gemini_api_key: None,
            openai_model: DEFAULT_OPENAI_MODEL.into(),
            gemini_model: DEFAULT_GEMINI_MODEL.into(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            config_path: PathBuf::new(),
        }
    }
}

impl LLMConfig {
    /// Load config from file, falling back to env vars and defaults.
    pub fn load(config_path: &Path) -> Self {
        let mut config: LLMConfig = std::fs::read_to_string(config_path)
            .ok()
            .and_then(|s| serde_json::from_str(&s).ok())
            .unwrap_or_default();

        config.config_path = config_path.to_path_buf();

        if config.openai_api_key.is_none() {
            config.openai_api_key = std::env::var("OPENAI_API_KEY").ok();
        }
        if config.gemini_api_key.is_none() {
            config.gemini_api_key = std::env::var("GEMINI_API_KEY").ok();
        }

        config
    }

    /// Save config to disk.
    pub fn save(&self) -> alwrity_core::Result<()> {
        if let Some(parent) = self.config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(&self.config_path, json)?;
        info!("Saved LLM config to {}", self.config_path.display());
        Ok(())
    }

    /// Apply an update, merging with existing config.
    pub fn apply_update(&mut self, update: &LLMConfigUpdate) {
        if let Some(p) = &update.preferred_provider {
            self.preferred_provider = p.clone();
        }
        if let Some(k) = &update.openai_api_key {
            self.openai_api_key = Some(k.clone());
        }
        if let Some(k) = &update.gemini_api_key {
            self.gemini_api_key = Some(k.clone());
        }
        if let Some(m) = &update.openai_model {
            self.openai_model = m.clone();
        }
        if let Some(m) = &update.gemini_model {
            self.gemini_model = m.clone();
        }
        if let Some(t) = update.temperature {
            self.temperature = t.clamp(0.0, 2.0);
        }
        if let Some(n) = update.max_tokens {
            self.max_tokens = n.max(1);
        }
    }

    /// Resolve which provider, model and key to use.
    pub fn resolve_provider(&self) -> Option<(LLMProvider, String, String)> {
        if self.preferred_provider != "auto" {
            return match self.preferred_provider.as_str() {
                "openai" => self
                    .openai_api_key
                    .as_ref()
                    .map(|k| (LLMProvider::OpenAI, self.openai_model.clone(), k.clone())),
                "gemini" => self
                    .gemini_api_key
                    .as_ref()
                    .map(|k| (LLMProvider::Gemini, self.gemini_model.clone(), k.clone())),
                _ => None,
            };
        }

        // Auto mode: Gemini > OpenAI
        if let Some(k) = &self.gemini_api_key {
            return Some((LLMProvider::Gemini, self.gemini_model.clone(), k.clone()));
        }
        if let Some(k) = &self.openai_api_key {
            return Some((LLMProvider::OpenAI, self.openai_model.clone(), k.clone()));
        }

        None
    }

    /// Build the public config response (no API keys exposed).
    pub fn to_response(&self) -> LLMConfigResponse {
        let resolved = self.resolve_provider();
        LLMConfigResponse {
            preferred_provider: self.preferred_provider.clone(),
            openai_configured: self.openai_api_key.is_some(),
            gemini_configured: self.gemini_api_key.is_some(),
            openai_model: self.openai_model.clone(),
            gemini_model: self.gemini_model.clone(),
            active_provider: resolved.map(|(p, _, _)| p.to_string()),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            available_models: self.available_models(),
        }
    }

    /// Get available models for the active provider.
    pub fn available_models(&self) -> Vec<String> {
        match self.resolve_provider() {
            Some((LLMProvider::OpenAI, _, _)) => OPENAI_MODELS.iter().map(|s| s.to_string()).collect(),
            Some((LLMProvider::Gemini, _, _)) => GEMINI_MODELS.iter().map(|s| s.to_string()).collect(),
            None => Vec::new(),
        }
    }
}

/// Search Console access settings.
#[derive(Debug, Clone)]
pub struct AnalyticsConfig {
    /// OAuth access token obtained by the sign-in flow.
    pub access_token: Option<String>,
    /// Property URL, e.g. `sc-domain:example.com`.
    pub site_url: Option<String>,
    /// API root the query path is appended to.
    pub base_url: String,
    pub max_attempts: u32,
    pub retry_delay: Duration,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            access_token: None,
            site_url: None,
            base_url: DEFAULT_GSC_BASE_URL.to_string(),
            max_attempts: 3,
            retry_delay: Duration::from_millis(1000),
        }
    }
}

impl AnalyticsConfig {
    /// Read `GSC_ACCESS_TOKEN`, `GSC_SITE_URL`, `GSC_BASE_URL`, `GSC_MAX_ATTEMPTS`
    /// and `GSC_RETRY_DELAY_MS`.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            access_token: std::env::var("GSC_ACCESS_TOKEN")
                .ok()
                .filter(|t| !t.trim().is_empty()),
            site_url: std::env::var("GSC_SITE_URL")
                .ok()
                .filter(|s| !s.trim().is_empty()),
            base_url: std::env::var("GSC_BASE_URL")
                .ok()
                .filter(|s| !s.trim().is_empty())
                .unwrap_or(defaults.base_url),
            max_attempts: std::env::var("GSC_MAX_ATTEMPTS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.max_attempts),
            retry_delay: std::env::var("GSC_RETRY_DELAY_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .map(Duration::from_millis)
                .unwrap_or(defaults.retry_delay),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_auto_prefers_gemini() {
        let config = LLMConfig {
            openai_api_key: Some("sk-o".into()),
            gemini_api_key: Some("g-key".into()),
            ..Default::default()
        };
        let (provider, model, key) = config.resolve_provider().unwrap();
        assert_eq!(provider, LLMProvider::Gemini);
        assert_eq!(model, DEFAULT_GEMINI_MODEL);
        assert_eq!(key, "g-key");
    }

    #[test]
    fn test_resolve_explicit_without_key() {
        let config = LLMConfig {
            preferred_provider: "openai".into(),
            gemini_api_key: Some("g-key".into()),
            ..Default::default()
        };
        assert!(config.resolve_provider().is_none());
        assert!(config.available_models().is_empty());
    }

    #[test]
    fn test_apply_update_and_response() {
        let mut config = LLMConfig::default();
        config.apply_update(&LLMConfigUpdate {
            preferred_provider: Some("openai".into()),
            openai_api_key: Some("sk-test".into()),
            openai_model: Some("gpt-4o".into()),
            temperature: Some(5.0),
            ..Default::default()
        });
        let response = config.to_response();
        assert!(response.openai_configured);
        assert!(!response.gemini_configured);
        assert_eq!(response.active_provider.as_deref(), Some("openai"));
        assert_eq!(response.openai_model, "gpt-4o");
        assert_eq!(response.temperature, 2.0);
        assert_eq!(response.max_tokens, 2048);
        assert!(response.available_models.contains(&"gpt-4o".to_string()));
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("llm-config.json");
        let config = LLMConfig {
            preferred_provider: "gemini".into(),
            gemini_api_key: Some("stored".into()),
            gemini_model: "gemini-1.5-pro".into(),
            config_path: path.clone(),
            ..Default::default()
        };
        config.save().unwrap();

        let loaded = LLMConfig::load(&path);
        assert_eq!(loaded.preferred_provider, "gemini");
        assert_eq!(loaded.gemini_api_key.as_deref(), Some("stored"));
        assert_eq!(loaded.gemini_model, "gemini-1.5-pro");
    }
}
