//! Request and response shapes exchanged with providers.

use alwrity_core::SectionType;
use serde::{Deserialize, Serialize};

/// LLM provider identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LLMProvider {
    OpenAI,
    Gemini,
}

impl std::fmt::Display for LLMProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LLMProvider::OpenAI => write!(f, "openai"),
            LLMProvider::Gemini => write!(f, "gemini"),
        }
    }
}

/// Request for a fresh outline.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutlineRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub query: Option<String>,
    /// Search Console findings to steer the outline, passed through as-is.
    #[serde(default)]
    pub gsc_insights: Option<serde_json::Value>,
    #[serde(default = "default_structure")]
    pub outline_structure: String,
}

fn default_structure() -> String {
    "standard".into()
}

impl OutlineRequest {
    /// Title if given, otherwise the query.
    pub fn subject(&self) -> Option<&str> {
        self.title
            .as_deref()
            .or(self.query.as_deref())
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

/// One section proposed by the outline provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlannedSection {
    pub title: String,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default, alias = "word_count", alias = "estimatedWordCount")]
    pub word_count: u32,
    #[serde(default, alias = "key_points")]
    pub key_points: Vec<String>,
    #[serde(default, alias = "section_type")]
    pub section_type: SectionType,
    #[serde(default, alias = "optimization_score")]
    pub optimization_score: u8,
}

/// Request for one section's prose.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionRequest {
    pub title: String,
    pub keywords: Vec<String>,
    pub section_type: SectionType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_content: Option<String>,
    pub global_context: String,
}

/// Partial update to the persisted LLM configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LLMConfigUpdate {
    pub preferred_provider: Option<String>,
    pub openai_api_key: Option<String>,
    pub gemini_api_key: Option<String>,
    pub openai_model: Option<String>,
    pub gemini_model: Option<String>,
    pub temperature: Option<f64>,
    pub max_tokens: Option<usize>,
}

/// Public view of the LLM configuration. Never carries keys.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LLMConfigResponse {
    pub preferred_provider: String,
    pub openai_configured: bool,
    pub gemini_configured: bool,
    pub openai_model: String,
    pub gemini_model: String,
    pub active_provider: Option<String>,
    pub temperature: f64,
    pub max_tokens: usize,
    pub available_models: Vec<String>,
}
