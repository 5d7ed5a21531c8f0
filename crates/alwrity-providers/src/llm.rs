//! LLM-backed content provider (OpenAI chat completions, Gemini generateContent).

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use tracing::{debug, error};

use alwrity_core::{Error, Result};

use crate::config::LLMConfig;
use crate::prompts;
use crate::traits::ContentProvider;
use crate::types::{LLMProvider, OutlineRequest, PlannedSection, SectionRequest};

const OPENAI_URL: &str = "https://api.openai.com/v1/chat/completions";
const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// Content provider that prompts a hosted LLM.
pub struct LlmContentProvider {
    client: Client,
    provider: LLMProvider,
    model: String,
    api_key: String,
    temperature: f64,
    max_tokens: usize,
}

impl LlmContentProvider {
    pub fn new(provider: LLMProvider, model: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            provider,
            model: model.into(),
            api_key: api_key.into(),
            temperature: 0.7,
            max_tokens: 2048,
        }
    }

    /// Build from the resolved provider in `config`.
    pub fn from_config(config: &LLMConfig) -> Result<Self> {
        let (provider, model, api_key) = config
            .resolve_provider()
            .ok_or_else(|| Error::Config("No LLM provider configured".into()))?;
        Ok(Self::new(provider, model, api_key)
            .with_temperature(config.temperature)
            .with_max_tokens(config.max_tokens))
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: usize) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn provider(&self) -> LLMProvider {
        self.provider
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Single non-streaming completion.
    pub async fn complete(&self, system: &str, user: &str) -> Result<String> {
        debug!("Completion via {} model {}", self.provider, self.model);
        let text = match self.provider {
            LLMProvider::OpenAI => self.complete_openai(system, user).await?,
            LLMProvider::Gemini => self.complete_gemini(system, user).await?,
        };
        if text.trim().is_empty() {
            return Err(Error::Provider(format!("{} returned no text", self.provider)));
        }
        Ok(text)
    }

    async fn complete_openai(&self, system: &str, user: &str) -> Result<String> {
        let body = json!({
            "model": self.model,
            "messages": [
                {"role": "system", "content": system},
                {"role": "user", "content": user},
            ],
            "temperature": self.temperature,
            "max_tokens": self.max_tokens,
        });

        let response = self
            .client
            .post(OPENAI_URL)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::Http(format!("Request failed: {}", e)))?;

        let parsed = read_json(response).await?;
        Ok(openai_text(&parsed))
    }

    async fn complete_gemini(&self, system: &str, user: &str) -> Result<String> {
        let url = format!("{}/{}:generateContent", GEMINI_BASE_URL, self.model);
        let body = json!({
            "systemInstruction": {"parts": [{"text": system}]},
            "contents": [{"role": "user", "parts": [{"text": user}]}],
            "generationConfig": {
                "temperature": self.temperature,
                "maxOutputTokens": self.max_tokens,
            },
        });

        let response = self
            .client
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::Http(format!("Request failed: {}", e)))?;

        let parsed = read_json(response).await?;
        Ok(gemini_text(&parsed))
    }
}

async fn read_json(response: reqwest::Response) -> Result<Value> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        error!("LLM API error {}: {}", status, body);
        return Err(Error::Provider(format!("API error {}: {}", status, body)));
    }
    response
        .json::<Value>()
        .await
        .map_err(|e| Error::Provider(format!("Invalid response body: {}", e)))
}

fn openai_text(parsed: &Value) -> String {
    parsed["choices"][0]["message"]["content"]
        .as_str()
        .unwrap_or_default()
        .to_string()
}

fn gemini_text(parsed: &Value) -> String {
    parsed["candidates"][0]["content"]["parts"]
        .as_array()
        .map(|parts| {
            parts
                .iter()
                .filter_map(|p| p["text"].as_str())
                .collect::<Vec<_>>()
                .join("")
        })
        .unwrap_or_default()
}

#[async_trait]
impl ContentProvider for LlmContentProvider {
    async fn generate_outline(&self, request: &OutlineRequest) -> Result<Vec<PlannedSection>> {
        let prompt = prompts::outline_prompt(request)?;
        let raw = self.complete(prompts::OUTLINE_SYSTEM_PROMPT, &prompt).await?;
        prompts::parse_outline(&raw)
    }

    async fn generate_section(&self, request: &SectionRequest) -> Result<String> {
        let prompt = prompts::section_prompt(request);
        let raw = self.complete(prompts::SECTION_SYSTEM_PROMPT, &prompt).await?;
        let text = prompts::clean_section_text(&raw);
        if text.is_empty() {
            return Err(Error::Generation(format!(
                "empty content for section \"{}\"",
                request.title
            )));
        }
        Ok(text)
    }
}
