//! Language-model adapter.
//!
//! Defines the [`LanguageModel`] trait and its implementations:
//! - **[`DisabledModel`]**: always fails; used when no provider is configured.
//! - **[`GeminiModel`]**: calls the Gemini `generateContent` REST endpoint.
//!
//! Use [`create_model`] to pick one from configuration.
//!
//! Failures are never retried. Callers turn a [`ModelError`] into the
//! user-facing [`DEGRADED_RESPONSE`] so a reply always has a body.

use anyhow::Result;
use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

use crate::config::ModelConfig;

/// Text returned to the user when the model call fails.
pub const DEGRADED_RESPONSE: &str = "Failed to get AI response.";

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("language model is disabled")]
    Disabled,
    #[error("{0} environment variable not set")]
    MissingApiKey(String),
    #[error("language model quota exhausted: {0}")]
    Quota(String),
    #[error("language model API error {status}: {body}")]
    Http { status: u16, body: String },
    #[error("language model transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("invalid language model response: {0}")]
    InvalidResponse(String),
}

/// A text-generation backend.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Model identifier (e.g. `"gemini-2.5-flash"`).
    fn model_name(&self) -> &str;

    async fn generate(&self, prompt: &str) -> Result<String, ModelError>;
}

// ============ Disabled Model ============

pub struct DisabledModel;

#[async_trait]
impl LanguageModel for DisabledModel {
    fn model_name(&self) -> &str {
        "disabled"
    }

    async fn generate(&self, _prompt: &str) -> Result<String, ModelError> {
        Err(ModelError::Disabled)
    }
}

// ============ Gemini Model ============

/// Gemini `generateContent` client.
///
/// Reads the API key from the environment variable named by
/// `model.api_key_env` (default `GEMINI_API_KEY`) when constructed.
pub struct GeminiModel {
    http: reqwest::Client,
    api_url: String,
    model: String,
    api_key: String,
}

impl GeminiModel {
    pub fn new(config: &ModelConfig) -> Result<Self, ModelError> {
        let api_key = std::env::var(&config.api_key_env)
            .map_err(|_| ModelError::MissingApiKey(config.api_key_env.clone()))?;
        Self::with_api_key(config, api_key)
    }

    pub fn with_api_key(config: &ModelConfig, api_key: impl Into<String>) -> Result<Self, ModelError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            http,
            api_url: config.api_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key: api_key.into(),
        })
    }
}

#[async_trait]
impl LanguageModel for GeminiModel {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn generate(&self, prompt: &str) -> Result<String, ModelError> {
        let url = format!("{}/models/{}:generateContent", self.api_url, self.model);
        let body = serde_json::json!({
            "contents": [{ "parts": [{ "text": prompt }] }],
        });

        let response = self
            .http
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if status.as_u16() == 429 {
            let body_text = response.text().await.unwrap_or_default();
            return Err(ModelError::Quota(body_text));
        }
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            return Err(ModelError::Http {
                status: status.as_u16(),
                body: body_text,
            });
        }

        let json: serde_json::Value = response.json().await?;
        parse_gemini_response(&json)
    }
}

/// Concatenate the text parts of the first candidate.
fn parse_gemini_response(json: &serde_json::Value) -> Result<String, ModelError> {
    let parts = json
        .pointer("/candidates/0/content/parts")
        .and_then(|p| p.as_array())
        .ok_or_else(|| ModelError::InvalidResponse("missing candidates[0].content.parts".into()))?;

    let text: String = parts
        .iter()
        .filter_map(|p| p.get("text").and_then(|t| t.as_str()))
        .collect();

    if text.is_empty() {
        return Err(ModelError::InvalidResponse("empty completion".into()));
    }
    Ok(text)
}

/// Create the [`LanguageModel`] selected by `model.provider`.
///
/// | Config Value | Model |
/// |-------------|-------|
/// | `"disabled"` | [`DisabledModel`] |
/// | `"gemini"` | [`GeminiModel`] |
pub fn create_model(config: &ModelConfig) -> anyhow::Result<Box<dyn LanguageModel>> {
    match config.provider.as_str() {
        "disabled" => Ok(Box::new(DisabledModel)),
        "gemini" => Ok(Box::new(GeminiModel::new(config)?)),
        other => anyhow::bail!("Unknown model provider: {}", other),
    }
}
