//! The summarization provider contract and shared backend settings.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use ytsum_models::ProviderTag;

use crate::error::{LlmError, LlmResult};
use crate::prompt::PromptVariant;

/// A (backend, prompt variant) pair able to summarize a transcript.
///
/// `prepare` is the only mutating operation; once it has succeeded the
/// provider is shared read-only.
#[async_trait]
pub trait SummarizationProvider: Send + Sync {
    /// Acquire credentials. Calling it again after success is a no-op.
    async fn prepare(&mut self) -> LlmResult<()>;

    /// Summarize `input`.
    async fn generate_from_input(&self, input: &str) -> LlmResult<String>;

    /// Deterministic `{service}-{prompt}` name of this provider.
    fn identify(&self) -> ProviderTag;
}

/// Endpoint and model of one backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendSettings {
    /// Base URL, without the `/v1/...` path
    pub base_url: String,
    /// Model identifier
    pub model: String,
}

impl BackendSettings {
    pub fn new(base_url: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            model: model.into(),
        }
    }

    /// Join `path` onto the base URL.
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }
}

/// Settings for every built-in backend.
#[derive(Debug, Clone)]
pub struct ProviderSettings {
    pub openai: BackendSettings,
    pub anthropic: BackendSettings,
    /// Per-request timeout
    pub timeout: Duration,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            openai: BackendSettings::new("https://api.openai.com", "gpt-4o-mini"),
            anthropic: BackendSettings::new("https://api.anthropic.com", "claude-3-5-haiku-latest"),
            timeout: Duration::from_secs(120),
        }
    }
}

impl ProviderSettings {
    /// Create settings from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            openai: BackendSettings {
                base_url: std::env::var("OPENAI_BASE_URL").unwrap_or(defaults.openai.base_url),
                model: std::env::var("OPENAI_MODEL").unwrap_or(defaults.openai.model),
            },
            anthropic: BackendSettings {
                base_url: std::env::var("ANTHROPIC_BASE_URL")
                    .unwrap_or(defaults.anthropic.base_url),
                model: std::env::var("ANTHROPIC_MODEL").unwrap_or(defaults.anthropic.model),
            },
            timeout: std::env::var("YTSUM_HTTP_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.timeout),
        }
    }
}

/// Tag for a built-in backend.
pub(crate) fn tag_for(service: &str, variant: PromptVariant) -> LlmResult<ProviderTag> {
    ProviderTag::new(service, variant.name())
        .ok_or_else(|| LlmError::InvalidProviderName(service.to_string()))
}

pub(crate) fn http_client(timeout: Duration) -> LlmResult<Client> {
    Ok(Client::builder().timeout(timeout).build()?)
}

/// Reject blank input before any request is made.
pub(crate) fn ensure_input(input: &str) -> LlmResult<()> {
    if input.trim().is_empty() {
        return Err(LlmError::EmptyInput);
    }
    Ok(())
}

/// Turn a non-success response into a generation error carrying the body.
pub(crate) async fn check_status(
    response: reqwest::Response,
    backend: &str,
) -> LlmResult<reqwest::Response> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    Err(LlmError::generation(format!("{backend} API returned {status}: {body}")))
}
