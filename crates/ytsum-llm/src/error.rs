//! Error types for summarization providers.

use thiserror::Error;

/// Result type for provider operations.
pub type LlmResult<T> = Result<T, LlmError>;

/// Errors raised by providers and the provider registry.
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("Provider {provider} has failed to prepare: {message}")]
    Preparation { provider: String, message: String },

    #[error("Provider {0} is not prepared, call prepare() first")]
    NotPrepared(String),

    #[error("Empty input provided")]
    EmptyInput,

    #[error("Generation failed: {0}")]
    Generation(String),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid provider name: {0}")]
    InvalidProviderName(String),

    #[error("Unknown summarization service: {0}")]
    UnknownService(String),

    #[error("Unknown prompt variant: {0}")]
    UnknownPromptVariant(String),
}

impl LlmError {
    /// Create a preparation error.
    pub fn preparation(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Preparation {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Create a generation error.
    pub fn generation(message: impl Into<String>) -> Self {
        Self::Generation(message.into())
    }

    /// Whether this error came from `prepare`.
    pub fn is_preparation(&self) -> bool {
        matches!(self, Self::Preparation { .. })
    }
}
