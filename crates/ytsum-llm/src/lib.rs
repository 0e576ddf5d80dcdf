//! Summarization providers for the ytsum pipeline.
//!
//! This crate provides:
//! - The [`SummarizationProvider`] contract (prepare, generate, identify)
//! - OpenAI chat-completions and Anthropic messages backends
//! - Prompt variants that combine with any backend
//! - A registry that prepares each (backend, variant) pair once

pub mod anthropic;
pub mod credentials;
pub mod error;
pub mod openai;
pub mod prompt;
pub mod provider;
pub mod registry;

pub use anthropic::AnthropicProvider;
pub use credentials::{CredentialSource, EnvCredentials, StaticCredentials};
pub use error::{LlmError, LlmResult};
pub use openai::OpenAiProvider;
pub use prompt::PromptVariant;
pub use provider::{BackendSettings, ProviderSettings, SummarizationProvider};
pub use registry::{ProviderCombination, ProviderFactory, ProviderRegistry};
