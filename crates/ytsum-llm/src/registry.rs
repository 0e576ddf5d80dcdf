//! Provider registry.
//!
//! Backends are registered under a service name with a factory taking the
//! prompt variant. `prepare` builds and prepares one (service, variant)
//! pair, then keeps it keyed by its tag for read-only sharing.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use tracing::info;
use ytsum_models::provider_tag::is_valid_component;
use ytsum_models::ProviderTag;

use crate::anthropic::{self, AnthropicProvider};
use crate::credentials::CredentialSource;
use crate::error::{LlmError, LlmResult};
use crate::openai::{self, OpenAiProvider};
use crate::prompt::PromptVariant;
use crate::provider::{ProviderSettings, SummarizationProvider};

/// Builds an unprepared provider for a prompt variant.
pub type ProviderFactory =
    Box<dyn Fn(PromptVariant) -> LlmResult<Box<dyn SummarizationProvider>> + Send + Sync>;

/// A requested (service, variant) pair, written `service[:variant]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProviderCombination {
    pub service: String,
    pub variant: PromptVariant,
}

impl ProviderCombination {
    pub fn new(service: impl Into<String>, variant: PromptVariant) -> Self {
        Self {
            service: service.into(),
            variant,
        }
    }

    /// Tag the prepared provider will carry.
    pub fn tag(&self) -> LlmResult<ProviderTag> {
        ProviderTag::new(&self.service, self.variant.name())
            .ok_or_else(|| LlmError::InvalidProviderName(self.service.clone()))
    }

    /// Parse a comma-separated list such as `openai,anthropic:keypoints`.
    pub fn parse_list(list: &str) -> LlmResult<Vec<Self>> {
        list.split(',')
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .map(str::parse)
            .collect()
    }
}

impl FromStr for ProviderCombination {
    type Err = LlmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (service, variant) = match s.trim().split_once(':') {
            Some((service, variant)) => (service, variant.parse()?),
            None => (s.trim(), PromptVariant::Default),
        };
        let service = service.trim().to_ascii_lowercase();
        if !is_valid_component(&service) {
            return Err(LlmError::InvalidProviderName(service));
        }
        Ok(Self { service, variant })
    }
}

impl fmt::Display for ProviderCombination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.service, self.variant)
    }
}

/// Named provider factories plus the providers prepared so far.
#[derive(Default)]
pub struct ProviderRegistry {
    factories: BTreeMap<String, ProviderFactory>,
    prepared: HashMap<ProviderTag, Arc<dyn SummarizationProvider>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the `openai` and `anthropic` backends.
    pub fn with_defaults(
        settings: ProviderSettings,
        credentials: Arc<dyn CredentialSource>,
    ) -> Self {
        let mut registry = Self::new();

        let openai_settings = settings.openai.clone();
        let openai_credentials = Arc::clone(&credentials);
        let timeout = settings.timeout;
        registry.factories.insert(
            openai::SERVICE.to_string(),
            Box::new(move |variant| {
                let provider = OpenAiProvider::new(
                    variant,
                    openai_settings.clone(),
                    Arc::clone(&openai_credentials),
                    timeout,
                )?;
                Ok(Box::new(provider) as Box<dyn SummarizationProvider>)
            }),
        );

        let anthropic_settings = settings.anthropic;
        registry.factories.insert(
            anthropic::SERVICE.to_string(),
            Box::new(move |variant| {
                let provider = AnthropicProvider::new(
                    variant,
                    anthropic_settings.clone(),
                    Arc::clone(&credentials),
                    timeout,
                )?;
                Ok(Box::new(provider) as Box<dyn SummarizationProvider>)
            }),
        );

        registry
    }

    /// Register a backend under `name`, replacing any previous factory.
    ///
    /// Names must be lowercase alphanumerics so tags stay unambiguous.
    pub fn register(&mut self, name: &str, factory: ProviderFactory) -> LlmResult<()> {
        if !is_valid_component(name) {
            return Err(LlmError::InvalidProviderName(name.to_string()));
        }
        self.factories.insert(name.to_string(), factory);
        Ok(())
    }

    /// Registered service names, sorted.
    pub fn services(&self) -> Vec<&str> {
        self.factories.keys().map(String::as_str).collect()
    }

    /// Build and prepare the provider for `combination`.
    ///
    /// A pair that is already prepared is returned as is.
    pub async fn prepare(
        &mut self,
        combination: &ProviderCombination,
    ) -> LlmResult<Arc<dyn SummarizationProvider>> {
        let tag = combination.tag()?;
        if let Some(provider) = self.prepared.get(&tag) {
            return Ok(Arc::clone(provider));
        }

        let factory = self
            .factories
            .get(&combination.service)
            .ok_or_else(|| LlmError::UnknownService(combination.service.clone()))?;

        let mut provider = factory(combination.variant)?;
        if provider.identify() != tag {
            return Err(LlmError::InvalidProviderName(format!(
                "factory for {} built a provider identifying as {}",
                combination.service,
                provider.identify()
            )));
        }
        provider.prepare().await?;

        info!(provider = %tag, "Prepared summarization provider");
        let provider: Arc<dyn SummarizationProvider> = Arc::from(provider);
        self.prepared.insert(tag, Arc::clone(&provider));
        Ok(provider)
    }

    /// A previously prepared provider.
    pub fn get(&self, tag: &ProviderTag) -> Option<Arc<dyn SummarizationProvider>> {
        self.prepared.get(tag).cloned()
    }
}

impl fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("services", &self.services())
            .field("prepared", &self.prepared.keys().collect::<Vec<_>>())
            .finish()
    }
}
