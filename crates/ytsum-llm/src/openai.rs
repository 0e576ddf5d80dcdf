//! OpenAI chat-completions backend.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use ytsum_models::ProviderTag;

use crate::credentials::CredentialSource;
use crate::error::{LlmError, LlmResult};
use crate::prompt::PromptVariant;
use crate::provider::{
    check_status, ensure_input, http_client, tag_for, BackendSettings, SummarizationProvider,
};

/// Service name used in tags and the registry.
pub const SERVICE: &str = "openai";

/// Credential variable read by `prepare`.
pub const CREDENTIAL_VAR: &str = "OPENAI_API_KEY";

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

/// Summarizes through `POST {base}/v1/chat/completions`.
pub struct OpenAiProvider {
    variant: PromptVariant,
    settings: BackendSettings,
    credentials: Arc<dyn CredentialSource>,
    client: Client,
    api_key: Option<String>,
    tag: ProviderTag,
}

impl OpenAiProvider {
    /// Create a new provider. Credentials are read in `prepare`.
    pub fn new(
        variant: PromptVariant,
        settings: BackendSettings,
        credentials: Arc<dyn CredentialSource>,
        timeout: std::time::Duration,
    ) -> LlmResult<Self> {
        Ok(Self {
            variant,
            settings,
            credentials,
            client: http_client(timeout)?,
            api_key: None,
            tag: tag_for(SERVICE, variant)?,
        })
    }
}

impl std::fmt::Debug for OpenAiProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiProvider")
            .field("tag", &self.tag)
            .field("model", &self.settings.model)
            .field("prepared", &self.api_key.is_some())
            .finish()
    }
}

#[async_trait]
impl SummarizationProvider for OpenAiProvider {
    async fn prepare(&mut self) -> LlmResult<()> {
        if self.api_key.is_some() {
            return Ok(());
        }
        let key = self.credentials.non_blank(CREDENTIAL_VAR).ok_or_else(|| {
            LlmError::preparation(self.tag.as_str(), format!("{CREDENTIAL_VAR} is not set"))
        })?;
        self.api_key = Some(key);
        debug!(provider = %self.tag, "Provider prepared");
        Ok(())
    }

    async fn generate_from_input(&self, input: &str) -> LlmResult<String> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| LlmError::NotPrepared(self.tag.to_string()))?;
        ensure_input(input)?;

        let user_prompt = self.variant.user_prompt(input);
        let request = ChatRequest {
            model: &self.settings.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: self.variant.system_prompt(),
                },
                ChatMessage {
                    role: "user",
                    content: &user_prompt,
                },
            ],
        };

        info!(
            provider = %self.tag,
            model = %self.settings.model,
            input_chars = input.len(),
            "Requesting summary"
        );

        let response = self
            .client
            .post(self.settings.endpoint("/v1/chat/completions"))
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| LlmError::generation(format!("OpenAI request failed: {e}")))?;

        let response: ChatResponse = check_status(response, "OpenAI")
            .await?
            .json()
            .await
            .map_err(|e| LlmError::generation(format!("failed to parse OpenAI response: {e}")))?;

        response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or_else(|| LlmError::generation("no summary generated"))
    }

    fn identify(&self) -> ProviderTag {
        self.tag.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::StaticCredentials;
    use serde_json::{json, Value};
    use std::time::Duration;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn provider(server: &MockServer, credentials: StaticCredentials) -> OpenAiProvider {
        OpenAiProvider::new(
            PromptVariant::Default,
            BackendSettings::new(server.uri(), "gpt-4o-mini"),
            Arc::new(credentials),
            Duration::from_secs(5),
        )
        .unwrap()
    }

    fn keyed() -> StaticCredentials {
        StaticCredentials::new().with(CREDENTIAL_VAR, "sk-test")
    }

    #[tokio::test]
    async fn test_generate_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("authorization", "Bearer sk-test"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{ "message": { "role": "assistant", "content": "A short summary." } }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let mut provider = provider(&server, keyed());
        provider.prepare().await.unwrap();
        let summary = provider.generate_from_input("the transcript").await.unwrap();
        assert_eq!(summary, "A short summary.");

        let requests = server.received_requests().await.unwrap();
        let body: Value = serde_json::from_slice(&requests[0].body).unwrap();
        assert_eq!(body["model"], "gpt-4o-mini");
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["role"], "user");
        assert!(body["messages"][1]["content"]
            .as_str()
            .unwrap()
            .ends_with("the transcript"));
    }

    #[tokio::test]
    async fn test_empty_input_makes_no_request() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let mut provider = provider(&server, keyed());
        provider.prepare().await.unwrap();
        assert!(matches!(
            provider.generate_from_input("  \n").await,
            Err(LlmError::EmptyInput)
        ));
    }

    #[tokio::test]
    async fn test_requires_prepare() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let provider = provider(&server, keyed());
        assert!(matches!(
            provider.generate_from_input("text").await,
            Err(LlmError::NotPrepared(_))
        ));
    }

    #[tokio::test]
    async fn test_prepare_without_credential() {
        let server = MockServer::start().await;
        let mut provider = provider(&server, StaticCredentials::new().with(CREDENTIAL_VAR, ""));

        let err = provider.prepare().await.unwrap_err();
        assert!(err.is_preparation());
        assert!(err.to_string().contains(CREDENTIAL_VAR));
    }

    #[tokio::test]
    async fn test_prepare_is_idempotent() {
        let server = MockServer::start().await;
        let mut provider = provider(&server, keyed());
        provider.prepare().await.unwrap();
        provider.prepare().await.unwrap();
        assert_eq!(provider.identify().as_str(), "openai-default");
    }

    #[tokio::test]
    async fn test_non_success_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).set_body_string("rate limited"))
            .mount(&server)
            .await;

        let mut provider = provider(&server, keyed());
        provider.prepare().await.unwrap();
        let err = provider.generate_from_input("text").await.unwrap_err();
        assert!(matches!(err, LlmError::Generation(_)));
        assert!(err.to_string().contains("rate limited"));
    }

    #[tokio::test]
    async fn test_zero_choices() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "choices": [] })))
            .mount(&server)
            .await;

        let mut provider = provider(&server, keyed());
        provider.prepare().await.unwrap();
        let err = provider.generate_from_input("text").await.unwrap_err();
        assert_eq!(err.to_string(), "Generation failed: no summary generated");
    }
}
