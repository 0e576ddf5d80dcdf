//! Anthropic messages backend.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

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

pub const SERVICE: &str = "anthropic";
pub const CREDENTIAL_VAR: &str = "ANTHROPIC_API_KEY";

const API_VERSION: &str = "2023-06-01";
const MAX_TOKENS: u32 = 2048;

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    system: &'a str,
    messages: Vec<Message<'a>>,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

/// Summarizes through `POST {base}/v1/messages`.
pub struct AnthropicProvider {
    variant: PromptVariant,
    settings: BackendSettings,
    credentials: Arc<dyn CredentialSource>,
    client: Client,
    api_key: Option<String>,
    tag: ProviderTag,
}

impl AnthropicProvider {
    /// Create a new provider. Credentials are read in `prepare`.
    pub fn new(
        variant: PromptVariant,
        settings: BackendSettings,
        credentials: Arc<dyn CredentialSource>,
        timeout: Duration,
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

impl fmt::Debug for AnthropicProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnthropicProvider")
            .field("tag", &self.tag)
            .field("model", &self.settings.model)
            .field("prepared", &self.api_key.is_some())
            .finish()
    }
}

#[async_trait]
impl SummarizationProvider for AnthropicProvider {
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
        let request = MessagesRequest {
            model: &self.settings.model,
            max_tokens: MAX_TOKENS,
            system: self.variant.system_prompt(),
            messages: vec![Message {
                role: "user",
                content: &user_prompt,
            }],
        };

        info!(
            provider = %self.tag,
            model = %self.settings.model,
            input_chars = input.len(),
            "Requesting summary"
        );

        let response = self
            .client
            .post(self.settings.endpoint("/v1/messages"))
            .header("x-api-key", api_key)
            .header("anthropic-version", API_VERSION)
            .json(&request)
            .send()
            .await
            .map_err(|e| LlmError::generation(format!("Anthropic request failed: {e}")))?;

        let response: MessagesResponse = check_status(response, "Anthropic")
            .await?
            .json()
            .await
            .map_err(|e| {
                LlmError::generation(format!("failed to parse Anthropic response: {e}"))
            })?;

        response
            .content
            .into_iter()
            .find(|block| block.kind == "text")
            .and_then(|block| block.text)
            .filter(|text| !text.trim().is_empty())
            .ok_or_else(|| LlmError::generation("received empty response from API"))
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
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn provider(server: &MockServer, variant: PromptVariant) -> AnthropicProvider {
        AnthropicProvider::new(
            variant,
            BackendSettings::new(server.uri(), "claude-3-5-haiku-latest"),
            Arc::new(StaticCredentials::new().with(CREDENTIAL_VAR, "ak-test")),
            Duration::from_secs(5),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_generate_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/messages"))
            .and(header("x-api-key", "ak-test"))
            .and(header("anthropic-version", "2023-06-01"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "msg_1",
                "type": "message",
                "role": "assistant",
                "content": [{ "type": "text", "text": "- point one\n- point two" }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let mut provider = provider(&server, PromptVariant::KeyPoints);
        provider.prepare().await.unwrap();
        let summary = provider.generate_from_input("the transcript").await.unwrap();
        assert_eq!(summary, "- point one\n- point two");
        assert_eq!(provider.identify().as_str(), "anthropic-keypoints");

        let requests = server.received_requests().await.unwrap();
        let body: Value = serde_json::from_slice(&requests[0].body).unwrap();
        assert_eq!(body["max_tokens"], 2048);
        assert_eq!(body["system"], PromptVariant::KeyPoints.system_prompt());
        assert_eq!(body["messages"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_empty_content() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "content": [] })))
            .mount(&server)
            .await;

        let mut provider = provider(&server, PromptVariant::Default);
        provider.prepare().await.unwrap();
        let err = provider.generate_from_input("text").await.unwrap_err();
        assert!(matches!(err, LlmError::Generation(_)));
    }

    #[tokio::test]
    async fn test_server_error_body_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
            .mount(&server)
            .await;

        let mut provider = provider(&server, PromptVariant::Default);
        provider.prepare().await.unwrap();
        let err = provider.generate_from_input("text").await.unwrap_err();
        assert!(matches!(err, LlmError::Generation(_)));
        assert!(err.to_string().contains("503"));
        assert!(err.to_string().contains("overloaded"));
    }

    #[tokio::test]
    async fn test_empty_input_makes_no_request() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let mut provider = provider(&server, PromptVariant::Default);
        provider.prepare().await.unwrap();
        assert!(matches!(
            provider.generate_from_input("").await,
            Err(LlmError::EmptyInput)
        ));
    }
}
