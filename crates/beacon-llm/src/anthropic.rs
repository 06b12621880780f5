use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde_json::{json, Value};
use tracing::instrument;

use crate::openai::{build_client, POST_TARGET_CHARS};
use crate::prompts;
use crate::provider::{GenerationProvider, ProviderError};

const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";
const DEFAULT_MODEL: &str = "claude-3-5-haiku-latest";
const API_VERSION: &str = "2023-06-01";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

pub struct AnthropicProvider {
    client: Client,
    api_key: Option<SecretString>,
    base_url: String,
    model: String,
}

impl AnthropicProvider {
    pub fn new(api_key: Option<SecretString>) -> Self {
        Self::with_base_url(api_key, DEFAULT_BASE_URL)
    }

    /// Override the API origin. Used by tests to point at a local mock server.
    pub fn with_base_url(api_key: Option<SecretString>, base_url: impl Into<String>) -> Self {
        Self {
            client: build_client(REQUEST_TIMEOUT),
            api_key,
            base_url: base_url.into(),
            model: DEFAULT_MODEL.into(),
        }
    }

    async fn complete(
        &self,
        system: &str,
        user: &str,
        max_tokens: u32,
        temperature: f64,
    ) -> Result<String, ProviderError> {
        let key = self.api_key.as_ref().ok_or(ProviderError::NotConfigured)?;
        let body = json!({
            "model": self.model,
            "max_tokens": max_tokens,
            "temperature": temperature,
            "system": system,
            "messages": [{"role": "user", "content": user}],
        });

        let resp = self
            .client
            .post(format!("{}/v1/messages", self.base_url))
            .header("x-api-key", key.expose_secret())
            .header("anthropic-version", API_VERSION)
            .json(&body)
            .send()
            .await
            .map_err(|e| ProviderError::NetworkError(e.to_string()))?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(ProviderError::from_status(status, body));
        }

        let value: Value = resp
            .json()
            .await
            .map_err(|e| ProviderError::NetworkError(e.to_string()))?;
        extract_message_text(&value)
    }
}

#[async_trait]
impl GenerationProvider for AnthropicProvider {
    fn name(&self) -> &str {
        "anthropic"
    }

    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    #[instrument(skip(self))]
    async fn generate_post(&self, topic: &str) -> Result<String, ProviderError> {
        self.complete(
            prompts::POST_SYSTEM,
            &prompts::research_post(topic, POST_TARGET_CHARS),
            500,
            0.8,
        )
        .await
    }

    async fn generate_discussion_prompt(
        &self,
        source_text: &str,
    ) -> Result<String, ProviderError> {
        self.complete(
            prompts::DISCUSSION_SYSTEM,
            &prompts::discussion_question(source_text),
            100,
            0.8,
        )
        .await
    }

    async fn shorten(&self, text: &str, max_chars: usize) -> Result<String, ProviderError> {
        self.complete(
            prompts::POST_SYSTEM,
            &prompts::shorten(text, max_chars),
            500,
            0.3,
        )
        .await
    }
}

/// Pull `content[0].text` out of a messages-API response.
fn extract_message_text(value: &Value) -> Result<String, ProviderError> {
    value
        .get("content")
        .and_then(|c| c.get(0))
        .and_then(|block| block.get("text"))
        .and_then(Value::as_str)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .ok_or(ProviderError::EmptyResponse)
}
