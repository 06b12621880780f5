use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde_json::{json, Value};
use tracing::instrument;

use crate::prompts;
use crate::provider::{GenerationProvider, ProviderError};

const DEFAULT_BASE_URL: &str = "https://api.openai.com";
const DEFAULT_MODEL: &str = "gpt-4o-mini";
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Target character count the generation prompt asks for, leaving headroom
/// under the platform ceiling for the discussion question and source URLs.
pub(crate) const POST_TARGET_CHARS: usize = 1200;

pub struct OpenAiProvider {
    client: Client,
    api_key: Option<SecretString>,
    base_url: String,
    model: String,
}

impl OpenAiProvider {
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
            "messages": [
                {"role": "system", "content": system},
                {"role": "user", "content": user},
            ],
            "max_tokens": max_tokens,
            "temperature": temperature,
        });

        let resp = self
            .client
            .post(format!("{}/v1/chat/completions", self.base_url))
            .bearer_auth(key.expose_secret())
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
        extract_chat_content(&value)
    }
}

#[async_trait]
impl GenerationProvider for OpenAiProvider {
    fn name(&self) -> &str {
        "openai"
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

pub(crate) fn build_client(request_timeout: Duration) -> Client {
    Client::builder()
        .connect_timeout(CONNECT_TIMEOUT)
        .timeout(request_timeout)
        .build()
        .expect("failed to build HTTP client")
}

/// Pull `choices[0].message.content` out of a chat-completions response.
pub(crate) fn extract_chat_content(value: &Value) -> Result<String, ProviderError> {
    value
        .get("choices")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("message"))
        .and_then(|m| m.get("content"))
        .and_then(Value::as_str)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .ok_or(ProviderError::EmptyResponse)
}
