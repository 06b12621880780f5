use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde_json::{json, Value};
use tracing::instrument;

use crate::openai::{build_client, extract_chat_content, POST_TARGET_CHARS};
use crate::prompts;
use crate::provider::{GenerationProvider, ProviderError};

const DEFAULT_BASE_URL: &str = "https://api.perplexity.ai";
const DEFAULT_MODEL: &str = "sonar";
// Online research calls are slower than plain completions.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(45);

/// Research-backed provider. Post generation runs a web search and the
/// response's citation URLs are appended as a trailing `**Sources:**` block
/// with `[n]` markers, the block the content budgeter later preserves.
pub struct PerplexityProvider {
    client: Client,
    api_key: Option<SecretString>,
    base_url: String,
    model: String,
}

impl PerplexityProvider {
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

    async fn complete_raw(
        &self,
        system: &str,
        user: &str,
        max_tokens: u32,
        temperature: f64,
    ) -> Result<Value, ProviderError> {
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
            .post(format!("{}/chat/completions", self.base_url))
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

        resp.json()
            .await
            .map_err(|e| ProviderError::NetworkError(e.to_string()))
    }
}

#[async_trait]
impl GenerationProvider for PerplexityProvider {
    fn name(&self) -> &str {
        "perplexity"
    }

    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    #[instrument(skip(self))]
    async fn generate_post(&self, topic: &str) -> Result<String, ProviderError> {
        let value = self
            .complete_raw(
                prompts::POST_SYSTEM,
                &prompts::research_post(topic, POST_TARGET_CHARS),
                500,
                0.7,
            )
            .await?;

        let mut content = extract_chat_content(&value)?;
        content.push_str(&render_citations(&value));
        Ok(content)
    }

    async fn generate_discussion_prompt(
        &self,
        source_text: &str,
    ) -> Result<String, ProviderError> {
        let value = self
            .complete_raw(
                prompts::DISCUSSION_SYSTEM,
                &prompts::discussion_question(source_text),
                100,
                0.7,
            )
            .await?;
        extract_chat_content(&value)
    }

    async fn shorten(&self, text: &str, max_chars: usize) -> Result<String, ProviderError> {
        let value = self
            .complete_raw(prompts::POST_SYSTEM, &prompts::shorten(text, max_chars), 500, 0.3)
            .await?;
        extract_chat_content(&value)
    }
}

/// Format the response's citation URLs as a trailing sources block, or an
/// empty string when the response carries none.
fn render_citations(value: &Value) -> String {
    let urls: Vec<&str> = value
        .get("citations")
        .and_then(Value::as_array)
        .map(|citations| citations.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default();

    if urls.is_empty() {
        return String::new();
    }

    let mut block = String::from("\n\n**Sources:**");
    for (i, url) in urls.iter().enumerate() {
        block.push_str(&format!("\n[{}] {}", i + 1, url));
    }
    block
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn citations_appended_as_sources_block() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{"message": {"content": "**Remote work insight.**"}}],
                "citations": ["https://example.com/a", "https://example.com/b"]
            })))
            .mount(&server)
            .await;

        let provider =
            PerplexityProvider::with_base_url(Some(SecretString::from("k")), server.uri());
        let post = provider.generate_post("topic").await.unwrap();
        assert!(post.starts_with("**Remote work insight.**"));
        assert!(post.contains("**Sources:**"));
        assert!(post.contains("[1] https://example.com/a"));
        assert!(post.contains("[2] https://example.com/b"));
    }

    #[tokio::test]
    async fn no_citations_leaves_post_untouched() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{"message": {"content": "Plain post."}}]
            })))
            .mount(&server)
            .await;

        let provider =
            PerplexityProvider::with_base_url(Some(SecretString::from("k")), server.uri());
        let post = provider.generate_post("topic").await.unwrap();
        assert_eq!(post, "Plain post.");
    }

    #[tokio::test]
    async fn server_error_mapped() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(500).set_body_string("internal"))
            .mount(&server)
            .await;

        let provider =
            PerplexityProvider::with_base_url(Some(SecretString::from("k")), server.uri());
        let err = provider.generate_post("topic").await.unwrap_err();
        assert!(matches!(err, ProviderError::ServerError { status: 500, .. }));
        assert!(err.is_retryable());
    }
}
