use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde_json::{json, Value};
use tracing::instrument;

use crate::sink::{DestinationSink, SinkError};

const DEFAULT_BASE_URL: &str = "https://discord.com/api/v10";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Chat-platform destination. Posts messages to a single channel through the
/// platform's bot REST API and can read a posted message back to count its
/// reactions.
pub struct ChatSink {
    client: Client,
    bot_token: Option<SecretString>,
    channel_id: Option<String>,
    base_url: String,
}

impl ChatSink {
    pub fn new(bot_token: Option<SecretString>, channel_id: Option<String>) -> Self {
        Self::with_base_url(bot_token, channel_id, DEFAULT_BASE_URL)
    }

    /// Override the API origin. Used by tests to point at a local mock server.
    pub fn with_base_url(
        bot_token: Option<SecretString>,
        channel_id: Option<String>,
        base_url: impl Into<String>,
    ) -> Self {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("failed to build HTTP client");
        Self {
            client,
            bot_token,
            channel_id,
            base_url: base_url.into(),
        }
    }

    fn credentials(&self) -> Result<(&SecretString, &str), SinkError> {
        match (&self.bot_token, &self.channel_id) {
            (Some(token), Some(channel)) => Ok((token, channel)),
            _ => Err(SinkError::NotConfigured),
        }
    }

    /// Total reaction count on a previously posted message. Used by the
    /// engagement probe a few minutes after a scheduled post goes out.
    #[instrument(skip(self))]
    pub async fn reaction_count(&self, message_id: &str) -> Result<u64, SinkError> {
        let (token, channel) = self.credentials()?;

        let resp = self
            .client
            .get(format!(
                "{}/channels/{}/messages/{}",
                self.base_url, channel, message_id
            ))
            .header("Authorization", format!("Bot {}", token.expose_secret()))
            .send()
            .await
            .map_err(|e| SinkError::Network(e.to_string()))?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(SinkError::from_status(status, body));
        }

        let value: Value = resp
            .json()
            .await
            .map_err(|e| SinkError::Network(e.to_string()))?;

        let total = value
            .get("reactions")
            .and_then(Value::as_array)
            .map(|reactions| {
                reactions
                    .iter()
                    .filter_map(|r| r.get("count").and_then(Value::as_u64))
                    .sum()
            })
            .unwrap_or(0);
        Ok(total)
    }
}

#[async_trait]
impl DestinationSink for ChatSink {
    fn name(&self) -> &str {
        "chat"
    }

    fn is_configured(&self) -> bool {
        self.bot_token.is_some() && self.channel_id.is_some()
    }

    #[instrument(skip(self, text))]
    async fn send(&self, text: &str) -> Result<Option<String>, SinkError> {
        let (token, channel) = self.credentials()?;

        let resp = self
            .client
            .post(format!("{}/channels/{}/messages", self.base_url, channel))
            .header("Authorization", format!("Bot {}", token.expose_secret()))
            .json(&json!({ "content": text }))
            .send()
            .await
            .map_err(|e| SinkError::Network(e.to_string()))?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(SinkError::from_status(status, body));
        }

        let value: Value = resp
            .json()
            .await
            .map_err(|e| SinkError::Network(e.to_string()))?;
        Ok(value
            .get("id")
            .and_then(Value::as_str)
            .map(str::to_string))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn sink(server: &MockServer) -> ChatSink {
        ChatSink::with_base_url(
            Some(SecretString::from("bot-token")),
            Some("chan-1".into()),
            server.uri(),
        )
    }

    #[tokio::test]
    async fn send_posts_content_and_returns_message_id() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/channels/chan-1/messages"))
            .and(header("Authorization", "Bot bot-token"))
            .and(body_json(serde_json::json!({"content": "hello"})))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"id": "m-77"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let id = sink(&server).send("hello").await.unwrap();
        assert_eq!(id.as_deref(), Some("m-77"));
    }

    #[tokio::test]
    async fn missing_credentials_is_not_configured() {
        let sink = ChatSink::new(None, Some("chan-1".into()));
        assert!(!sink.is_configured());
        assert!(matches!(
            sink.send("hello").await.unwrap_err(),
            SinkError::NotConfigured
        ));
    }

    #[tokio::test]
    async fn reaction_count_sums_all_reactions() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/channels/chan-1/messages/m-77"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "m-77",
                "reactions": [{"count": 3}, {"count": 2}]
            })))
            .mount(&server)
            .await;

        let count = sink(&server).reaction_count("m-77").await.unwrap();
        assert_eq!(count, 5);
    }

    #[tokio::test]
    async fn reaction_count_defaults_to_zero() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/channels/chan-1/messages/m-77"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"id": "m-77"})),
            )
            .mount(&server)
            .await;

        let count = sink(&server).reaction_count("m-77").await.unwrap();
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn http_error_carries_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/channels/chan-1/messages"))
            .respond_with(ResponseTemplate::new(403).set_body_string("missing access"))
            .mount(&server)
            .await;

        let err = sink(&server).send("hello").await.unwrap_err();
        assert!(matches!(err, SinkError::Http { status: 403, .. }));
    }
}
