use async_trait::async_trait;

/// Typed error hierarchy for generation calls.
#[derive(Clone, Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("provider not configured")]
    NotConfigured,
    #[error("authentication failed: {0}")]
    AuthenticationFailed(String),
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    #[error("rate limited")]
    RateLimited,
    #[error("server error {status}: {body}")]
    ServerError { status: u16, body: String },
    #[error("network error: {0}")]
    NetworkError(String),
    #[error("empty response from provider")]
    EmptyResponse,
}

impl ProviderError {
    /// Classify an HTTP status code into the appropriate error variant.
    pub fn from_status(status: u16, body: String) -> Self {
        match status {
            401 | 403 => Self::AuthenticationFailed(body),
            400 => Self::InvalidRequest(body),
            429 => Self::RateLimited,
            500..=599 => Self::ServerError { status, body },
            _ => Self::InvalidRequest(format!("unexpected status {status}: {body}")),
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::RateLimited | Self::ServerError { .. } | Self::NetworkError(_)
        )
    }

    /// Short classification string for logging.
    pub fn error_kind(&self) -> &'static str {
        match self {
            Self::NotConfigured => "not_configured",
            Self::AuthenticationFailed(_) => "authentication_failed",
            Self::InvalidRequest(_) => "invalid_request",
            Self::RateLimited => "rate_limited",
            Self::ServerError { .. } => "server_error",
            Self::NetworkError(_) => "network_error",
            Self::EmptyResponse => "empty_response",
        }
    }
}

/// Trait implemented by each generation provider (OpenAI, Anthropic,
/// Perplexity) and by the test mock.
#[async_trait]
pub trait GenerationProvider: Send + Sync {
    fn name(&self) -> &str;

    /// Whether credentials are present. Rechecked on each attempted use;
    /// an unconfigured provider is a skip, not a failure.
    fn is_configured(&self) -> bool;

    /// Generate a full post about `topic`.
    async fn generate_post(&self, topic: &str) -> Result<String, ProviderError>;

    /// Generate a short discussion question grounded in `source_text`.
    async fn generate_discussion_prompt(&self, source_text: &str)
        -> Result<String, ProviderError>;

    /// Compress `text` to at most `max_chars` characters, preserving the
    /// headline, key statistics, and citation markers.
    async fn shorten(&self, text: &str, max_chars: usize) -> Result<String, ProviderError>;
}
