use std::collections::VecDeque;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::provider::{GenerationProvider, ProviderError};

/// Scripted provider for deterministic tests without API calls.
///
/// Each method pops its next pre-programmed result; an exhausted queue
/// yields `EmptyResponse`. Calls are logged by method name so tests can
/// assert on the sequence of provider interactions.
pub struct MockGenerator {
    configured: bool,
    posts: Mutex<VecDeque<Result<String, ProviderError>>>,
    prompts: Mutex<VecDeque<Result<String, ProviderError>>>,
    shortened: Mutex<VecDeque<Result<String, ProviderError>>>,
    calls: Mutex<Vec<&'static str>>,
}

impl MockGenerator {
    pub fn new() -> Self {
        Self {
            configured: true,
            posts: Mutex::new(VecDeque::new()),
            prompts: Mutex::new(VecDeque::new()),
            shortened: Mutex::new(VecDeque::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// A provider that reports itself unconfigured.
    pub fn unconfigured() -> Self {
        Self {
            configured: false,
            ..Self::new()
        }
    }

    pub fn with_post(self, result: Result<&str, ProviderError>) -> Self {
        self.posts
            .lock()
            .push_back(result.map(str::to_string));
        self
    }

    pub fn with_prompt(self, result: Result<&str, ProviderError>) -> Self {
        self.prompts
            .lock()
            .push_back(result.map(str::to_string));
        self
    }

    pub fn with_shorten(self, result: Result<&str, ProviderError>) -> Self {
        self.shortened
            .lock()
            .push_back(result.map(str::to_string));
        self
    }

    /// Names of the trait methods invoked so far, in order.
    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().clone()
    }

    fn next(
        &self,
        queue: &Mutex<VecDeque<Result<String, ProviderError>>>,
        method: &'static str,
    ) -> Result<String, ProviderError> {
        self.calls.lock().push(method);
        if !self.configured {
            return Err(ProviderError::NotConfigured);
        }
        queue
            .lock()
            .pop_front()
            .unwrap_or(Err(ProviderError::EmptyResponse))
    }
}

impl Default for MockGenerator {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl GenerationProvider for MockGenerator {
    fn name(&self) -> &str {
        "mock"
    }

    fn is_configured(&self) -> bool {
        self.configured
    }

    async fn generate_post(&self, _topic: &str) -> Result<String, ProviderError> {
        self.next(&self.posts, "generate_post")
    }

    async fn generate_discussion_prompt(
        &self,
        _source_text: &str,
    ) -> Result<String, ProviderError> {
        self.next(&self.prompts, "generate_discussion_prompt")
    }

    async fn shorten(&self, _text: &str, _max_chars: usize) -> Result<String, ProviderError> {
        self.next(&self.shortened, "shorten")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn scripted_results_in_order() {
        let mock = MockGenerator::new()
            .with_post(Ok("first"))
            .with_post(Ok("second"));
        assert_eq!(mock.generate_post("t").await.unwrap(), "first");
        assert_eq!(mock.generate_post("t").await.unwrap(), "second");
        assert!(matches!(
            mock.generate_post("t").await.unwrap_err(),
            ProviderError::EmptyResponse
        ));
    }

    #[tokio::test]
    async fn unconfigured_always_errors() {
        let mock = MockGenerator::unconfigured().with_post(Ok("ignored"));
        assert!(!mock.is_configured());
        assert!(matches!(
            mock.generate_post("t").await.unwrap_err(),
            ProviderError::NotConfigured
        ));
    }

    #[tokio::test]
    async fn call_log_records_sequence() {
        let mock = MockGenerator::new()
            .with_post(Ok("p"))
            .with_prompt(Ok("q"));
        let _ = mock.generate_post("t").await;
        let _ = mock.generate_discussion_prompt("p").await;
        let _ = mock.shorten("x", 10).await;
        assert_eq!(
            mock.calls(),
            vec!["generate_post", "generate_discussion_prompt", "shorten"]
        );
    }
}
