//! Text generation for scheduled posts.
//!
//! One [`GenerationProvider`] trait with one implementation per upstream
//! API, selected once at construction by [`factory::provider_from_settings`].
//! Callers never branch on provider names at runtime.

mod anthropic;
mod factory;
pub mod fallback;
mod mock;
mod openai;
mod perplexity;
pub mod prompts;
mod provider;

pub use anthropic::AnthropicProvider;
pub use factory::provider_from_settings;
pub use mock::MockGenerator;
pub use openai::OpenAiProvider;
pub use perplexity::PerplexityProvider;
pub use provider::{GenerationProvider, ProviderError};
