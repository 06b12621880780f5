use std::sync::Arc;

use beacon_core::settings::GenerationSettings;

use crate::anthropic::AnthropicProvider;
use crate::openai::OpenAiProvider;
use crate::perplexity::PerplexityProvider;
use crate::provider::GenerationProvider;

/// Construct the configured provider. Selection happens exactly once, here;
/// everything downstream sees only the trait object.
pub fn provider_from_settings(settings: &GenerationSettings) -> Arc<dyn GenerationProvider> {
    match settings.provider.as_str() {
        "anthropic" => Arc::new(AnthropicProvider::new(settings.anthropic_api_key.clone())),
        "perplexity" => Arc::new(PerplexityProvider::new(
            settings.perplexity_api_key.clone(),
        )),
        "openai" => Arc::new(OpenAiProvider::new(settings.openai_api_key.clone())),
        other => {
            tracing::warn!(provider = other, "unknown generation provider, using openai");
            Arc::new(OpenAiProvider::new(settings.openai_api_key.clone()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::SecretString;

    #[test]
    fn selects_by_name() {
        let mut settings = GenerationSettings::default();
        settings.provider = "anthropic".into();
        settings.anthropic_api_key = Some(SecretString::from("k"));
        let provider = provider_from_settings(&settings);
        assert_eq!(provider.name(), "anthropic");
        assert!(provider.is_configured());
    }

    #[test]
    fn unknown_name_falls_back_to_openai() {
        let mut settings = GenerationSettings::default();
        settings.provider = "mystery".into();
        let provider = provider_from_settings(&settings);
        assert_eq!(provider.name(), "openai");
        assert!(!provider.is_configured());
    }

    #[test]
    fn perplexity_without_key_is_unconfigured() {
        let mut settings = GenerationSettings::default();
        settings.provider = "perplexity".into();
        let provider = provider_from_settings(&settings);
        assert_eq!(provider.name(), "perplexity");
        assert!(!provider.is_configured());
    }
}
