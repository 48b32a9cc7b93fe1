//! LLM Client Layer - provider integrations for script generation
//!
//! This module provides:
//! - Provider-neutral message types for LLM communication
//! - CompletionClient trait for API abstraction
//! - Anthropic, OpenAI, and Groq implementations
//! - Retry with exponential backoff
//! - A factory that builds a client from resolved settings

use std::sync::Arc;

use crate::config::ResolvedGeneration;

pub mod anthropic;
pub mod client;
pub mod groq;
pub mod openai;
pub mod retry;
pub mod types;

pub use anthropic::{AnthropicClient, AnthropicConfig};
pub use client::{CompletionClient, LlmError, MockCompletionClient};
pub use groq::{GroqClient, GroqConfig};
pub use openai::{OpenAiClient, OpenAiConfig};
pub use retry::{with_retry, RetryPolicy};
pub use types::{CompletionRequest, CompletionResponse, Message, Role, StopReason, Usage};

/// Build a completion client for the resolved provider
pub fn create_client(resolved: &ResolvedGeneration) -> crate::Result<Arc<dyn CompletionClient>> {
    let client: Arc<dyn CompletionClient> = match resolved.provider.as_str() {
        "anthropic" => {
            let defaults = AnthropicConfig::default();
            let config = AnthropicConfig {
                model: resolved.model.clone(),
                base_url: resolved.base_url.clone().unwrap_or(defaults.base_url),
                api_key_env: resolved.api_key_env.clone(),
                max_tokens: resolved.max_tokens,
                timeout: resolved.timeout,
            };
            Arc::new(AnthropicClient::new(config)?)
        }
        "openai" => {
            let defaults = OpenAiConfig::default();
            let config = OpenAiConfig {
                model: resolved.model.clone(),
                base_url: resolved.base_url.clone().unwrap_or(defaults.base_url),
                api_key_env: resolved.api_key_env.clone(),
                timeout: resolved.timeout,
            };
            Arc::new(OpenAiClient::new(config)?)
        }
        "groq" => {
            let defaults = GroqConfig::default();
            let config = GroqConfig {
                model: resolved.model.clone(),
                base_url: resolved.base_url.clone().unwrap_or(defaults.base_url),
                api_key_env: resolved.api_key_env.clone(),
                timeout: resolved.timeout,
            };
            Arc::new(GroqClient::new(config)?)
        }
        other => return Err(LlmError::UnsupportedProvider(other.to_string()).into()),
    };

    Ok(client)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MendrError;
    use std::time::Duration;

    fn resolved(provider: &str) -> ResolvedGeneration {
        ResolvedGeneration {
            provider: provider.to_string(),
            model: "some-model".to_string(),
            api_key_env: "MENDR_TEST_KEY_THAT_IS_NEVER_SET".to_string(),
            base_url: None,
            max_tokens: 1024,
            temperature: None,
            timeout: Duration::from_secs(30),
            prompt_suffix: None,
        }
    }

    #[test]
    fn test_create_client_unknown_provider() {
        let err = create_client(&resolved("gemini")).unwrap_err();
        assert!(matches!(
            err,
            MendrError::Generation(LlmError::UnsupportedProvider(_))
        ));
    }

    #[test]
    fn test_create_client_missing_key() {
        for provider in ["anthropic", "openai", "groq"] {
            let err = create_client(&resolved(provider)).unwrap_err();
            assert!(matches!(
                err,
                MendrError::Generation(LlmError::MissingApiKey { .. })
            ));
        }
    }
}
