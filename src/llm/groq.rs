//! Groq API client implementation
//!
//! Groq serves an OpenAI-compatible chat completions endpoint, so this
//! client reuses the OpenAI wire types against Groq's base URL.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use crate::llm::client::{CompletionClient, LlmError};
use crate::llm::openai::{build_chat_messages, completion_from_chat, post_chat, ChatRequest};
use crate::llm::types::{CompletionRequest, CompletionResponse};

const DEFAULT_BASE_URL: &str = "https://api.groq.com/openai/v1";
const DEFAULT_MODEL: &str = "llama-3.3-70b-versatile";
const DEFAULT_API_KEY_ENV: &str = "GROQ_API_KEY";

/// Configuration for the Groq client
#[derive(Debug, Clone)]
pub struct GroqConfig {
    pub model: String,
    pub base_url: String,
    pub api_key_env: String,
    pub timeout: Duration,
}

impl Default for GroqConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key_env: DEFAULT_API_KEY_ENV.to_string(),
            timeout: Duration::from_secs(120),
        }
    }
}

/// Groq API client
pub struct GroqClient {
    client: Client,
    api_key: String,
    config: GroqConfig,
}

impl GroqClient {
    /// Create a new Groq client
    ///
    /// Reads the API key from the environment variable named in the config
    pub fn new(config: GroqConfig) -> Result<Self, LlmError> {
        let api_key = std::env::var(&config.api_key_env)
            .ok()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| LlmError::MissingApiKey {
                env_var: config.api_key_env.clone(),
            })?;

        Self::with_api_key(api_key, config)
    }

    /// Create a client with an explicit API key
    pub fn with_api_key(api_key: String, config: GroqConfig) -> Result<Self, LlmError> {
        let client = Client::builder().timeout(config.timeout).build()?;

        Ok(Self {
            client,
            api_key,
            config,
        })
    }
}

#[async_trait]
impl CompletionClient for GroqClient {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        let chat_request = ChatRequest {
            model: request
                .model
                .clone()
                .unwrap_or_else(|| self.config.model.clone()),
            messages: build_chat_messages(&request),
            max_tokens: request.max_tokens,
            temperature: request.temperature,
        };

        let response = post_chat(
            &self.client,
            &self.config.base_url,
            &self.api_key,
            &chat_request,
        )
        .await?;
        completion_from_chat(response)
    }

    fn model(&self) -> &str {
        &self.config.model
    }
}

// Keep the API key out of debug output
impl std::fmt::Debug for GroqClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GroqClient")
            .field("model", &self.config.model)
            .field("base_url", &self.config.base_url)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = GroqConfig::default();
        assert_eq!(config.model, DEFAULT_MODEL);
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.api_key_env, DEFAULT_API_KEY_ENV);
    }

    #[test]
    fn test_client_without_api_key() {
        let config = GroqConfig {
            api_key_env: "MENDR_TEST_KEY_THAT_IS_NEVER_SET".to_string(),
            ..Default::default()
        };

        let result = GroqClient::new(config);
        assert!(matches!(result, Err(LlmError::MissingApiKey { .. })));
    }

    #[test]
    fn test_client_model() {
        let client =
            GroqClient::with_api_key("gsk-test".to_string(), GroqConfig::default()).unwrap();
        assert_eq!(client.model(), DEFAULT_MODEL);
    }

    #[test]
    fn test_debug_impl_hides_api_key() {
        let client =
            GroqClient::with_api_key("gsk-secret".to_string(), GroqConfig::default()).unwrap();
        let debug_str = format!("{:?}", client);
        assert!(debug_str.contains("GroqClient"));
        assert!(debug_str.contains(DEFAULT_BASE_URL));
        assert!(!debug_str.contains("gsk-secret"));
    }
}
