//! Resolving effective generation parameters.
//!
//! Merges the settings file, the model selector, and per-invocation
//! overrides into one flat description of how to call the LLM.

use std::time::Duration;

use super::{CallOverrides, ProviderSettings, Settings};

/// Fully resolved parameters for a generation backend.
#[derive(Debug, Clone)]
pub struct ResolvedGeneration {
    /// Provider key (anthropic, openai, groq)
    pub provider: String,

    /// Model identifier passed to the provider
    pub model: String,

    /// Environment variable holding the API key
    pub api_key_env: String,

    /// Base URL override; None means the provider's standard endpoint
    pub base_url: Option<String>,

    /// Max tokens per completion
    pub max_tokens: u32,

    /// Sampling temperature; None means provider default
    pub temperature: Option<f32>,

    /// Timeout per LLM call
    pub timeout: Duration,

    /// Extra instructions appended to the system prompt
    pub prompt_suffix: Option<String>,
}

/// Resolver that merges settings with per-invocation overrides.
#[derive(Debug)]
pub struct SettingsResolver {
    settings: Settings,
}

impl SettingsResolver {
    /// Create a new resolver over the given settings.
    pub fn new(settings: Settings) -> Self {
        Self { settings }
    }

    /// Resolve the effective generation parameters.
    ///
    /// Selector forms:
    /// - `provider/model` names both explicitly
    /// - a bare provider name uses that provider's configured model
    /// - any other bare token is a model under the default provider
    pub fn resolve(&self, overrides: &CallOverrides) -> eyre::Result<ResolvedGeneration> {
        let llm = &self.settings.llm;
        let selector = overrides.model.as_deref().unwrap_or(&llm.default_model);
        let (provider, model_part) = self.split_selector(selector);

        let entry = llm.providers.get(&provider).ok_or_else(|| {
            eyre::eyre!(
                "Unknown provider '{}'; configure it under llm.providers",
                provider
            )
        })?;

        if entry.api_key_env.is_empty() {
            eyre::bail!("Provider '{}' has no api-key-env configured", provider);
        }

        let model = self.pick_model(&provider, model_part, entry)?;

        // Precedence per field: llm section < provider entry < per-call override
        Ok(ResolvedGeneration {
            provider,
            model,
            api_key_env: entry.api_key_env.clone(),
            base_url: entry.base_url.clone(),
            max_tokens: overrides
                .max_tokens
                .or(entry.max_tokens)
                .unwrap_or(llm.max_tokens),
            temperature: overrides
                .temperature
                .or(entry.temperature)
                .or(llm.temperature),
            timeout: Duration::from_millis(overrides.timeout_ms.unwrap_or(llm.timeout_ms)),
            prompt_suffix: entry.prompt_suffix.clone(),
        })
    }

    fn split_selector(&self, selector: &str) -> (String, Option<String>) {
        if let Some((provider, model)) = selector.split_once('/') {
            let model = (!model.is_empty()).then(|| model.to_string());
            return (provider.to_string(), model);
        }
        if self.settings.llm.providers.contains_key(selector) {
            return (selector.to_string(), None);
        }
        // Bare model name: attach it to the default selector's provider
        let default_provider = self
            .settings
            .llm
            .default_model
            .split_once('/')
            .map(|(provider, _)| provider)
            .unwrap_or(&self.settings.llm.default_model);
        (default_provider.to_string(), Some(selector.to_string()))
    }

    fn pick_model(
        &self,
        provider: &str,
        model_part: Option<String>,
        entry: &ProviderSettings,
    ) -> eyre::Result<String> {
        if let Some(model) = model_part {
            return Ok(model);
        }
        if let Some(model) = &entry.model {
            return Ok(model.clone());
        }
        // The default selector's model applies when it names this provider
        if let Some((default_provider, default_model)) =
            self.settings.llm.default_model.split_once('/')
        {
            if default_provider == provider && !default_model.is_empty() {
                return Ok(default_model.to_string());
            }
        }
        eyre::bail!("No model configured for provider '{}'", provider)
    }
}
