//! Per-invocation overrides.
//!
//! Applied on top of the settings file when resolving a run.

use serde::{Deserialize, Serialize};

/// Overrides for a single run, typically sourced from CLI flags.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct CallOverrides {
    /// Override the model selector (provider/model format)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    /// Override max tokens per completion.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    /// Override sampling temperature.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,

    /// Override repair iteration cap.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_iterations: Option<u32>,

    /// Override the LLM call timeout in milliseconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,
}

impl CallOverrides {
    /// Create empty overrides (no overrides applied).
    pub fn none() -> Self {
        Self::default()
    }

    /// Check if no overrides are set.
    pub fn is_empty(&self) -> bool {
        self.model.is_none()
            && self.max_tokens.is_none()
            && self.temperature.is_none()
            && self.max_iterations.is_none()
            && self.timeout_ms.is_none()
    }

    /// Create overrides with just a model selector.
    pub fn with_model(model: impl Into<String>) -> Self {
        Self {
            model: Some(model.into()),
            ..Default::default()
        }
    }

    /// Create overrides with just max_iterations.
    pub fn with_max_iterations(max_iterations: u32) -> Self {
        Self {
            max_iterations: Some(max_iterations),
            ..Default::default()
        }
    }
}

/// Builder for CallOverrides.
#[derive(Debug, Default)]
pub struct CallOverridesBuilder {
    overrides: CallOverrides,
}

impl CallOverridesBuilder {
    /// Create a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set model override.
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.overrides.model = Some(model.into());
        self
    }

    /// Set max_tokens override.
    pub fn max_tokens(mut self, tokens: u32) -> Self {
        self.overrides.max_tokens = Some(tokens);
        self
    }

    /// Set temperature override.
    pub fn temperature(mut self, temperature: f32) -> Self {
        self.overrides.temperature = Some(temperature);
        self
    }

    /// Set max_iterations override.
    pub fn max_iterations(mut self, value: u32) -> Self {
        self.overrides.max_iterations = Some(value);
        self
    }

    /// Set timeout_ms override.
    pub fn timeout_ms(mut self, ms: u64) -> Self {
        self.overrides.timeout_ms = Some(ms);
        self
    }

    /// Build the CallOverrides.
    pub fn build(self) -> CallOverrides {
        self.overrides
    }
}
