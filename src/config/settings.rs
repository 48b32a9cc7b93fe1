//! Settings file schema and loading
//!
//! Loaded from ~/.config/mendr/mendr.yml or .mendr.yml

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Top-level settings for Mendr
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    /// LLM provider settings
    pub llm: LlmSettings,

    /// Repair loop defaults
    pub repair: RepairSettings,

    /// Script execution settings
    pub executor: ExecutorSettings,

    /// Run history settings
    pub history: HistorySettings,

    /// Prompt template overrides
    pub prompts: PromptSettings,
}

impl Settings {
    /// Load settings with fallback chain.
    ///
    /// Search order:
    /// 1. Explicit path if provided
    /// 2. .mendr.yml in current directory
    /// 3. ~/.config/mendr/mendr.yml
    /// 4. Defaults
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        if let Some(path) = config_path {
            return Self::load_from_file(path)
                .context(format!("Failed to load config from {}", path.display()));
        }

        let project_config = PathBuf::from(".mendr.yml");
        if project_config.exists() {
            match Self::load_from_file(&project_config) {
                Ok(settings) => {
                    log::info!("Loaded config from .mendr.yml");
                    return Ok(settings);
                }
                Err(e) => {
                    log::warn!("Failed to load .mendr.yml: {}", e);
                }
            }
        }

        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("mendr").join("mendr.yml");
            if user_config.exists() {
                match Self::load_from_file(&user_config) {
                    Ok(settings) => {
                        log::info!("Loaded config from {}", user_config.display());
                        return Ok(settings);
                    }
                    Err(e) => {
                        log::warn!("Failed to load {}: {}", user_config.display(), e);
                    }
                }
            }
        }

        log::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;
        let settings: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;
        Ok(settings)
    }

    /// Validate the settings.
    pub fn validate(&self) -> Result<()> {
        if self.llm.default_model.is_empty() {
            eyre::bail!("llm.default must not be empty");
        }
        if self.llm.timeout_ms == 0 {
            eyre::bail!("llm.timeout-ms must be > 0");
        }
        if self.llm.max_tokens == 0 {
            eyre::bail!("llm.max-tokens must be > 0");
        }
        if self.executor.python.is_empty() {
            eyre::bail!("executor.python must not be empty");
        }
        if self.executor.timeout_ms == 0 {
            eyre::bail!("executor.timeout-ms must be > 0");
        }
        // repair.max-iterations of 0 is valid: it means single-shot runs
        Ok(())
    }
}

/// LLM provider settings
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LlmSettings {
    /// Default model selector (provider/model format)
    #[serde(rename = "default")]
    pub default_model: String,

    /// Timeout per LLM call in milliseconds
    #[serde(rename = "timeout-ms")]
    pub timeout_ms: u64,

    /// Max tokens per completion
    #[serde(rename = "max-tokens")]
    pub max_tokens: u32,

    /// Sampling temperature; omitted means provider default
    pub temperature: Option<f32>,

    /// Provider configurations
    #[serde(default)]
    pub providers: HashMap<String, ProviderSettings>,
}

impl Default for LlmSettings {
    fn default() -> Self {
        let mut providers = HashMap::new();
        providers.insert(
            "anthropic".to_string(),
            ProviderSettings {
                api_key_env: "ANTHROPIC_API_KEY".to_string(),
                ..Default::default()
            },
        );
        providers.insert(
            "openai".to_string(),
            ProviderSettings {
                api_key_env: "OPENAI_API_KEY".to_string(),
                model: Some("gpt-4o-mini".to_string()),
                ..Default::default()
            },
        );
        providers.insert(
            "groq".to_string(),
            ProviderSettings {
                api_key_env: "GROQ_API_KEY".to_string(),
                model: Some("llama-3.3-70b-versatile".to_string()),
                ..Default::default()
            },
        );

        Self {
            default_model: crate::config::DEFAULT_MODEL.to_string(),
            timeout_ms: 120_000,
            max_tokens: 8192,
            temperature: None,
            providers,
        }
    }
}

/// Per-provider configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct ProviderSettings {
    /// Environment variable for the API key
    #[serde(rename = "api-key-env")]
    pub api_key_env: String,

    /// Base URL override; omitted means the provider's standard endpoint
    #[serde(rename = "base-url")]
    pub base_url: Option<String>,

    /// Model to use when the selector names only the provider
    pub model: Option<String>,

    /// Max tokens for this provider; overrides the llm section
    #[serde(rename = "max-tokens")]
    pub max_tokens: Option<u32>,

    /// Temperature for this provider; overrides the llm section
    pub temperature: Option<f32>,

    /// Extra instructions appended to the system prompt for this provider
    #[serde(rename = "prompt-suffix")]
    pub prompt_suffix: Option<String>,
}

/// Repair loop defaults
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RepairSettings {
    /// Repair rounds after the initial attempt; 0 means single-shot
    #[serde(rename = "max-iterations")]
    pub max_iterations: u32,
}

impl Default for RepairSettings {
    fn default() -> Self {
        Self { max_iterations: 3 }
    }
}

/// Script execution settings
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ExecutorSettings {
    /// Interpreter to invoke
    pub python: String,

    /// Wall-clock limit per script run in milliseconds
    #[serde(rename = "timeout-ms")]
    pub timeout_ms: u64,
}

impl Default for ExecutorSettings {
    fn default() -> Self {
        Self {
            python: "python3".to_string(),
            timeout_ms: 30_000,
        }
    }
}

/// Run history settings
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HistorySettings {
    /// Directory run records are written to
    pub dir: PathBuf,

    /// Disable to skip saving runs entirely
    pub enabled: bool,
}

impl Default for HistorySettings {
    fn default() -> Self {
        Self {
            dir: crate::config::default_history_dir(),
            enabled: true,
        }
    }
}

/// Prompt template overrides; omitted fields use the built-in templates
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct PromptSettings {
    pub system: Option<String>,
    pub generate: Option<String>,
    pub repair: Option<String>,
}
