//! Configuration system for Mendr.
//!
//! Two-layer configuration:
//! 1. Settings file (~/.config/mendr/mendr.yml or .mendr.yml)
//! 2. Per-invocation overrides (CLI flags)

use eyre::Result;
use std::path::PathBuf;

// Re-export main types
pub use self::overrides::{CallOverrides, CallOverridesBuilder};
pub use self::resolution::{ResolvedGeneration, SettingsResolver};
pub use self::settings::{
    ExecutorSettings, HistorySettings, LlmSettings, PromptSettings, ProviderSettings,
    RepairSettings, Settings,
};

mod overrides;
mod resolution;
mod settings;

/// Default model selector.
pub const DEFAULT_MODEL: &str = "anthropic/claude-sonnet-4-20250514";

/// Default directory run history is written to.
pub fn default_history_dir() -> PathBuf {
    dirs::data_local_dir()
        .map(|dir| dir.join("mendr").join("history"))
        .unwrap_or_else(|| PathBuf::from(".mendr-history"))
}

/// Load settings from the standard search paths.
///
/// Search order:
/// 1. Explicit path if provided
/// 2. .mendr.yml in current directory (project settings)
/// 3. ~/.config/mendr/mendr.yml (user settings)
/// 4. Default values
pub fn load_settings(explicit_path: Option<&PathBuf>) -> Result<Settings> {
    Settings::load(explicit_path)
}
