//! Prompt templates and rendering
//!
//! Templates are Handlebars strings. The generate template takes a task
//! description; the repair template takes the previous script and the error
//! it produced. Defaults can be overridden per-field from configuration.

use handlebars::Handlebars;
use serde::Serialize;

use crate::config::PromptSettings;
use crate::error::{MendrError, Result};

/// System prompt sent with every completion
pub const DEFAULT_SYSTEM_PROMPT: &str = "\
You are a Python coding assistant. You write correct, runnable Python code. \
Respond with only executable Python code, without explanations or surrounding prose.";

/// Template for first-attempt generation
pub const DEFAULT_GENERATE_TEMPLATE: &str = "\
Please provide Python code that solves the following problem. The code should:
- Use standard Python syntax and conventions
- Include necessary imports at the beginning
- Be properly indented and formatted
- Include brief inline comments for clarity
- Handle basic error cases
- Return or print the required output

Return only the executable Python code without explanations.
Problem:
{{task_description}}
";

/// Template for repairing a failed script
pub const DEFAULT_REPAIR_TEMPLATE: &str = "\
The following script was generated to solve a task, but it did not work.

### Original Script:
{{previous_script}}

### Error Message:
{{error_message}}

Please analyze the error and provide a corrected version of the script. Keep
the original intent, include necessary imports, and add comments where the
corrections are made.

Provide only the corrected script below:
";

/// The three prompt templates a generator works with
#[derive(Debug, Clone)]
pub struct PromptSet {
    pub system: String,
    pub generate: String,
    pub repair: String,
}

impl Default for PromptSet {
    fn default() -> Self {
        Self {
            system: DEFAULT_SYSTEM_PROMPT.to_string(),
            generate: DEFAULT_GENERATE_TEMPLATE.to_string(),
            repair: DEFAULT_REPAIR_TEMPLATE.to_string(),
        }
    }
}

impl PromptSet {
    /// Build a prompt set from settings, falling back to defaults per field
    pub fn from_settings(settings: &PromptSettings) -> Self {
        let defaults = Self::default();
        Self {
            system: settings.system.clone().unwrap_or(defaults.system),
            generate: settings.generate.clone().unwrap_or(defaults.generate),
            repair: settings.repair.clone().unwrap_or(defaults.repair),
        }
    }

    /// Append extra instructions to the system prompt
    pub fn append_suffix(mut self, suffix: &str) -> Self {
        if !suffix.is_empty() {
            self.system = format!("{}\n\n{}", self.system, suffix);
        }
        self
    }
}

/// Context for rendering the generate template
#[derive(Debug, Serialize)]
pub struct GenerateContext<'a> {
    pub task_description: &'a str,
}

/// Context for rendering the repair template
#[derive(Debug, Serialize)]
pub struct RepairContext<'a> {
    pub previous_script: &'a str,
    pub error_message: &'a str,
}

/// Renders prompt templates using Handlebars templating
pub struct PromptRenderer {
    handlebars: Handlebars<'static>,
}

impl Default for PromptRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl PromptRenderer {
    /// Create a new PromptRenderer with default settings
    pub fn new() -> Self {
        let mut handlebars = Handlebars::new();
        // Missing variables render empty instead of erroring
        handlebars.set_strict_mode(false);
        // Scripts and error messages must pass through unescaped
        handlebars.register_escape_fn(handlebars::no_escape);
        Self { handlebars }
    }

    /// Render a template string with any serializable context
    pub fn render<T: Serialize>(&self, template: &str, context: &T) -> Result<String> {
        self.handlebars
            .render_template(template, context)
            .map_err(|e| MendrError::Template(format!("Failed to render template: {}", e)))
    }
}
