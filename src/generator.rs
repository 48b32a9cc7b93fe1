//! Script generation backed by a completion client
//!
//! The generator renders a prompt, asks the provider for a completion, and
//! extracts a bare Python script from the response. Providers tend to wrap
//! code in markdown fences even when told not to, so extraction is always
//! applied.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use log::{debug, warn};

use crate::error::Result;
use crate::llm::{
    with_retry, CompletionClient, CompletionRequest, LlmError, RetryPolicy, Usage,
};
use crate::prompt::{GenerateContext, PromptRenderer, PromptSet, RepairContext};

const DEFAULT_MAX_TOKENS: u32 = 8192;

/// Produces Python scripts from task descriptions and failure feedback
#[async_trait]
pub trait CodeGenerator: Send + Sync {
    /// Generate a first-attempt script for the task
    async fn generate(&self, task_description: &str) -> Result<String>;

    /// Generate a corrected script given the previous script and the error
    /// it produced
    async fn repair(&self, previous_script: &str, error_message: &str) -> Result<String>;
}

/// LLM-backed generator
pub struct ScriptGenerator {
    client: Arc<dyn CompletionClient>,
    prompts: PromptSet,
    renderer: PromptRenderer,
    retry: RetryPolicy,
    max_tokens: u32,
    temperature: Option<f32>,
    usage: Mutex<Usage>,
}

impl ScriptGenerator {
    /// Create a generator with default prompts and retry policy
    pub fn new(client: Arc<dyn CompletionClient>) -> Self {
        Self {
            client,
            prompts: PromptSet::default(),
            renderer: PromptRenderer::new(),
            retry: RetryPolicy::default(),
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: None,
            usage: Mutex::new(Usage::default()),
        }
    }

    /// Replace the prompt set
    pub fn with_prompts(mut self, prompts: PromptSet) -> Self {
        self.prompts = prompts;
        self
    }

    /// Replace the retry policy
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Set max tokens for completions
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Set sampling temperature for completions
    pub fn with_temperature(mut self, temperature: Option<f32>) -> Self {
        self.temperature = temperature;
        self
    }

    /// Cumulative token usage across all completions so far
    pub fn total_usage(&self) -> Usage {
        self.usage.lock().unwrap().clone()
    }

    async fn complete_and_extract(&self, user_prompt: String) -> Result<String> {
        let mut request = CompletionRequest::new(self.prompts.system.clone())
            .with_user_message(user_prompt)
            .with_max_tokens(self.max_tokens);
        if let Some(temperature) = self.temperature {
            request = request.with_temperature(temperature);
        }

        let response = with_retry(&self.retry, || self.client.complete(request.clone())).await?;

        self.usage.lock().unwrap().add(&response.usage);
        debug!(
            "completion from {} used {} tokens",
            self.client.model(),
            response.usage.total()
        );

        if response.stop_reason.is_truncated() {
            warn!("completion hit the max_tokens limit, script may be incomplete");
        }

        let script = strip_code_fences(&response.content);
        if script.is_empty() {
            return Err(
                LlmError::InvalidResponse("provider returned an empty script".to_string()).into(),
            );
        }

        Ok(script)
    }
}

#[async_trait]
impl CodeGenerator for ScriptGenerator {
    async fn generate(&self, task_description: &str) -> Result<String> {
        debug!(
            "generating script for task ({} chars)",
            task_description.len()
        );
        let context = GenerateContext { task_description };
        let user_prompt = self.renderer.render(&self.prompts.generate, &context)?;
        self.complete_and_extract(user_prompt).await
    }

    async fn repair(&self, previous_script: &str, error_message: &str) -> Result<String> {
        debug!(
            "repairing script after: {}",
            error_message.lines().next().unwrap_or("")
        );
        let context = RepairContext {
            previous_script,
            error_message,
        };
        let user_prompt = self.renderer.render(&self.prompts.repair, &context)?;
        self.complete_and_extract(user_prompt).await
    }
}

/// Extract a bare script from a completion that may wrap it in markdown
/// fences. The first fenced block wins; without fences the trimmed text is
/// returned as-is.
pub fn strip_code_fences(text: &str) -> String {
    let trimmed = text.trim();
    let Some(start) = trimmed.find("```") else {
        return trimmed.to_string();
    };

    let after = &trimmed[start + 3..];
    // The opening fence may carry a language tag; the body starts on the
    // next line
    let body = match after.find('\n') {
        Some(i) => &after[i + 1..],
        None => after.strip_prefix("python").unwrap_or(after),
    };
    let body = match body.find("```") {
        Some(end) => &body[..end],
        None => body,
    };
    body.trim().to_string()
}

/// One recorded call to a mock generator
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GeneratorCall {
    Generate {
        task_description: String,
    },
    Repair {
        previous_script: String,
        error_message: String,
    },
}

/// Scripted generator for tests. Pops queued results in order and records
/// every call it receives.
pub struct MockGenerator {
    results: Mutex<VecDeque<Result<String>>>,
    calls: Mutex<Vec<GeneratorCall>>,
}

impl MockGenerator {
    pub fn new() -> Self {
        Self {
            results: Mutex::new(VecDeque::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Queue a script to return from the next call
    pub fn push_script(&self, script: impl Into<String>) {
        self.results.lock().unwrap().push_back(Ok(script.into()));
    }

    /// Queue an error to return from the next call
    pub fn push_error(&self, err: crate::MendrError) {
        self.results.lock().unwrap().push_back(Err(err));
    }

    /// Calls received so far, in order
    pub fn calls(&self) -> Vec<GeneratorCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    fn next_result(&self) -> Result<String> {
        self.results
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| panic!("MockGenerator: no queued result"))
    }
}

impl Default for MockGenerator {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CodeGenerator for MockGenerator {
    async fn generate(&self, task_description: &str) -> Result<String> {
        self.calls.lock().unwrap().push(GeneratorCall::Generate {
            task_description: task_description.to_string(),
        });
        self.next_result()
    }

    async fn repair(&self, previous_script: &str, error_message: &str) -> Result<String> {
        self.calls.lock().unwrap().push(GeneratorCall::Repair {
            previous_script: previous_script.to_string(),
            error_message: error_message.to_string(),
        });
        self.next_result()
    }
}
