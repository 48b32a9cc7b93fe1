//! Python subprocess executor
//!
//! Each run spawns a fresh interpreter with the harness program, writes the
//! script over stdin, and reads the report from stdout. The child is killed
//! on timeout, which is the property the in-process approach could never
//! give us: a hung script cannot hang the repair loop.

use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use serde_json::{Map, Value};
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use super::harness::{HarnessReport, HarnessRequest, HARNESS_SOURCE};
use super::outcome::ExecutionOutcome;
use super::CodeExecutor;

/// Longest stderr excerpt carried into an error message
const MAX_STDERR_CHARS: usize = 2000;

/// Configuration for the Python executor
#[derive(Debug, Clone)]
pub struct ExecutorConfig {
    /// Interpreter to invoke
    pub python: String,
    /// Wall-clock limit for one script run
    pub timeout: Duration,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            python: "python3".to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

/// Variables accumulated across context-aware runs
#[derive(Debug, Clone, Default)]
pub struct ExecutionContext {
    variables: Map<String, Value>,
}

impl ExecutionContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a variable before the next run
    pub fn set(&mut self, name: impl Into<String>, value: Value) {
        self.variables.insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.variables.get(name)
    }

    pub fn variables(&self) -> &Map<String, Value> {
        &self.variables
    }

    pub fn len(&self) -> usize {
        self.variables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }
}

/// Executor that runs scripts in an isolated Python subprocess
#[derive(Debug, Clone)]
pub struct PythonExecutor {
    config: ExecutorConfig,
}

impl PythonExecutor {
    pub fn new(config: ExecutorConfig) -> Self {
        Self { config }
    }

    /// Run a script and merge its surviving variables into `context` on
    /// success. Failed runs leave the context untouched.
    pub async fn execute_in_context(
        &self,
        script: &str,
        context: &mut ExecutionContext,
    ) -> ExecutionOutcome {
        let (outcome, variables) = self.run_harness(script, &context.variables, true).await;
        if outcome.is_success() {
            context.variables.extend(variables);
        }
        outcome
    }

    async fn run_harness(
        &self,
        script: &str,
        context: &Map<String, Value>,
        export_variables: bool,
    ) -> (ExecutionOutcome, Map<String, Value>) {
        debug!(
            "executing script ({} bytes) with {}",
            script.len(),
            self.config.python
        );

        let envelope = match serde_json::to_vec(&HarnessRequest {
            source: script,
            context,
            export_variables,
        }) {
            Ok(bytes) => bytes,
            Err(e) => {
                return (
                    ExecutionOutcome::error(format!("failed to encode execution request: {}", e)),
                    Map::new(),
                );
            }
        };

        let mut command = Command::new(&self.config.python);
        command
            .arg("-c")
            .arg(HARNESS_SOURCE)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = match command.spawn() {
            Ok(child) => child,
            Err(e) => {
                return (
                    ExecutionOutcome::error(format!(
                        "failed to start {}: {}",
                        self.config.python, e
                    )),
                    Map::new(),
                );
            }
        };

        if let Some(mut stdin) = child.stdin.take() {
            // A write error here means the child died early; the report
            // parse below will surface whatever it left on stderr
            if let Err(e) = stdin.write_all(&envelope).await {
                debug!("failed to write script to interpreter stdin: {}", e);
            }
        }

        let output = match tokio::time::timeout(self.config.timeout, child.wait_with_output()).await
        {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => {
                return (
                    ExecutionOutcome::error(format!(
                        "failed to run {}: {}",
                        self.config.python, e
                    )),
                    Map::new(),
                );
            }
            // Dropping the child's future kills the interpreter
            Err(_) => {
                return (
                    ExecutionOutcome::error(format!(
                        "execution timed out after {}ms",
                        self.config.timeout.as_millis()
                    )),
                    Map::new(),
                );
            }
        };

        // Scripts can write to the real stdout through fd tricks, so the
        // report is whichever non-empty line comes last
        let stdout = String::from_utf8_lossy(&output.stdout);
        let report: Option<HarnessReport> = stdout
            .lines()
            .rev()
            .find(|line| !line.trim().is_empty())
            .and_then(|line| serde_json::from_str(line).ok());

        let report = match report {
            Some(report) => report,
            None => {
                let stderr = String::from_utf8_lossy(&output.stderr);
                let stderr = stderr.trim();
                let message = if stderr.is_empty() {
                    format!("interpreter exited without a report ({})", output.status)
                } else {
                    format!(
                        "interpreter exited without a report: {}",
                        truncate(stderr, MAX_STDERR_CHARS)
                    )
                };
                return (ExecutionOutcome::error(message), Map::new());
            }
        };

        let outcome = if report.is_error {
            ExecutionOutcome::error(report.error_message)
        } else {
            ExecutionOutcome::success(report.returned_value, report.captured_output)
        };

        (outcome, report.variables)
    }
}

impl Default for PythonExecutor {
    fn default() -> Self {
        Self::new(ExecutorConfig::default())
    }
}

#[async_trait]
impl CodeExecutor for PythonExecutor {
    async fn execute(&self, script: &str) -> ExecutionOutcome {
        let (outcome, _) = self.run_harness(script, &Map::new(), false).await;
        outcome
    }
}

fn truncate(text: &str, max: usize) -> &str {
    if text.len() <= max {
        return text;
    }
    let mut end = max;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}
