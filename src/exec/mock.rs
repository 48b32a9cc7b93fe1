//! Scripted executor for tests

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use super::outcome::ExecutionOutcome;
use super::CodeExecutor;

/// Pops queued outcomes in order and records every script it was asked to
/// run.
pub struct MockExecutor {
    outcomes: Mutex<VecDeque<ExecutionOutcome>>,
    scripts: Mutex<Vec<String>>,
}

impl MockExecutor {
    pub fn new() -> Self {
        Self {
            outcomes: Mutex::new(VecDeque::new()),
            scripts: Mutex::new(Vec::new()),
        }
    }

    /// Queue an arbitrary outcome
    pub fn push_outcome(&self, outcome: ExecutionOutcome) {
        self.outcomes.lock().unwrap().push_back(outcome);
    }

    /// Queue a successful run with the given printed output
    pub fn push_success(&self, output: impl Into<String>) {
        self.push_outcome(ExecutionOutcome::success(None, output));
    }

    /// Queue a failed run with the given error message
    pub fn push_failure(&self, message: impl Into<String>) {
        self.push_outcome(ExecutionOutcome::error(message));
    }

    /// Scripts executed so far, in order
    pub fn executed_scripts(&self) -> Vec<String> {
        self.scripts.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.scripts.lock().unwrap().len()
    }
}

impl Default for MockExecutor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CodeExecutor for MockExecutor {
    async fn execute(&self, script: &str) -> ExecutionOutcome {
        self.scripts.lock().unwrap().push(script.to_string());
        self.outcomes
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| panic!("MockExecutor: no queued outcome"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_pops_outcomes_in_order() {
        let executor = MockExecutor::new();
        executor.push_failure("NameError: x");
        executor.push_success("done");

        let first = executor.execute("print(x)").await;
        let second = executor.execute("print('done')").await;

        assert!(first.is_error);
        assert!(second.is_success());
        assert_eq!(second.captured_output, "done");
    }

    #[tokio::test]
    async fn test_records_scripts() {
        let executor = MockExecutor::new();
        executor.push_success("");
        executor.push_success("");

        executor.execute("a = 1").await;
        executor.execute("b = 2").await;

        assert_eq!(executor.executed_scripts(), vec!["a = 1", "b = 2"]);
        assert_eq!(executor.call_count(), 2);
    }

    #[tokio::test]
    #[should_panic(expected = "no queued outcome")]
    async fn test_panics_when_queue_empty() {
        let executor = MockExecutor::new();
        executor.execute("pass").await;
    }
}
