//! The generate-execute-repair loop
//!
//! One run generates a script, executes it, and on failure feeds the script
//! and its error back to the generator for up to `max_iterations` repair
//! rounds. Exhausting the budget is a normal outcome reported in the
//! returned record; only generation failures abort a run.

use std::sync::Arc;

use chrono::Utc;
use log::{info, warn};

use crate::error::Result;
use crate::exec::CodeExecutor;
use crate::generator::CodeGenerator;
use crate::id::generate_run_id;
use crate::repair::report::{Attempt, RepairReport};

/// Drives the repair loop over a generator and an executor
pub struct RepairRunner<G, E> {
    generator: Arc<G>,
    executor: Arc<E>,
}

impl<G, E> RepairRunner<G, E>
where
    G: CodeGenerator,
    E: CodeExecutor,
{
    pub fn new(generator: Arc<G>, executor: Arc<E>) -> Self {
        Self {
            generator,
            executor,
        }
    }

    /// Run one task to completion or exhaustion.
    ///
    /// Executes at most `max_iterations + 1` scripts. Each repair sees only
    /// the immediately preceding script and error, never the whole history.
    pub async fn run(&self, task_description: &str, max_iterations: u32) -> Result<RepairReport> {
        let run_id = generate_run_id();
        info!(
            "run {} starting ({} repair iterations max)",
            run_id, max_iterations
        );

        let mut attempts: Vec<Attempt> = Vec::new();
        let mut fix_iterations = 0;

        let script = self.generator.generate(task_description).await?;
        let outcome = self.executor.execute(&script).await;
        let mut succeeded = outcome.is_success();
        let mut latest_error = outcome.error_message.clone();
        self.log_attempt(&run_id, 0, &outcome.error_message, succeeded);
        attempts.push(Attempt {
            index: 0,
            script: script.clone(),
            outcome,
        });
        let mut latest_script = script;

        if !succeeded {
            for iteration in 1..=max_iterations {
                let script = self
                    .generator
                    .repair(&latest_script, &latest_error)
                    .await?;
                let outcome = self.executor.execute(&script).await;
                succeeded = outcome.is_success();
                latest_error = outcome.error_message.clone();
                self.log_attempt(&run_id, iteration, &outcome.error_message, succeeded);
                attempts.push(Attempt {
                    index: iteration,
                    script: script.clone(),
                    outcome,
                });
                latest_script = script;
                fix_iterations = iteration;

                if succeeded {
                    break;
                }
            }
        }

        info!(
            "run {} finished: {} after {} fix iterations",
            run_id,
            if succeeded { "success" } else { "exhausted" },
            fix_iterations
        );

        Ok(RepairReport {
            run_id,
            task_description: task_description.to_string(),
            attempts,
            fix_iterations,
            created_at: Utc::now(),
        })
    }

    /// Run several tasks concurrently, each with the same iteration budget
    pub async fn run_many(
        &self,
        tasks: &[String],
        max_iterations: u32,
    ) -> Vec<Result<RepairReport>> {
        let futures = tasks
            .iter()
            .map(|task| self.run(task, max_iterations));
        futures::future::join_all(futures).await
    }

    fn log_attempt(&self, run_id: &str, index: u32, error_message: &str, succeeded: bool) {
        if succeeded {
            info!("run {}: attempt {} succeeded", run_id, index);
        } else {
            warn!(
                "run {}: attempt {} failed: {}",
                run_id,
                index,
                error_message.lines().next().unwrap_or("")
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exec::MockExecutor;
    use crate::generator::{GeneratorCall, MockGenerator};

    fn runner(
        generator: MockGenerator,
        executor: MockExecutor,
    ) -> (
        RepairRunner<MockGenerator, MockExecutor>,
        Arc<MockGenerator>,
        Arc<MockExecutor>,
    ) {
        let generator = Arc::new(generator);
        let executor = Arc::new(executor);
        (
            RepairRunner::new(generator.clone(), executor.clone()),
            generator,
            executor,
        )
    }

    #[tokio::test]
    async fn test_first_attempt_success_skips_repair() {
        let generator = MockGenerator::new();
        generator.push_script("print('first try')");
        let executor = MockExecutor::new();
        executor.push_success("first try");

        let (runner, generator, executor) = runner(generator, executor);
        let report = runner.run("say hi", 3).await.unwrap();

        assert!(report.succeeded());
        assert_eq!(report.fix_iterations, 0);
        assert_eq!(report.attempts.len(), 1);
        assert_eq!(generator.call_count(), 1);
        assert_eq!(executor.call_count(), 1);
    }

    #[tokio::test]
    async fn test_failure_then_repair_success() {
        let generator = MockGenerator::new();
        generator.push_script("print(undefined)");
        generator.push_script("print('fixed')");
        let executor = MockExecutor::new();
        executor.push_failure("NameError: name 'undefined' is not defined");
        executor.push_success("fixed");

        let (runner, generator, _executor) = runner(generator, executor);
        let report = runner.run("print something", 3).await.unwrap();

        assert!(report.succeeded());
        assert_eq!(report.fix_iterations, 1);
        assert_eq!(report.attempts.len(), 2);
        assert!(!report.attempts[0].succeeded());
        assert!(report.attempts[1].succeeded());

        // The repair call carries exactly the previous script and its error
        let calls = generator.calls();
        assert_eq!(
            calls[1],
            GeneratorCall::Repair {
                previous_script: "print(undefined)".to_string(),
                error_message: "NameError: name 'undefined' is not defined".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn test_exhaustion_is_reported_not_an_error() {
        let generator = MockGenerator::new();
        generator.push_script("bad 0");
        generator.push_script("bad 1");
        generator.push_script("bad 2");
        let executor = MockExecutor::new();
        executor.push_failure("SyntaxError: invalid syntax");
        executor.push_failure("SyntaxError: invalid syntax");
        executor.push_failure("SyntaxError: invalid syntax");

        let (runner, _generator, executor) = runner(generator, executor);
        let report = runner.run("impossible", 2).await.unwrap();

        assert!(!report.succeeded());
        assert_eq!(report.fix_iterations, 2);
        // Final failing attempt appears exactly once
        assert_eq!(report.attempts.len(), 3);
        assert_eq!(report.attempts[2].index, 2);
        // Exactly max_iterations + 1 executions
        assert_eq!(executor.call_count(), 3);
    }

    #[tokio::test]
    async fn test_zero_iterations_is_single_shot() {
        let generator = MockGenerator::new();
        generator.push_script("broken()");
        let executor = MockExecutor::new();
        executor.push_failure("NameError: name 'broken' is not defined");

        let (runner, generator, executor) = runner(generator, executor);
        let report = runner.run("one shot", 0).await.unwrap();

        assert!(!report.succeeded());
        assert_eq!(report.fix_iterations, 0);
        assert_eq!(report.attempts.len(), 1);
        assert_eq!(generator.call_count(), 1);
        assert_eq!(executor.call_count(), 1);
    }

    #[tokio::test]
    async fn test_repair_feedback_is_latest_only() {
        let generator = MockGenerator::new();
        generator.push_script("v1");
        generator.push_script("v2");
        generator.push_script("v3");
        let executor = MockExecutor::new();
        executor.push_failure("error one");
        executor.push_failure("error two");
        executor.push_success("done");

        let (runner, generator, _executor) = runner(generator, executor);
        let report = runner.run("task", 5).await.unwrap();

        assert!(report.succeeded());
        assert_eq!(report.fix_iterations, 2);

        let calls = generator.calls();
        assert_eq!(calls.len(), 3);
        // Second repair references v2/error two, not v1/error one
        assert_eq!(
            calls[2],
            GeneratorCall::Repair {
                previous_script: "v2".to_string(),
                error_message: "error two".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn test_generation_failure_aborts_run() {
        let generator = MockGenerator::new();
        generator.push_error(crate::MendrError::Generation(
            crate::llm::LlmError::InvalidResponse("empty".to_string()),
        ));
        let executor = MockExecutor::new();

        let (runner, _generator, executor) = runner(generator, executor);
        let result = runner.run("task", 3).await;

        assert!(result.is_err());
        assert_eq!(executor.call_count(), 0);
    }

    #[tokio::test]
    async fn test_repair_generation_failure_aborts_mid_run() {
        let generator = MockGenerator::new();
        generator.push_script("broken()");
        generator.push_error(crate::MendrError::Generation(
            crate::llm::LlmError::ApiError {
                status: 401,
                message: "unauthorized".to_string(),
            },
        ));
        let executor = MockExecutor::new();
        executor.push_failure("NameError: name 'broken' is not defined");

        let (runner, _generator, executor) = runner(generator, executor);
        let result = runner.run("task", 3).await;

        assert!(result.is_err());
        assert_eq!(executor.call_count(), 1);
    }
}
