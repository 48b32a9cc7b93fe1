//! Repair loop integration tests
//!
//! Drives the full generate-execute-repair flow with mocks, checking
//! attempt ordering, iteration accounting, and history persistence.

use std::sync::Arc;

use mendr::error::Result;
use mendr::exec::MockExecutor;
use mendr::generator::{GeneratorCall, MockGenerator, ScriptGenerator};
use mendr::history::HistoryStore;
use mendr::llm::{LlmError, MockCompletionClient};
use mendr::repair::RepairRunner;
use mendr::MendrError;
use tempfile::TempDir;

fn runner(
    generator: MockGenerator,
    executor: MockExecutor,
) -> RepairRunner<MockGenerator, MockExecutor> {
    RepairRunner::new(Arc::new(generator), Arc::new(executor))
}

/// Integration test: a buggy first script gets repaired on the next round
#[tokio::test]
async fn test_repair_fixes_first_failure() -> Result<()> {
    let generator = MockGenerator::new();
    generator.push_script("print(dates.sort())");
    generator.push_script("print(sorted(dates))");

    let executor = MockExecutor::new();
    executor.push_failure("NameError: name 'dates' is not defined");
    executor.push_success("['2024-01-01', '2024-02-01']");

    let generator = Arc::new(generator);
    let executor = Arc::new(executor);
    let runner = RepairRunner::new(generator.clone(), executor.clone());

    let report = runner.run("sort a list of dates", 3).await?;

    assert_eq!(report.task_description, "sort a list of dates");
    assert_eq!(report.attempts.len(), 2);
    assert!(!report.attempts[0].succeeded());
    assert!(report.attempts[1].succeeded());
    assert_eq!(report.attempts[0].index, 0);
    assert_eq!(report.attempts[1].index, 1);
    assert_eq!(report.fix_iterations, 1);
    assert!(report.succeeded());
    assert_eq!(report.final_script(), Some("print(sorted(dates))"));

    // The repair call carries exactly the failing script and its error
    let calls = generator.calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(
        calls[1],
        GeneratorCall::Repair {
            previous_script: "print(dates.sort())".to_string(),
            error_message: "NameError: name 'dates' is not defined".to_string(),
        }
    );

    Ok(())
}

/// Integration test: a clean first script needs no repair calls
#[tokio::test]
async fn test_first_attempt_success() -> Result<()> {
    let generator = MockGenerator::new();
    generator.push_script("print('hello')");

    let executor = MockExecutor::new();
    executor.push_success("hello");

    let generator = Arc::new(generator);
    let executor = Arc::new(executor);
    let runner = RepairRunner::new(generator.clone(), executor.clone());

    let report = runner.run("greet", 3).await?;

    assert_eq!(report.attempts.len(), 1);
    assert_eq!(report.fix_iterations, 0);
    assert!(report.succeeded());
    assert_eq!(generator.call_count(), 1);
    assert_eq!(executor.call_count(), 1);

    Ok(())
}

/// Integration test: exhausting the budget is a reported outcome, not an error
#[tokio::test]
async fn test_exhaustion_reports_all_attempts() -> Result<()> {
    let generator = MockGenerator::new();
    let executor = MockExecutor::new();
    for i in 0..3 {
        generator.push_script(format!("attempt_{}", i));
        executor.push_failure(format!("TypeError: round {}", i));
    }

    let executor = Arc::new(executor);
    let runner = RepairRunner::new(Arc::new(generator), executor.clone());

    let report = runner.run("impossible task", 2).await?;

    assert_eq!(report.attempts.len(), 3);
    assert_eq!(report.fix_iterations, 2);
    assert!(!report.succeeded());
    assert_eq!(executor.call_count(), 3);
    // The last failing attempt appears exactly once
    assert_eq!(report.attempts[2].script, "attempt_2");
    assert_eq!(
        report.attempts[2].outcome.error_message,
        "TypeError: round 2"
    );

    Ok(())
}

/// Integration test: zero iterations means one execution and no repairs
#[tokio::test]
async fn test_zero_iterations_single_shot() -> Result<()> {
    let generator = MockGenerator::new();
    generator.push_script("broken()");

    let executor = MockExecutor::new();
    executor.push_failure("NameError: name 'broken' is not defined");

    let generator = Arc::new(generator);
    let executor = Arc::new(executor);
    let runner = RepairRunner::new(generator.clone(), executor.clone());

    let report = runner.run("task", 0).await?;

    assert_eq!(report.attempts.len(), 1);
    assert_eq!(report.fix_iterations, 0);
    assert!(!report.succeeded());
    assert_eq!(generator.call_count(), 1);
    assert_eq!(executor.call_count(), 1);

    Ok(())
}

/// Integration test: each repair sees only the immediately preceding attempt
#[tokio::test]
async fn test_repair_feedback_is_latest_only() -> Result<()> {
    let generator = MockGenerator::new();
    generator.push_script("v1");
    generator.push_script("v2");
    generator.push_script("v3");

    let executor = MockExecutor::new();
    executor.push_failure("error one");
    executor.push_failure("error two");
    executor.push_success("");

    let generator = Arc::new(generator);
    let runner = RepairRunner::new(generator.clone(), Arc::new(executor));

    let report = runner.run("task", 5).await?;
    assert!(report.succeeded());

    let calls = generator.calls();
    assert_eq!(calls.len(), 3);
    assert_eq!(
        calls[2],
        GeneratorCall::Repair {
            previous_script: "v2".to_string(),
            error_message: "error two".to_string(),
        }
    );

    Ok(())
}

/// Integration test: generation failure aborts the run before any execution
#[tokio::test]
async fn test_generation_failure_aborts() {
    let generator = MockGenerator::new();
    generator.push_error(MendrError::Generation(LlmError::InvalidResponse(
        "provider returned an empty script".to_string(),
    )));

    let executor = Arc::new(MockExecutor::new());
    let runner = RepairRunner::new(Arc::new(generator), executor.clone());

    let result = runner.run("task", 3).await;

    assert!(result.is_err());
    assert_eq!(executor.call_count(), 0);
}

/// Integration test: executions never exceed max_iterations + 1
#[tokio::test]
async fn test_execution_count_bound() -> Result<()> {
    for max_iterations in [0u32, 1, 3] {
        let generator = MockGenerator::new();
        let executor = MockExecutor::new();
        for i in 0..=max_iterations {
            generator.push_script(format!("script_{}", i));
            executor.push_failure("ValueError: nope");
        }

        let executor = Arc::new(executor);
        let runner = RepairRunner::new(Arc::new(generator), executor.clone());

        let report = runner.run("task", max_iterations).await?;

        assert_eq!(executor.call_count() as u32, max_iterations + 1);
        assert_eq!(report.fix_iterations, max_iterations);
    }

    Ok(())
}

/// Integration test: the full chain from LLM response to executed script
#[tokio::test]
async fn test_llm_response_flows_to_executor() -> Result<()> {
    let client = MockCompletionClient::new();
    client.push_text("```python\nprint(2 + 2)\n```");

    let generator = ScriptGenerator::new(Arc::new(client));
    let executor = MockExecutor::new();
    executor.push_success("4");

    let executor = Arc::new(executor);
    let runner = RepairRunner::new(Arc::new(generator), executor.clone());

    let report = runner.run("add two and two", 0).await?;

    assert!(report.succeeded());
    // Code fences are stripped before the script reaches the executor
    assert_eq!(executor.executed_scripts(), vec!["print(2 + 2)"]);

    Ok(())
}

/// Integration test: run_many keeps per-task results in order
#[tokio::test]
async fn test_run_many_preserves_order() -> Result<()> {
    let generator = MockGenerator::new();
    generator.push_script("first");
    generator.push_script("second");

    let executor = MockExecutor::new();
    executor.push_success("");
    executor.push_success("");

    let runner = runner(generator, executor);

    let tasks = vec!["task one".to_string(), "task two".to_string()];
    let results = runner.run_many(&tasks, 0).await;

    assert_eq!(results.len(), 2);
    let first = results[0].as_ref().unwrap();
    let second = results[1].as_ref().unwrap();
    assert_eq!(first.task_description, "task one");
    assert_eq!(second.task_description, "task two");

    Ok(())
}

/// Integration test: a finished run round-trips through the history store
#[tokio::test]
async fn test_report_persists_to_history() -> Result<()> {
    let generator = MockGenerator::new();
    generator.push_script("def answer():\n    return 42\n\nprint(answer())");

    let executor = MockExecutor::new();
    executor.push_success("42");

    let runner = runner(generator, executor);
    let report = runner.run("print the answer", 1).await?;

    let temp_dir = TempDir::new()?;
    let store = HistoryStore::new(temp_dir.path())?;
    let saved = store.save(&report)?;

    // Script name picks up the first function defined in it
    assert!(saved.script_path.file_name().unwrap().to_str().unwrap().contains("answer"));
    assert!(saved.script_path.exists());
    assert!(saved.report_path.exists());

    let entries = store.list(10)?;
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].task_description, "print the answer");
    assert_eq!(entries[0].succeeded, Some(true));

    Ok(())
}
