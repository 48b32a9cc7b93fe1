//! Script execution layer
//!
//! This module provides:
//! - ExecutionOutcome, the data an attempt records
//! - CodeExecutor trait for running scripts
//! - PythonExecutor, which isolates each run in a killable subprocess
//! - ExecutionContext for variable-carrying sequential runs
//! - MockExecutor for tests

use async_trait::async_trait;

mod harness;
pub mod mock;
pub mod outcome;
pub mod python;

pub use mock::MockExecutor;
pub use outcome::ExecutionOutcome;
pub use python::{ExecutionContext, ExecutorConfig, PythonExecutor};

/// Runs one script and reports what happened. Execution never errors at the
/// Rust level: interpreter crashes, timeouts, and script exceptions all come
/// back as error outcomes so the repair loop can react to them.
#[async_trait]
pub trait CodeExecutor: Send + Sync {
    async fn execute(&self, script: &str) -> ExecutionOutcome;
}
