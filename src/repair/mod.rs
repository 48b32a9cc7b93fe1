//! Repair loop - bounded generate-execute-repair cycles
//!
//! This module provides:
//! - Attempt and RepairReport, the audit record of a run
//! - RepairRunner, which drives the loop over a generator and executor

pub mod report;
pub mod runner;

pub use report::{Attempt, RepairReport};
pub use runner::RepairRunner;
