//! Mendr - generate, run, and repair Python scripts with an LLM
//!
//! Mendr asks a model for a script that solves a task, executes it in an
//! isolated interpreter, and feeds failures back to the model for bounded
//! repair rounds until the script runs cleanly.

pub mod analysis;
pub mod config;
pub mod error;
pub mod exec;
pub mod generator;
pub mod history;
pub mod id;
pub mod llm;
pub mod prompt;
pub mod repair;

pub use error::{MendrError, Result};
