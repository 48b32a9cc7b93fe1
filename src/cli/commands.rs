//! CLI command definitions using clap.
//!
//! Defines the main CLI structure and subcommands:
//! - run: generate, execute, and repair a script for a task
//! - exec: execute a script without involving the LLM
//! - outline: show the functions defined in a script
//! - history: list saved runs

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Mendr - generate, run, and repair Python scripts with an LLM
#[derive(Parser, Debug)]
#[command(name = "mendr")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Optional config file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Check if verbose mode is enabled
    pub fn is_verbose(&self) -> bool {
        self.verbose
    }
}

/// Main subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate a script for a task, run it, and repair failures
    Run {
        /// Task description for the script
        task: String,

        /// Repair rounds after the initial attempt (0 = single shot)
        #[arg(short = 'i', long)]
        max_iterations: Option<u32>,

        /// Model selector (provider, provider/model, or bare model name)
        #[arg(short, long)]
        model: Option<String>,

        /// Max tokens per completion
        #[arg(long)]
        max_tokens: Option<u32>,

        /// Sampling temperature
        #[arg(long)]
        temperature: Option<f32>,

        /// Don't save the run to history
        #[arg(long)]
        no_save: bool,

        /// Print every attempt's script, not just the last
        #[arg(long)]
        show_attempts: bool,
    },

    /// Execute a script and report the outcome
    Exec {
        /// Script file to execute
        file: Option<PathBuf>,

        /// Inline script source
        #[arg(short = 'e', long, conflicts_with = "file")]
        code: Option<String>,

        /// Wall-clock limit in milliseconds
        #[arg(long)]
        timeout_ms: Option<u64>,
    },

    /// Show the functions defined in a script
    Outline {
        /// Script file to analyze
        file: PathBuf,

        /// Emit the outline as JSON
        #[arg(long)]
        json: bool,
    },

    /// List saved runs
    History {
        /// Number of runs to show
        #[arg(short = 'n', long, default_value_t = 10)]
        limit: usize,
    },
}
