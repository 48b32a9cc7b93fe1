//! Error types for Mendr
//!
//! Centralized error handling using thiserror. Execution failures never show
//! up here: they are captured as data in `ExecutionOutcome` and fed back into
//! the repair loop. Only generation failures cross an attempt boundary.

use thiserror::Error;

/// All error types that can occur in Mendr
#[derive(Debug, Error)]
pub enum MendrError {
    /// The generator could not produce a script (provider, auth, or
    /// malformed-response failure)
    #[error("Generation failed: {0}")]
    Generation(#[from] crate::llm::LlmError),

    /// Prompt template rendering failed
    #[error("Template error: {0}")]
    Template(String),

    /// Audit-trail persistence error
    #[error("History error: {0}")]
    History(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for Mendr operations
pub type Result<T> = std::result::Result<T, MendrError>;
