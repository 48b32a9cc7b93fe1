//! Execution outcome type
//!
//! Mirrors what one interpreter run produced: either a value/printed output
//! pair, or an error message suitable for feeding back to the generator.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Result of running one script
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionOutcome {
    pub is_error: bool,
    /// Value of the script when it was a single expression, if the value
    /// survives JSON encoding
    pub returned_value: Option<Value>,
    /// What the script printed to stdout, trimmed
    pub captured_output: String,
    /// "{ExceptionType}: {message}" when the run failed, empty otherwise
    pub error_message: String,
}

impl ExecutionOutcome {
    /// Successful run
    pub fn success(returned_value: Option<Value>, captured_output: impl Into<String>) -> Self {
        Self {
            is_error: false,
            returned_value,
            captured_output: captured_output.into().trim().to_string(),
            error_message: String::new(),
        }
    }

    /// Failed run. Output is discarded, only the error travels forward.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            is_error: true,
            returned_value: None,
            captured_output: String::new(),
            error_message: message.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        !self.is_error
    }
}
