//! Repair run reporting types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::exec::ExecutionOutcome;

/// One generate-or-repair attempt and what happened when it ran
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Attempt {
    /// 0 for the initial generation, then 1, 2, ... per repair
    pub index: u32,
    pub script: String,
    pub outcome: ExecutionOutcome,
}

impl Attempt {
    pub fn succeeded(&self) -> bool {
        self.outcome.is_success()
    }
}

/// Complete record of one repair run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepairReport {
    pub run_id: String,
    pub task_description: String,
    /// Every attempt in order; each one appears exactly once
    pub attempts: Vec<Attempt>,
    /// Number of repair rounds consumed: 0 when the first script ran clean,
    /// otherwise the index of the last attempt made
    pub fix_iterations: u32,
    pub created_at: DateTime<Utc>,
}

impl RepairReport {
    /// The last attempt made, successful or not
    pub fn final_attempt(&self) -> Option<&Attempt> {
        self.attempts.last()
    }

    /// Script of the last attempt
    pub fn final_script(&self) -> Option<&str> {
        self.final_attempt().map(|a| a.script.as_str())
    }

    /// Whether the run ended with a working script
    pub fn succeeded(&self) -> bool {
        self.final_attempt().map(|a| a.succeeded()).unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn report_with(attempts: Vec<Attempt>, fix_iterations: u32) -> RepairReport {
        RepairReport {
            run_id: "test-run".to_string(),
            task_description: "do the thing".to_string(),
            attempts,
            fix_iterations,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_succeeded_when_last_attempt_clean() {
        let report = report_with(
            vec![
                Attempt {
                    index: 0,
                    script: "broken".to_string(),
                    outcome: ExecutionOutcome::error("NameError: x"),
                },
                Attempt {
                    index: 1,
                    script: "fixed".to_string(),
                    outcome: ExecutionOutcome::success(None, "ok"),
                },
            ],
            1,
        );

        assert!(report.succeeded());
        assert_eq!(report.final_script(), Some("fixed"));
        assert_eq!(report.final_attempt().unwrap().index, 1);
    }

    #[test]
    fn test_not_succeeded_when_last_attempt_failed() {
        let report = report_with(
            vec![Attempt {
                index: 0,
                script: "broken".to_string(),
                outcome: ExecutionOutcome::error("SyntaxError: invalid syntax"),
            }],
            0,
        );

        assert!(!report.succeeded());
        assert_eq!(report.final_script(), Some("broken"));
    }

    #[test]
    fn test_empty_report_not_succeeded() {
        let report = report_with(vec![], 0);
        assert!(!report.succeeded());
        assert!(report.final_attempt().is_none());
        assert!(report.final_script().is_none());
    }

    #[test]
    fn test_report_serialization_round_trip() {
        let report = report_with(
            vec![Attempt {
                index: 0,
                script: "print(2 + 2)".to_string(),
                outcome: ExecutionOutcome::success(Some(json!(4)), "4"),
            }],
            0,
        );

        let json_text = serde_json::to_string(&report).unwrap();
        let parsed: RepairReport = serde_json::from_str(&json_text).unwrap();

        assert_eq!(parsed.run_id, "test-run");
        assert_eq!(parsed.attempts.len(), 1);
        assert_eq!(parsed.attempts[0].script, "print(2 + 2)");
        assert_eq!(parsed.fix_iterations, 0);
        assert!(parsed.succeeded());
    }
}
