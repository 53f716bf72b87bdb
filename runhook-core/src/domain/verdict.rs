//! Verdict domain types
//!
//! The verdict is the aggregate of every outcome recorded for a job. It is
//! built in one step from the complete outcome list.

use serde::{Deserialize, Serialize};

use super::outcome::{CommandOutcome, Severity};

/// Summary used when no outcome carries `error` severity
pub const ALL_PASSED_MESSAGE: &str = "All commands passed";

/// Summary used when at least one outcome carries `error` severity
pub const COMMAND_FAILED_MESSAGE: &str = "At least one command failed";

/// Outcome id used when the pipeline failed before any command ran
pub const PIPELINE_ERROR_ID: &str = "PIPELINE-ERROR";

/// Overall job status reported to the orchestrator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerdictStatus {
    Passed,
    Failed,
}

/// Aggregated pass/fail result of a job
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    status: VerdictStatus,
    message: String,
    outcomes: Vec<CommandOutcome>,
}

impl Verdict {
    /// Aggregates a complete outcome list
    ///
    /// Only `error` severity fails the verdict.
    pub fn from_outcomes(outcomes: Vec<CommandOutcome>) -> Self {
        let failed = outcomes
            .iter()
            .any(|outcome| outcome.severity == Severity::Error);

        if failed {
            Self::from_parts(VerdictStatus::Failed, COMMAND_FAILED_MESSAGE, outcomes)
        } else {
            Self::from_parts(VerdictStatus::Passed, ALL_PASSED_MESSAGE, outcomes)
        }
    }

    /// Failed verdict for a job that could not run its script at all
    pub fn pipeline_error(message: impl Into<String>) -> Self {
        let message = message.into();
        let outcome = CommandOutcome {
            id: PIPELINE_ERROR_ID.to_string(),
            description: message.clone(),
            severity: Severity::Error,
            body: Some(message.clone()),
        };
        Self::from_parts(VerdictStatus::Failed, message, vec![outcome])
    }

    pub(crate) fn from_parts(
        status: VerdictStatus,
        message: impl Into<String>,
        outcomes: Vec<CommandOutcome>,
    ) -> Self {
        Self {
            status,
            message: message.into(),
            outcomes,
        }
    }

    pub fn status(&self) -> VerdictStatus {
        self.status
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn outcomes(&self) -> &[CommandOutcome] {
        &self.outcomes
    }

    pub fn is_passed(&self) -> bool {
        self.status == VerdictStatus::Passed
    }
}
