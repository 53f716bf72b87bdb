//! Command outcome domain types

use serde::{Deserialize, Serialize};
use std::fmt;

/// Severity attached to a command outcome
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    #[default]
    None,
    Info,
    Warning,
    Error,
}

impl Severity {
    /// Maps a process exit code to a severity
    ///
    /// `None` means the process did not exit normally (terminated by a signal).
    pub fn from_exit_code(code: Option<i32>) -> Self {
        match code {
            Some(0) => Severity::Info,
            Some(code) if code > 0 => Severity::Warning,
            _ => Severity::Error,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Severity::None => "none",
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Error => "error",
        };
        f.write_str(label)
    }
}

/// Result of one executed script line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutcome {
    /// Outcome identifier, `COMMAND-<ordinal>` for script lines
    pub id: String,
    pub description: String,
    pub severity: Severity,
    /// Combined stdout/stderr, absent when the process never started
    pub body: Option<String>,
}

impl CommandOutcome {
    /// Outcome identifier for the command at `ordinal` (zero-based)
    pub fn command_id(ordinal: usize) -> String {
        format!("COMMAND-{}", ordinal)
    }

    /// Outcome of a command that ran to completion
    pub fn completed(ordinal: usize, command: &str, exit_code: Option<i32>, output: String) -> Self {
        Self {
            id: Self::command_id(ordinal),
            description: format!("Command: {}", command),
            severity: Severity::from_exit_code(exit_code),
            body: Some(output),
        }
    }

    /// Outcome of a command whose process could not be started
    pub fn launch_failed(ordinal: usize, error: impl fmt::Display) -> Self {
        Self {
            id: Self::command_id(ordinal),
            description: format!("Error executing command: {}", error),
            severity: Severity::Error,
            body: None,
        }
    }

    /// Outcome of a command that started but whose output could not be read
    pub fn output_failed(
        ordinal: usize,
        command: &str,
        error: impl fmt::Display,
        output: String,
    ) -> Self {
        Self {
            id: Self::command_id(ordinal),
            description: format!("Error reading output of {}: {}", command, error),
            severity: Severity::Error,
            body: Some(output),
        }
    }

    /// Outcome of a command cut short by the job deadline
    pub fn timed_out(ordinal: usize, command: &str) -> Self {
        Self {
            id: Self::command_id(ordinal),
            description: format!("Command timed out: {}", command),
            severity: Severity::Error,
            body: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_from_exit_code() {
        assert_eq!(Severity::from_exit_code(Some(0)), Severity::Info);
        assert_eq!(Severity::from_exit_code(Some(1)), Severity::Warning);
        assert_eq!(Severity::from_exit_code(Some(127)), Severity::Warning);
        assert_eq!(Severity::from_exit_code(Some(-1)), Severity::Error);
        assert_eq!(Severity::from_exit_code(None), Severity::Error);
    }

    #[test]
    fn test_severity_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Severity::Warning).unwrap(), "\"warning\"");
        assert_eq!(
            serde_json::from_str::<Severity>("\"none\"").unwrap(),
            Severity::None
        );
    }

    #[test]
    fn test_completed_outcome() {
        let outcome = CommandOutcome::completed(3, "echo hello", Some(0), "hello\n".to_string());
        assert_eq!(outcome.id, "COMMAND-3");
        assert_eq!(outcome.description, "Command: echo hello");
        assert_eq!(outcome.severity, Severity::Info);
        assert_eq!(outcome.body.as_deref(), Some("hello\n"));
    }

    #[test]
    fn test_launch_failed_outcome_has_no_body() {
        let outcome = CommandOutcome::launch_failed(0, "No such file or directory");
        assert_eq!(outcome.severity, Severity::Error);
        assert_eq!(
            outcome.description,
            "Error executing command: No such file or directory"
        );
        assert!(outcome.body.is_none());
    }

    #[test]
    fn test_output_failed_keeps_partial_output() {
        let outcome =
            CommandOutcome::output_failed(1, "make check", "broken pipe", "partial".to_string());
        assert_eq!(outcome.id, "COMMAND-1");
        assert_eq!(outcome.severity, Severity::Error);
        assert_eq!(
            outcome.description,
            "Error reading output of make check: broken pipe"
        );
        assert_eq!(outcome.body.as_deref(), Some("partial"));
    }
}
