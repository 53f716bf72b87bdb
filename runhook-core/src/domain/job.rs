//! Job domain types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::path::PathBuf;
use uuid::Uuid;

/// Stage tag the orchestrator uses when verifying a run task endpoint.
///
/// Requests for this stage are validated but never queued.
pub const TEST_STAGE: &str = "test";

/// Run task payload posted by the orchestrator
///
/// Immutable once accepted. Every field tolerates being absent or `null`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JobDescription {
    #[serde(deserialize_with = "nullable")]
    pub payload_version: i64,
    #[serde(deserialize_with = "nullable")]
    pub stage: String,
    #[serde(deserialize_with = "nullable")]
    pub access_token: String,
    #[serde(deserialize_with = "nullable")]
    pub capabilities: Capabilities,
    #[serde(deserialize_with = "nullable")]
    pub configuration_version_download_url: String,
    #[serde(deserialize_with = "nullable")]
    pub configuration_version_id: String,
    #[serde(deserialize_with = "nullable")]
    pub is_speculative: bool,
    #[serde(deserialize_with = "nullable")]
    pub organization_name: String,
    #[serde(deserialize_with = "nullable")]
    pub plan_json_api_url: String,
    #[serde(deserialize_with = "nullable")]
    pub run_app_url: String,
    #[serde(deserialize_with = "nullable")]
    pub run_created_at: String,
    #[serde(deserialize_with = "nullable")]
    pub run_created_by: String,
    #[serde(deserialize_with = "nullable")]
    pub run_id: String,
    #[serde(deserialize_with = "nullable")]
    pub run_message: String,
    #[serde(deserialize_with = "nullable")]
    pub task_result_callback_url: String,
    #[serde(deserialize_with = "nullable")]
    pub task_result_enforcement_level: String,
    #[serde(deserialize_with = "nullable")]
    pub task_result_id: String,
    #[serde(deserialize_with = "nullable")]
    pub vcs_branch: String,
    #[serde(deserialize_with = "nullable")]
    pub vcs_commit_url: String,
    #[serde(deserialize_with = "nullable")]
    pub vcs_pull_request_url: String,
    #[serde(deserialize_with = "nullable")]
    pub vcs_repo_url: String,
    #[serde(deserialize_with = "nullable")]
    pub workspace_app_url: String,
    #[serde(deserialize_with = "nullable")]
    pub workspace_id: String,
    #[serde(deserialize_with = "nullable")]
    pub workspace_name: String,
    #[serde(deserialize_with = "nullable")]
    pub workspace_working_directory: String,
}

/// Capabilities advertised by the orchestrator
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Capabilities {
    pub outcomes: bool,
}

impl JobDescription {
    /// Configuration bundle URL, if the orchestrator sent one
    pub fn configuration_download_url(&self) -> Option<&str> {
        non_empty(&self.configuration_version_download_url)
    }

    /// Plan document URL, if the orchestrator sent one
    pub fn plan_url(&self) -> Option<&str> {
        non_empty(&self.plan_json_api_url)
    }

    /// Whether this is the orchestrator's endpoint verification request
    pub fn is_test_stage(&self) -> bool {
        self.stage == TEST_STAGE
    }
}

fn non_empty(value: &str) -> Option<&str> {
    if value.is_empty() { None } else { Some(value) }
}

/// Treats an explicit JSON `null` like a missing field
fn nullable<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// A validated unit of work
///
/// Created by the intake handler once the script checksum has been verified,
/// consumed exactly once by the worker.
#[derive(Debug, Clone)]
pub struct Job {
    pub id: Uuid,
    pub accepted_at: DateTime<Utc>,
    pub description: JobDescription,
    /// Validated path of the script to execute
    pub script_path: PathBuf,
}

impl Job {
    pub fn new(description: JobDescription, script_path: PathBuf) -> Self {
        Self {
            id: Uuid::new_v4(),
            accepted_at: Utc::now(),
            description,
            script_path,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_payload_with_nulls() {
        let body = r#"{
            "payload_version": 1,
            "stage": "post_plan",
            "access_token": "secret",
            "capabilities": { "outcomes": true },
            "configuration_version_download_url": null,
            "is_speculative": false,
            "plan_json_api_url": "https://app.example.com/api/v2/plans/plan-1/json-output",
            "run_id": "run-abc",
            "task_result_callback_url": "https://app.example.com/api/v2/task-results/tr-1/callback",
            "vcs_branch": null,
            "some_future_field": 42
        }"#;

        let description: JobDescription = serde_json::from_str(body).unwrap();

        assert_eq!(description.payload_version, 1);
        assert_eq!(description.stage, "post_plan");
        assert!(description.capabilities.outcomes);
        assert_eq!(description.configuration_download_url(), None);
        assert_eq!(
            description.plan_url(),
            Some("https://app.example.com/api/v2/plans/plan-1/json-output")
        );
        assert_eq!(description.vcs_branch, "");
        assert_eq!(description.workspace_name, "");
    }

    #[test]
    fn test_test_stage_detection() {
        let description = JobDescription {
            stage: "test".to_string(),
            ..Default::default()
        };
        assert!(description.is_test_stage());

        let description = JobDescription {
            stage: "pre_apply".to_string(),
            ..Default::default()
        };
        assert!(!description.is_test_stage());
    }

    #[test]
    fn test_rejects_wrong_types() {
        let result = serde_json::from_str::<JobDescription>(r#"{"payload_version": "one"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_new_job_gets_unique_id() {
        let a = Job::new(JobDescription::default(), PathBuf::from("scripts/a.sh"));
        let b = Job::new(JobDescription::default(), PathBuf::from("scripts/a.sh"));
        assert_ne!(a.id, b.id);
    }
}
