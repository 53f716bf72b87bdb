//! Task result DTOs
//!
//! JSON:API document sent to the orchestrator's task result callback.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::outcome::{CommandOutcome, Severity};
use crate::domain::verdict::{Verdict, VerdictStatus};

/// Media type of the callback body
pub const CONTENT_TYPE: &str = "application/vnd.api+json";

pub const TASK_RESULTS_TYPE: &str = "task-results";
pub const TASK_RESULT_OUTCOMES_TYPE: &str = "task-result-outcomes";

/// Label of the status tag attached to every outcome
pub const STATUS_LABEL: &str = "Status";

/// Top-level callback document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskResultDocument {
    pub data: TaskResultData,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskResultData {
    #[serde(rename = "type")]
    pub kind: String,
    pub attributes: TaskResultAttributes,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relationships: Option<TaskResultRelationships>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskResultAttributes {
    pub status: VerdictStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskResultRelationships {
    pub outcomes: OutcomeList,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutcomeList {
    pub data: Vec<TaskResultOutcome>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskResultOutcome {
    #[serde(rename = "type")]
    pub kind: String,
    pub attributes: OutcomeAttributes,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutcomeAttributes {
    #[serde(rename = "outcome-id")]
    pub outcome_id: String,
    pub description: String,
    #[serde(default)]
    pub tags: OutcomeTags,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OutcomeTags {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub status: Vec<RichLabel>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RichLabel {
    pub label: String,
    #[serde(default)]
    pub level: Severity,
}

/// Errors converting a callback document back into a verdict
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TaskResultError {
    #[error("unexpected document type '{0}'")]
    UnexpectedType(String),

    #[error("unexpected outcome type '{0}'")]
    UnexpectedOutcomeType(String),
}

impl From<&CommandOutcome> for TaskResultOutcome {
    fn from(outcome: &CommandOutcome) -> Self {
        Self {
            kind: TASK_RESULT_OUTCOMES_TYPE.to_string(),
            attributes: OutcomeAttributes {
                outcome_id: outcome.id.clone(),
                description: outcome.description.clone(),
                tags: OutcomeTags {
                    status: vec![RichLabel {
                        label: STATUS_LABEL.to_string(),
                        level: outcome.severity,
                    }],
                },
                body: outcome.body.clone(),
                url: None,
            },
        }
    }
}

impl From<&Verdict> for TaskResultDocument {
    fn from(verdict: &Verdict) -> Self {
        Self {
            data: TaskResultData {
                kind: TASK_RESULTS_TYPE.to_string(),
                attributes: TaskResultAttributes {
                    status: verdict.status(),
                    message: Some(verdict.message().to_string()),
                    url: None,
                },
                relationships: Some(TaskResultRelationships {
                    outcomes: OutcomeList {
                        data: verdict.outcomes().iter().map(Into::into).collect(),
                    },
                }),
            },
        }
    }
}

impl TryFrom<TaskResultOutcome> for CommandOutcome {
    type Error = TaskResultError;

    fn try_from(outcome: TaskResultOutcome) -> Result<Self, Self::Error> {
        if outcome.kind != TASK_RESULT_OUTCOMES_TYPE {
            return Err(TaskResultError::UnexpectedOutcomeType(outcome.kind));
        }

        let severity = outcome
            .attributes
            .tags
            .status
            .iter()
            .find(|tag| tag.label == STATUS_LABEL)
            .map(|tag| tag.level)
            .unwrap_or_default();

        Ok(CommandOutcome {
            id: outcome.attributes.outcome_id,
            description: outcome.attributes.description,
            severity,
            body: outcome.attributes.body,
        })
    }
}

impl TryFrom<TaskResultDocument> for Verdict {
    type Error = TaskResultError;

    fn try_from(document: TaskResultDocument) -> Result<Self, Self::Error> {
        let data = document.data;
        if data.kind != TASK_RESULTS_TYPE {
            return Err(TaskResultError::UnexpectedType(data.kind));
        }

        let outcomes = data
            .relationships
            .map(|relationships| relationships.outcomes.data)
            .unwrap_or_default()
            .into_iter()
            .map(CommandOutcome::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Verdict::from_parts(
            data.attributes.status,
            data.attributes.message.unwrap_or_default(),
            outcomes,
        ))
    }
}
