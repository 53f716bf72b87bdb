//! Task result callback endpoint

use crate::OrchestratorClient;
use crate::error::Result;
use reqwest::header::CONTENT_TYPE;
use runhook_core::dto::task_result::{self, TaskResultDocument};

impl OrchestratorClient {
    /// Report a task result to the orchestrator
    ///
    /// Issues a single authenticated PATCH to `callback_url`. A status other
    /// than 200 is returned as [`crate::ClientError::ApiError`] with the
    /// response body; nothing is retried.
    pub async fn send_task_result(
        &self,
        callback_url: &str,
        token: &str,
        document: &TaskResultDocument,
    ) -> Result<()> {
        let body = serde_json::to_vec(document)?;

        let response = self
            .client
            .patch(callback_url)
            .bearer_auth(token)
            .header(CONTENT_TYPE, task_result::CONTENT_TYPE)
            .body(body)
            .send()
            .await?;

        Self::ensure_ok(response).await?;
        Ok(())
    }
}
