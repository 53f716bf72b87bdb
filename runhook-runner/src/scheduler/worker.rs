//! Job worker
//!
//! Takes jobs off the queue one at a time and runs the full pipeline for each:
//! provision workspace, fetch configuration, write payload sidecar, fetch
//! plan, run commands, aggregate, report, tear down. Failures inside a job are
//! logged and folded into its verdict; they never stop the worker.

use runhook_client::{ClientError, OrchestratorClient};
use runhook_core::domain::job::Job;
use runhook_core::domain::verdict::Verdict;
use runhook_core::dto::task_result::TaskResultDocument;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::artifacts::ArtifactFetcher;
use crate::config::WorkerConfig;
use crate::deadline::Deadline;
use crate::executor::ScriptExecutor;
use crate::queue::JobReceiver;
use crate::workspace::WorkspaceManager;

/// Errors delivering a verdict to the orchestrator
#[derive(Debug, Error)]
pub enum CallbackError {
    #[error("Failed to deliver task result: {0}")]
    Client(#[from] ClientError),

    #[error("Task result delivery timed out after {0:?}")]
    TimedOut(Duration),
}

/// What happened to one job
#[derive(Debug)]
pub struct JobReport {
    pub verdict: Verdict,
    pub callback: Result<(), CallbackError>,
}

/// The single job worker
pub struct Worker {
    config: WorkerConfig,
    client: OrchestratorClient,
    workspaces: WorkspaceManager,
    fetcher: ArtifactFetcher,
    executor: ScriptExecutor,
}

impl Worker {
    /// Creates a new worker
    pub fn new(config: WorkerConfig, client: OrchestratorClient) -> Self {
        let workspaces = WorkspaceManager::new(config.workspace_root.clone());
        let fetcher = ArtifactFetcher::new(client.clone(), config.workspace_root.clone());

        Self {
            config,
            client,
            workspaces,
            fetcher,
            executor: ScriptExecutor::new(),
        }
    }

    /// Processes jobs until every producer is gone and the queue is drained
    ///
    /// Each job runs in its own task so a panic is contained to that job; the
    /// worker always waits for it before taking the next one.
    pub async fn run(self: Arc<Self>, mut jobs: JobReceiver) {
        info!("Worker started");

        while let Some(job) = jobs.next().await {
            let job_id = job.id;
            let worker = Arc::clone(&self);
            let handle = tokio::spawn(async move { worker.process(job).await });

            if let Err(e) = handle.await {
                error!("Job task {} panicked: {}", job_id, e);
            }
        }

        info!("Job queue closed, worker stopping");
    }

    /// Runs the whole pipeline for one job
    pub async fn process(&self, job: Job) -> JobReport {
        let description = &job.description;
        let waited = chrono::Utc::now() - job.accepted_at;
        info!(
            "Processing job {} (run {}, stage {}, queued for {} ms)",
            job.id,
            description.run_id,
            description.stage,
            waited.num_milliseconds()
        );

        let workspace = match self
            .workspaces
            .provision(&description.run_id, &description.stage)
            .await
        {
            Ok(workspace) => workspace,
            Err(e) => {
                error!("Job {}: {}", job.id, e);
                let verdict = Verdict::pipeline_error(e.to_string());
                let callback = self.report(&job, &verdict).await;
                return JobReport { verdict, callback };
            }
        };

        let verdict = self.run_pipeline(&job, workspace.path()).await;
        let callback = self.report(&job, &verdict).await;

        if let Err(e) = workspace.teardown().await {
            warn!("Job {}: {}", job.id, e);
        }

        info!("Job {} finished: {}", job.id, verdict.message());
        JobReport { verdict, callback }
    }

    async fn run_pipeline(&self, job: &Job, workspace: &Path) -> Verdict {
        let description = &job.description;
        let token = description.access_token.as_str();
        let deadline = Deadline::after(self.config.job_timeout);

        if let Some(url) = description.configuration_download_url() {
            if let Err(e) = self
                .fetcher
                .fetch_configuration(url, token, workspace, &deadline)
                .await
            {
                warn!("Job {}: configuration bundle unavailable: {}", job.id, e);
            }
        } else {
            debug!("Job {}: no configuration bundle to download", job.id);
        }

        if let Err(e) = self.fetcher.write_payload_sidecar(description, workspace).await {
            warn!("Job {}: failed to write payload sidecar: {}", job.id, e);
        }

        if let Some(url) = description.plan_url() {
            if let Err(e) = self.fetcher.fetch_plan(url, token, workspace, &deadline).await {
                warn!("Job {}: plan unavailable: {}", job.id, e);
            }
        } else {
            info!("Job {}: no plan file to download", job.id);
        }

        match self
            .executor
            .run_script(&job.script_path, workspace, &deadline)
            .await
        {
            Ok(outcomes) => Verdict::from_outcomes(outcomes),
            Err(e) => {
                error!("Job {}: {}", job.id, e);
                Verdict::pipeline_error(e.to_string())
            }
        }
    }

    /// Delivers the verdict exactly once
    async fn report(&self, job: &Job, verdict: &Verdict) -> Result<(), CallbackError> {
        let description = &job.description;
        let document = TaskResultDocument::from(verdict);

        if let Ok(json) = serde_json::to_string(&document) {
            debug!("Sending task result for job {}: {}", job.id, json);
        }

        let delivery = self.client.send_task_result(
            &description.task_result_callback_url,
            &description.access_token,
            &document,
        );

        let result = match tokio::time::timeout(self.config.callback_timeout, delivery).await {
            Ok(result) => result.map_err(CallbackError::from),
            Err(_) => Err(CallbackError::TimedOut(self.config.callback_timeout)),
        };

        match &result {
            Ok(()) => info!("Job {}: task result delivered", job.id),
            Err(e) => error!("Job {}: {}", job.id, e),
        }

        result
    }
}
