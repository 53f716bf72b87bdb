//! Artifact retrieval
//!
//! Populates a workspace before the script runs:
//! - the configuration version bundle, downloaded to a temporary archive and
//!   unpacked into the workspace
//! - the payload sidecar describing the triggering run
//! - the plan document, stored verbatim

use runhook_client::{ClientError, OrchestratorClient};
use runhook_core::domain::job::JobDescription;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

use crate::archive::{ExtractionError, extract_tar_gz};
use crate::deadline::Deadline;

/// File the job description is written to inside the workspace
pub const PAYLOAD_FILE_NAME: &str = "payload.json";

/// File the plan document is written to inside the workspace
pub const PLAN_FILE_NAME: &str = "plan.json";

/// Errors fetching a remote artifact
#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("Download failed: {0}")]
    Client(#[from] ClientError),

    #[error("Download timed out")]
    TimedOut,
}

/// Errors populating the workspace
#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error(transparent)]
    Download(#[from] DownloadError),

    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    #[error("Failed to serialize payload: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Filesystem error: {0}")]
    Io(#[from] io::Error),
}

/// Downloads and materializes artifacts into job workspaces
#[derive(Debug, Clone)]
pub struct ArtifactFetcher {
    client: OrchestratorClient,
    /// Where temporary archives are staged, outside any workspace
    scratch_dir: PathBuf,
}

impl ArtifactFetcher {
    pub fn new(client: OrchestratorClient, scratch_dir: impl Into<PathBuf>) -> Self {
        Self {
            client,
            scratch_dir: scratch_dir.into(),
        }
    }

    /// Downloads the configuration bundle and unpacks it into `workspace`
    ///
    /// The temporary archive is removed once extraction finishes, whether it
    /// succeeded or not.
    ///
    /// # Returns
    /// Number of archive entries extracted
    pub async fn fetch_configuration(
        &self,
        url: &str,
        token: &str,
        workspace: &Path,
        deadline: &Deadline,
    ) -> Result<usize, ArtifactError> {
        tokio::fs::create_dir_all(&self.scratch_dir).await?;
        let archive = tempfile::Builder::new()
            .prefix("runhook-config-")
            .suffix(".tar.gz")
            .tempfile_in(&self.scratch_dir)?;

        let bytes = deadline
            .run(self.client.download_configuration(url, token, archive.path()))
            .await
            .map_err(|_| DownloadError::TimedOut)?
            .map_err(DownloadError::from)?;
        info!("Downloaded configuration bundle ({} bytes)", bytes);

        let dest = workspace.to_path_buf();
        let extracted = tokio::task::spawn_blocking(move || {
            let result = extract_tar_gz(archive.path(), &dest);
            drop(archive);
            result
        })
        .await
        .map_err(|e| ExtractionError::Interrupted(e.to_string()))??;

        info!("Extracted {} entries from configuration bundle", extracted);
        Ok(extracted)
    }

    /// Downloads the plan document into `workspace`
    ///
    /// # Returns
    /// Path of the written plan file
    pub async fn fetch_plan(
        &self,
        url: &str,
        token: &str,
        workspace: &Path,
        deadline: &Deadline,
    ) -> Result<PathBuf, DownloadError> {
        let dest = workspace.join(PLAN_FILE_NAME);

        let bytes = deadline
            .run(self.client.download_plan(url, token, &dest))
            .await
            .map_err(|_| DownloadError::TimedOut)??;

        info!("Downloaded plan ({} bytes)", bytes);
        Ok(dest)
    }

    /// Writes the job description as pretty-printed JSON into `workspace`
    ///
    /// # Returns
    /// Path of the written sidecar file
    pub async fn write_payload_sidecar(
        &self,
        description: &JobDescription,
        workspace: &Path,
    ) -> Result<PathBuf, ArtifactError> {
        let dest = workspace.join(PAYLOAD_FILE_NAME);
        let json = serde_json::to_vec_pretty(description)?;

        tokio::fs::write(&dest, json).await?;

        debug!("Wrote payload sidecar {}", dest.display());
        Ok(dest)
    }
}
