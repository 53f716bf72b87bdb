//! Artifact download endpoints

use crate::OrchestratorClient;
use crate::error::Result;
use reqwest::header::CONTENT_TYPE;
use runhook_core::dto::task_result;
use std::path::Path;
use tokio::io::AsyncWriteExt;
use tracing::debug;

impl OrchestratorClient {
    /// Download a configuration version archive
    ///
    /// The body (a gzip-compressed tarball) is streamed verbatim into `dest`.
    ///
    /// # Returns
    /// Number of bytes written
    pub async fn download_configuration(&self, url: &str, token: &str, dest: &Path) -> Result<u64> {
        let response = self
            .client
            .get(url)
            .bearer_auth(token)
            .header(CONTENT_TYPE, task_result::CONTENT_TYPE)
            .send()
            .await?;

        let response = Self::ensure_ok(response).await?;
        Self::stream_to_file(response, dest).await
    }

    /// Download a plan document
    ///
    /// The body is opaque and is written verbatim into `dest`.
    ///
    /// # Returns
    /// Number of bytes written
    pub async fn download_plan(&self, url: &str, token: &str, dest: &Path) -> Result<u64> {
        let response = self.client.get(url).bearer_auth(token).send().await?;

        let response = Self::ensure_ok(response).await?;
        Self::stream_to_file(response, dest).await
    }

    async fn stream_to_file(mut response: reqwest::Response, dest: &Path) -> Result<u64> {
        let mut file = tokio::fs::File::create(dest).await?;
        let mut written = 0u64;

        while let Some(chunk) = response.chunk().await? {
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        file.flush().await?;

        debug!("Wrote {} bytes to {}", written, dest.display());
        Ok(written)
    }
}
