//! Worker configuration
//!
//! Defines the configurable parameters of the job worker: where workspaces
//! live, how many accepted jobs may wait in the queue and how long each
//! blocking step may take.

use std::path::PathBuf;
use std::time::Duration;

use crate::queue::DEFAULT_QUEUE_CAPACITY;

/// Worker configuration
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Directory under which per-job workspaces are created
    pub workspace_root: PathBuf,

    /// Maximum number of accepted jobs waiting for the worker
    pub queue_capacity: usize,

    /// Deadline for a whole job (downloads and every command)
    pub job_timeout: Duration,

    /// Timeout for delivering the task result callback
    pub callback_timeout: Duration,
}

impl WorkerConfig {
    /// Creates a new configuration with defaults
    pub fn new(workspace_root: PathBuf) -> Self {
        Self {
            workspace_root,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            job_timeout: Duration::from_secs(3600), // 1 hour
            callback_timeout: Duration::from_secs(30),
        }
    }

    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity;
        self
    }

    pub fn with_job_timeout(mut self, timeout: Duration) -> Self {
        self.job_timeout = timeout;
        self
    }

    pub fn with_callback_timeout(mut self, timeout: Duration) -> Self {
        self.callback_timeout = timeout;
        self
    }

    /// Validates the configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.workspace_root.as_os_str().is_empty() {
            anyhow::bail!("workspace_root cannot be empty");
        }

        if self.queue_capacity == 0 {
            anyhow::bail!("queue_capacity must be greater than 0");
        }

        if self.job_timeout.is_zero() {
            anyhow::bail!("job_timeout must be greater than 0");
        }

        if self.callback_timeout.is_zero() {
            anyhow::bail!("callback_timeout must be greater than 0");
        }

        Ok(())
    }
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self::new(std::env::temp_dir())
    }
}
