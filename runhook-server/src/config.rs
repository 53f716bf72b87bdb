//! Server configuration
//!
//! Command-line flags for `runhook serve`. Every flag can also be set through
//! its `RUNHOOK_*` environment variable.

use clap::Args;
use runhook_runner::config::WorkerConfig;
use runhook_runner::queue::DEFAULT_QUEUE_CAPACITY;
use std::path::{Component, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Args)]
pub struct ServeArgs {
    /// Address the webhook listener binds to
    #[arg(long, env = "RUNHOOK_BIND_ADDR", default_value = "0.0.0.0:80")]
    pub bind_addr: String,

    /// Directory webhook paths are resolved against
    #[arg(long, env = "RUNHOOK_BASE_DIR", default_value = ".")]
    pub base_dir: PathBuf,

    /// Leading path segment every webhook path must start with
    #[arg(long, env = "RUNHOOK_SCRIPT_ROOT", default_value = "scripts")]
    pub script_root: PathBuf,

    /// Where job workspaces are created (defaults to the system temp dir)
    #[arg(long, env = "RUNHOOK_WORKSPACE_ROOT")]
    pub workspace_root: Option<PathBuf>,

    /// Accepted jobs that may wait for the worker before intake blocks
    #[arg(long, env = "RUNHOOK_QUEUE_CAPACITY", default_value_t = DEFAULT_QUEUE_CAPACITY)]
    pub queue_capacity: usize,

    /// Deadline for a whole job, in seconds
    #[arg(long, env = "RUNHOOK_JOB_TIMEOUT", default_value_t = 3600)]
    pub job_timeout: u64,

    /// Timeout for the task result callback, in seconds
    #[arg(long, env = "RUNHOOK_CALLBACK_TIMEOUT", default_value_t = 30)]
    pub callback_timeout: u64,
}

impl ServeArgs {
    /// Worker configuration derived from the flags
    pub fn worker_config(&self) -> WorkerConfig {
        let workspace_root = self
            .workspace_root
            .clone()
            .unwrap_or_else(std::env::temp_dir);

        WorkerConfig::new(workspace_root)
            .with_queue_capacity(self.queue_capacity)
            .with_job_timeout(Duration::from_secs(self.job_timeout))
            .with_callback_timeout(Duration::from_secs(self.callback_timeout))
    }

    /// Validates the configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.script_root.as_os_str().is_empty() {
            anyhow::bail!("script_root cannot be empty");
        }

        // must be able to prefix a relative request path
        if self.script_root.is_absolute()
            || self
                .script_root
                .components()
                .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir))
        {
            anyhow::bail!(
                "script_root must be a relative path without '..': {}",
                self.script_root.display()
            );
        }

        if self
            .script_root
            .components()
            .all(|c| matches!(c, Component::CurDir))
        {
            anyhow::bail!("script_root cannot be the base directory itself");
        }

        if self.bind_addr.is_empty() {
            anyhow::bail!("bind_addr cannot be empty");
        }

        self.worker_config().validate()
    }
}
