//! Workspace management
//!
//! Each job gets a directory under the workspace root named after its run id
//! and stage, so two jobs for the same run and stage share (and overwrite)
//! the same directory. The returned [`Workspace`] removes the directory on
//! teardown, or when dropped if teardown never ran.

use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

/// Errors that can occur while managing workspaces
#[derive(Debug, Error)]
pub enum WorkspaceError {
    #[error("Failed to create workspace {}: {source}", path.display())]
    Create { path: PathBuf, source: io::Error },

    #[error("Failed to remove workspace {}: {source}", path.display())]
    Remove { path: PathBuf, source: io::Error },
}

/// Creates per-job workspaces under a root directory
#[derive(Debug, Clone)]
pub struct WorkspaceManager {
    root: PathBuf,
}

impl WorkspaceManager {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Deterministic workspace path for a run id and stage
    pub fn path_for(&self, run_id: &str, stage: &str) -> PathBuf {
        self.root
            .join(format!("{}-{}", sanitize(run_id), sanitize(stage)))
    }

    /// Creates the workspace (and any missing parents)
    ///
    /// An existing directory from an earlier job with the same run id and
    /// stage is reused as is.
    pub async fn provision(&self, run_id: &str, stage: &str) -> Result<Workspace, WorkspaceError> {
        let path = self.path_for(run_id, stage);

        tokio::fs::create_dir_all(&path)
            .await
            .map_err(|source| WorkspaceError::Create {
                path: path.clone(),
                source,
            })?;

        debug!("Provisioned workspace {}", path.display());
        Ok(Workspace {
            path,
            released: false,
        })
    }
}

/// Keeps only characters that are safe in a single path segment
fn sanitize(segment: &str) -> String {
    segment
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// A provisioned job workspace
#[derive(Debug)]
pub struct Workspace {
    path: PathBuf,
    released: bool,
}

impl Workspace {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Recursively removes the workspace
    ///
    /// A workspace that is already gone counts as removed.
    pub async fn teardown(mut self) -> Result<(), WorkspaceError> {
        self.released = true;

        match tokio::fs::remove_dir_all(&self.path).await {
            Ok(()) => {
                debug!("Removed workspace {}", self.path.display());
                Ok(())
            }
            Err(source) if source.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(WorkspaceError::Remove {
                path: self.path.clone(),
                source,
            }),
        }
    }
}

impl Drop for Workspace {
    fn drop(&mut self) {
        if self.released {
            return;
        }

        match std::fs::remove_dir_all(&self.path) {
            Ok(()) => debug!("Removed workspace {} on drop", self.path.display()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => warn!(
                "Failed to remove workspace {} on drop: {}",
                self.path.display(),
                e
            ),
        }
    }
}
