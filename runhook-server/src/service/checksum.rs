//! Checksum Validator
//!
//! Decides whether a script referenced by a webhook may be executed. A
//! request names both the script and its expected digest, so the path is
//! confined to the script root before the file is ever touched, and only a
//! file whose sha256 matches exactly is accepted.

use sha2::{Digest, Sha256};
use std::io;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Reasons a script reference is rejected
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Malformed shasum parameter: {0:?}")]
    MalformedChecksum(String),

    #[error("Invalid script path: {0}")]
    Traversal(String),

    #[error("Script path must be inside {root}: {path}")]
    OutsideScriptRoot { path: String, root: String },

    #[error("Script not found: {0}")]
    NotFound(String),

    #[error("Script is not a regular file: {0}")]
    NotAFile(String),

    #[error("Failed to read script {path}: {source}")]
    Io { path: String, source: io::Error },

    #[error("Checksum mismatch for {path}: expected {expected}, got {actual}")]
    ChecksumMismatch {
        path: String,
        expected: String,
        actual: String,
    },
}

/// Validates script references against a script root
#[derive(Debug, Clone)]
pub struct ChecksumValidator {
    /// Directory request paths are resolved against
    base_dir: PathBuf,
    /// Required leading segment(s) of every request path
    script_root: PathBuf,
}

impl ChecksumValidator {
    pub fn new(base_dir: impl Into<PathBuf>, script_root: impl AsRef<Path>) -> Self {
        Self {
            base_dir: base_dir.into(),
            script_root: normalize(script_root.as_ref()),
        }
    }

    /// Checks `path` (relative, as taken from the request) against the
    /// `shasum` query value (`<algorithm>:<hex>`)
    ///
    /// # Returns
    /// The canonical filesystem path of the accepted script
    pub async fn validate(&self, path: &str, shasum: &str) -> Result<PathBuf, ValidationError> {
        let Some((_, expected)) = shasum.split_once(':') else {
            return Err(ValidationError::MalformedChecksum(shasum.to_string()));
        };

        let relative = self.confine(path)?;
        let resolved = self.base_dir.join(&relative);

        let metadata = tokio::fs::metadata(&resolved)
            .await
            .map_err(|e| io_error(path, e))?;
        if !metadata.is_file() {
            return Err(ValidationError::NotAFile(path.to_string()));
        }

        let canonical = tokio::fs::canonicalize(&resolved)
            .await
            .map_err(|e| io_error(path, e))?;
        let root = tokio::fs::canonicalize(self.base_dir.join(&self.script_root))
            .await
            .map_err(|e| io_error(path, e))?;
        if !canonical.starts_with(&root) {
            return Err(self.outside_root(path));
        }

        let content = tokio::fs::read(&canonical)
            .await
            .map_err(|e| io_error(path, e))?;
        let actual = hex::encode(Sha256::digest(&content));

        if actual != expected {
            return Err(ValidationError::ChecksumMismatch {
                path: path.to_string(),
                expected: expected.to_string(),
                actual,
            });
        }

        debug!("Checksum verified for {}", canonical.display());
        Ok(canonical)
    }

    /// Lexical checks, done before any filesystem access
    fn confine(&self, path: &str) -> Result<PathBuf, ValidationError> {
        let requested = Path::new(path);

        if requested
            .components()
            .any(|c| matches!(c, Component::ParentDir))
        {
            return Err(ValidationError::Traversal(path.to_string()));
        }

        let relative = normalize(requested);
        if requested.is_absolute()
            || relative == self.script_root
            || !relative.starts_with(&self.script_root)
        {
            return Err(self.outside_root(path));
        }

        Ok(relative)
    }

    fn outside_root(&self, path: &str) -> ValidationError {
        ValidationError::OutsideScriptRoot {
            path: path.to_string(),
            root: self.script_root.display().to_string(),
        }
    }
}

/// Drops `.` components
fn normalize(path: &Path) -> PathBuf {
    path.components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect()
}

fn io_error(path: &str, source: io::Error) -> ValidationError {
    if source.kind() == io::ErrorKind::NotFound {
        ValidationError::NotFound(path.to_string())
    } else {
        ValidationError::Io {
            path: path.to_string(),
            source,
        }
    }
}
