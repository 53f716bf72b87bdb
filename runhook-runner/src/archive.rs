//! Configuration bundle extraction
//!
//! Unpacks a gzip-compressed tarball entry by entry. Only directories and
//! regular files are accepted; any other entry type aborts the extraction.

use flate2::read::GzDecoder;
use std::fs::{self, File};
use std::io::{self, BufReader};
use std::path::{Component, Path, PathBuf};
use tar::{Archive, EntryType};
use thiserror::Error;
use tracing::debug;

/// Errors that can occur while unpacking an archive
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("Unsupported file type {kind} in {path}")]
    UnsupportedEntry { path: String, kind: String },

    #[error("Archive entry escapes the destination: {0}")]
    UnsafePath(String),

    #[error("Failed to extract archive: {0}")]
    Io(#[from] io::Error),

    #[error("Extraction task failed: {0}")]
    Interrupted(String),
}

/// Extracts `archive` (a `.tar.gz` file) into `dest`
///
/// # Returns
/// Number of entries written
pub fn extract_tar_gz(archive: &Path, dest: &Path) -> Result<usize, ExtractionError> {
    let file = File::open(archive)?;
    let mut archive = Archive::new(GzDecoder::new(BufReader::new(file)));
    let mut extracted = 0;

    for entry in archive.entries()? {
        let mut entry = entry?;
        let entry_path = entry.path()?.into_owned();
        let target = dest.join(relative_path(&entry_path)?);

        match entry.header().entry_type() {
            EntryType::Directory => {
                fs::create_dir_all(&target)?;
            }
            EntryType::Regular => {
                if let Some(parent) = target.parent() {
                    fs::create_dir_all(parent)?;
                }
                let mut out = File::create(&target)?;
                io::copy(&mut entry, &mut out)?;
            }
            other => {
                return Err(ExtractionError::UnsupportedEntry {
                    path: entry_path.display().to_string(),
                    kind: format!("{:?}", other),
                });
            }
        }

        extracted += 1;
    }

    debug!("Extracted {} entries into {}", extracted, dest.display());
    Ok(extracted)
}

/// Entry path relative to the destination, rejecting absolute and `..` paths
fn relative_path(path: &Path) -> Result<PathBuf, ExtractionError> {
    let mut relative = PathBuf::new();

    for component in path.components() {
        match component {
            Component::Normal(part) => relative.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                return Err(ExtractionError::UnsafePath(path.display().to_string()));
            }
        }
    }

    Ok(relative)
}

#[cfg(test)]
pub(crate) mod test_support {
    use flate2::{Compression, write::GzEncoder};
    use tar::{Builder, EntryType, Header};

    /// Builds a `.tar.gz` with one directory entry and the given files
    pub fn build_tar_gz(dirs: &[&str], files: &[(&str, &str)]) -> Vec<u8> {
        let mut builder = Builder::new(GzEncoder::new(Vec::new(), Compression::default()));

        for dir in dirs {
            let mut header = Header::new_gnu();
            header.set_entry_type(EntryType::Directory);
            header.set_mode(0o755);
            header.set_size(0);
            builder
                .append_data(&mut header, dir, std::io::empty())
                .unwrap();
        }

        for (path, data) in files {
            let mut header = Header::new_gnu();
            header.set_mode(0o644);
            header.set_size(data.len() as u64);
            builder
                .append_data(&mut header, path, data.as_bytes())
                .unwrap();
        }

        builder.into_inner().unwrap().finish().unwrap()
    }
}
