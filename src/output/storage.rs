//! Startup validation of the output directory.
//!
//! A missing or unwritable storage directory is a configuration failure:
//! it is reported once and the recorder never starts listening.

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

use thiserror::Error;

const PROBE_FILE: &str = ".vox-recorder-write-test";

/// Why the storage directory cannot be used.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("the output directory '{0}' does not exist")]
    Missing(PathBuf),

    #[error("'{0}' exists but is not a directory")]
    NotADirectory(PathBuf),

    #[error("the directory '{path}' exists, but is not writeable: {source}")]
    NotWritable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to create directory '{path}': {source}")]
    Create {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Make sure `dir` exists and accepts new files.
///
/// With `create` set, a missing directory (and its parents) is created
/// instead of being reported.
pub fn ensure_storage_dir(dir: &Path, create: bool) -> Result<(), StorageError> {
    if !dir.exists() {
        if !create {
            return Err(StorageError::Missing(dir.to_path_buf()));
        }
        std::fs::create_dir_all(dir).map_err(|source| StorageError::Create {
            path: dir.to_path_buf(),
            source,
        })?;
        log::info!("directory '{}' successfully created", dir.display());
    }

    if !dir.is_dir() {
        return Err(StorageError::NotADirectory(dir.to_path_buf()));
    }

    let probe = dir.join(PROBE_FILE);
    OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(&probe)
        .and_then(|_| std::fs::remove_file(&probe))
        .map_err(|source| StorageError::NotWritable {
            path: dir.to_path_buf(),
            source,
        })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
