//! Output and scratch storage.
//!
//! Job outputs land in a tree partitioned by date and ticket, so
//! concurrent jobs never contend on a path. Tickets persist locators
//! relative to the output root; resolution back to an absolute path
//! happens only at fetch time.

use std::path::{Path, PathBuf};

use chrono::Utc;
use thiserror::Error;

/// Error type for storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Scratch directory not writable: {0}")]
    NotWritable(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Date-and-ticket partitioned output tree.
#[derive(Debug, Clone)]
pub struct OutputStore {
    root: PathBuf,
}

impl OutputStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Creates and returns the output directory for one job:
    /// `<root>/<yymmdd>/<id>/`.
    pub fn allocate(&self, id: &str) -> Result<PathBuf, StorageError> {
        let day = Utc::now().format("%y%m%d").to_string();
        let dir = self.root.join(day).join(id);
        std::fs::create_dir_all(&dir)?;
        Ok(dir)
    }

    /// Locator of a stored artifact relative to the output root.
    pub fn relative_locator(&self, path: &Path) -> Option<String> {
        path.strip_prefix(&self.root)
            .ok()
            .map(|rel| rel.to_string_lossy().to_string())
    }

    /// Absolute path for a stored locator.
    pub fn resolve(&self, locator: &str) -> PathBuf {
        self.root.join(locator)
    }
}

/// Scratch space for uploads and synchronous outputs.
#[derive(Debug, Clone)]
pub struct ScratchDir {
    root: PathBuf,
}

impl ScratchDir {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Creates and returns the upload directory for one request:
    /// `<root>/src/<id>/`.
    pub fn upload_dir(&self, id: &str) -> Result<PathBuf, StorageError> {
        let dir = self.root.join("src").join(id);
        std::fs::create_dir_all(&dir)?;
        Ok(dir)
    }

    /// Probes writability by creating and removing a file, the health
    /// check's first question.
    pub fn check_writable(&self) -> Result<(), StorageError> {
        std::fs::create_dir_all(&self.root)
            .map_err(|e| StorageError::NotWritable(e.to_string()))?;
        let probe = self
            .root
            .join(format!(".probe-{}", uuid::Uuid::new_v4()));
        std::fs::write(&probe, b"")
            .map_err(|e| StorageError::NotWritable(e.to_string()))?;
        std::fs::remove_file(&probe).map_err(|e| StorageError::NotWritable(e.to_string()))?;
        Ok(())
    }
}
