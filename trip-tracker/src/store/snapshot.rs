//! JSON snapshot persistence for the in-memory store.

use std::path::{Path, PathBuf};

use super::error::StoreError;
use super::memory::Snapshot;

/// A snapshot file on disk.
#[derive(Debug, Clone)]
pub struct SnapshotFile {
    path: PathBuf,
}

impl SnapshotFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Load the snapshot.
    ///
    /// A missing file is an empty store; an unreadable or corrupt file is
    /// an error, so existing bookings are never silently discarded.
    pub fn load(&self) -> Result<Snapshot, StoreError> {
        if !self.path.exists() {
            return Ok(Snapshot::default());
        }

        let contents = std::fs::read_to_string(&self.path).map_err(|e| StoreError::Snapshot {
            message: format!("failed to read {}: {}", self.path.display(), e),
        })?;

        serde_json::from_str(&contents).map_err(|e| StoreError::Snapshot {
            message: format!("failed to parse {}: {}", self.path.display(), e),
        })
    }

    /// Write the snapshot, creating parent directories if needed.
    pub fn save(&self, snapshot: &Snapshot) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent).map_err(|e| StoreError::Snapshot {
                message: format!("failed to create snapshot directory: {}", e),
            })?;
        }

        let json = serde_json::to_string_pretty(snapshot).map_err(|e| StoreError::Snapshot {
            message: format!("failed to serialize snapshot: {}", e),
        })?;

        std::fs::write(&self.path, json).map_err(|e| StoreError::Snapshot {
            message: format!("failed to write snapshot file: {}", e),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
