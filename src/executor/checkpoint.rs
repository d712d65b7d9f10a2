//! Checkpoint and pause marker persistence.
//!
//! Epistemic foundation:
//! - K_i: The checkpoint names the last unit executed before a normal stop
//! - B_i: The checkpoint file may be missing or unreadable → no checkpoint,
//!   fail-open toward re-processing, never toward data loss
//! - K_i: One executor instance owns these files per job for the run's duration

use crate::models::{BatchError, Result};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Persists the per-job checkpoint and pause marker files.
#[derive(Debug, Clone)]
pub struct CheckpointStore {
    checkpoint_file: PathBuf,
    pause_file: PathBuf,
}

impl CheckpointStore {
    pub fn new(checkpoint_file: PathBuf, pause_file: PathBuf) -> Self {
        Self {
            checkpoint_file,
            pause_file,
        }
    }

    /// Remove the pause marker. Idempotent; "not found" is not an error.
    pub fn clear_pause_marker(&self) -> Result<()> {
        remove_if_present(&self.pause_file, "removing pause marker")
    }

    /// Whether the pause marker is present (the prior run stopped intentionally).
    pub fn pause_marker_present(&self) -> bool {
        self.pause_file.exists()
    }

    /// Load the last-completed unit path, if a non-empty checkpoint exists.
    ///
    /// Read failures are treated as "no checkpoint": re-executing work is
    /// recoverable, silently skipping it is not.
    pub fn load_checkpoint(&self) -> Option<PathBuf> {
        match fs::read_to_string(&self.checkpoint_file) {
            Ok(content) => {
                let trimmed = content.trim();
                if trimmed.is_empty() {
                    None
                } else {
                    Some(PathBuf::from(trimmed))
                }
            }
            Err(e) => {
                if e.kind() != ErrorKind::NotFound {
                    warn!(
                        path = %self.checkpoint_file.display(),
                        error = %e,
                        "Unreadable checkpoint, treating as absent"
                    );
                }
                None
            }
        }
    }

    /// Durably record the last completed unit. Overwrites any prior value.
    pub fn write_checkpoint(&self, unit_path: &Path) -> Result<()> {
        fs::write(&self.checkpoint_file, unit_path.to_string_lossy().as_bytes())
            .map_err(|e| BatchError::io("writing checkpoint", e))?;
        debug!(unit = %unit_path.display(), "Checkpoint written");
        Ok(())
    }

    /// Write the pause sentinel.
    pub fn write_pause_marker(&self) -> Result<()> {
        fs::write(&self.pause_file, b"").map_err(|e| BatchError::io("writing pause marker", e))
    }

    /// Remove both files. Called only when a run drains its entire backlog
    /// without pausing.
    pub fn clear_all(&self) -> Result<()> {
        remove_if_present(&self.checkpoint_file, "removing checkpoint")?;
        remove_if_present(&self.pause_file, "removing pause marker")
    }
}

fn remove_if_present(path: &Path, context: &str) -> Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(BatchError::io(context, e)),
    }
}
