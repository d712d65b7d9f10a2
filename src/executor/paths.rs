//! Per-job namespace resolution.
//!
//! Epistemic foundation:
//! - K_i: The same job name, in any casing, always maps to the same paths
//! - B_i: Directory creation may fail → fatal IO error, no partial run

use crate::models::{BatchError, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Canonical on-disk locations for one job.
#[derive(Debug, Clone)]
pub struct JobPaths {
    /// Lower-cased canonical job key
    pub job_key: String,
    /// Directory of rendered `.apex` unit files
    pub script_dir: PathBuf,
    /// Directory of per-unit result artifacts
    pub results_dir: PathBuf,
    /// Last-completed-unit checkpoint file
    pub checkpoint_file: PathBuf,
    /// Pause sentinel file
    pub pause_file: PathBuf,
}

impl JobPaths {
    /// Resolve all locations for a job under the base storage root.
    ///
    /// Deterministic: does not touch the filesystem.
    pub fn resolve(base_dir: &Path, job_name: &str) -> Self {
        let job_key = job_name.to_lowercase();
        let checkpoint_dir = base_dir.join("checkpoints");
        Self {
            script_dir: base_dir.join("apex_files").join(&job_key),
            results_dir: base_dir.join("execution_results").join(&job_key),
            checkpoint_file: checkpoint_dir.join(format!("checkpoint_{job_key}.txt")),
            pause_file: checkpoint_dir.join(format!("pause_{job_key}.txt")),
            job_key,
        }
    }

    /// Create all directories this job needs. Idempotent.
    pub fn ensure(&self) -> Result<()> {
        for dir in [
            self.script_dir.as_path(),
            self.results_dir.as_path(),
            self.checkpoint_dir(),
        ] {
            fs::create_dir_all(dir)
                .map_err(|e| BatchError::io(format!("creating {}", dir.display()), e))?;
        }
        Ok(())
    }

    fn checkpoint_dir(&self) -> &Path {
        // checkpoint_file always has a parent: it is built via join above
        self.checkpoint_file
            .parent()
            .unwrap_or_else(|| Path::new("."))
    }
}
