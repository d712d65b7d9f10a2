//! Job metadata store backed by a single `jobs.json` file.
//!
//! Epistemic foundation:
//! - K_i: One record per job, keyed by name, looked up case-insensitively
//! - B_i: The file may be missing or unreadable → start from an empty map
//! - I^B: Crash during write → atomic write-then-rename keeps the old file intact

use crate::models::{BatchError, BatchSummary, JobRecord, JobStatus, Result};
use chrono::Utc;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Persists job metadata across runs.
pub struct JobStore {
    path: PathBuf,
}

impl JobStore {
    /// Create a store rooted at the given base directory.
    pub fn new(base_dir: &Path) -> Result<Self> {
        fs::create_dir_all(base_dir).map_err(|e| BatchError::io("creating storage dir", e))?;
        Ok(Self {
            path: base_dir.join("jobs.json"),
        })
    }

    /// Load all jobs, keyed by the name the user entered.
    ///
    /// A missing or corrupt file yields an empty map rather than an error;
    /// job metadata is recoverable by re-preparing.
    pub fn load_all(&self) -> BTreeMap<String, JobRecord> {
        let content = match fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(_) => return BTreeMap::new(),
        };

        match serde_json::from_str(&content) {
            Ok(jobs) => jobs,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Unreadable jobs file, starting empty");
                BTreeMap::new()
            }
        }
    }

    /// Look up a job by name, case-insensitively.
    pub fn get(&self, job_name: &str) -> Option<JobRecord> {
        let wanted = job_name.to_lowercase();
        self.load_all()
            .into_values()
            .find(|record| record.job_name.to_lowercase() == wanted)
    }

    /// Insert or replace a job record, preserving all other entries.
    pub fn save(&self, record: JobRecord) -> Result<()> {
        let mut jobs = self.load_all();

        // Replace any entry matching case-insensitively so "Foo" and "foo"
        // never coexist as separate jobs.
        let wanted = record.job_name.to_lowercase();
        jobs.retain(|key, _| key.to_lowercase() != wanted);
        jobs.insert(record.job_name.clone(), record);

        self.write(&jobs)
    }

    /// Update the status (and optionally the summary) of an existing job.
    pub fn set_status(
        &self,
        job_name: &str,
        status: JobStatus,
        result: Option<BatchSummary>,
    ) -> Result<()> {
        let mut record = self
            .get(job_name)
            .ok_or_else(|| BatchError::JobNotFound(job_name.to_string()))?;
        record.status = status;
        record.timestamp = Utc::now();
        if result.is_some() {
            record.result = result;
        }
        self.save(record)
    }

    fn write(&self, jobs: &BTreeMap<String, JobRecord>) -> Result<()> {
        let content = serde_json::to_string_pretty(jobs)
            .map_err(|e| BatchError::Internal(format!("Serializing jobs: {e}")))?;

        // Atomic write-then-rename
        let temp_path = self.path.with_extension("tmp.json");
        fs::write(&temp_path, content).map_err(|e| BatchError::io("writing jobs file", e))?;
        fs::rename(&temp_path, &self.path).map_err(|e| BatchError::io("renaming jobs file", e))?;

        debug!(path = %self.path.display(), "Jobs saved");
        Ok(())
    }
}
