//! Per-unit result artifacts.
//!
//! One artifact per completed unit, named by outcome, record ID, and
//! timestamp so repeated attempts append new files instead of replacing old
//! ones. Recording is best-effort telemetry: a failed write is logged and
//! never aborts the batch.

use crate::exec::{ExecFailure, ExecOutput};
use crate::executor::enumerate::unit_record_id;
use chrono::Utc;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Writes outcome artifacts into a job's results directory.
#[derive(Debug, Clone)]
pub struct ResultRecorder {
    results_dir: PathBuf,
}

impl ResultRecorder {
    pub fn new(results_dir: PathBuf) -> Self {
        Self { results_dir }
    }

    /// Record a successful execution.
    pub fn record_success(&self, unit: &Path, output: &ExecOutput) {
        let body = format!("STDOUT:\n{}\n\nSTDERR:\n{}", output.stdout, output.stderr);
        self.write_artifact("success", unit, &body);
    }

    /// Record a failed execution, with whatever output preceded the failure.
    pub fn record_failure(&self, unit: &Path, failure: &ExecFailure) {
        let body = format!(
            "ERROR:\n{}\n\nSTDOUT:\n{}\n\nSTDERR:\n{}",
            failure.message, failure.stdout, failure.stderr
        );
        self.write_artifact("failure", unit, &body);
    }

    fn write_artifact(&self, outcome: &str, unit: &Path, body: &str) {
        // ISO timestamp with ':' and '.' replaced for filesystem safety
        let timestamp = Utc::now().format("%Y-%m-%dT%H-%M-%S-%3fZ");
        let record_id = unit_record_id(unit);
        let path = self
            .results_dir
            .join(format!("{outcome}_{record_id}_{timestamp}.txt"));

        if let Err(e) = fs::write(&path, body) {
            warn!(path = %path.display(), error = %e, "Failed to write result artifact");
        }
    }
}
