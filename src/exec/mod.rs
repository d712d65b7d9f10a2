//! Exec module - the external `sf` CLI boundary.

mod sf_cli;

pub use sf_cli::*;

use async_trait::async_trait;
use std::path::Path;

/// Captured output of a successful script execution.
#[derive(Debug, Clone, Default)]
pub struct ExecOutput {
    pub stdout: String,
    pub stderr: String,
}

/// A failed script execution, with whatever output the command produced
/// before failing.
#[derive(Debug, Clone)]
pub struct ExecFailure {
    pub message: String,
    pub stdout: String,
    pub stderr: String,
}

impl std::fmt::Display for ExecFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

/// Executes one script against a target org.
///
/// Epistemic foundation:
/// - B_i: Each execution may succeed or fail → Result
/// - I^B: The remote org is opaque and slow; invocations are assumed
///   idempotent-enough to re-run on resume
///
/// Implementations run the claimed unit to completion; pause is observed
/// between units, never mid-flight.
#[async_trait]
pub trait ScriptExecutor: Send + Sync {
    async fn execute(
        &self,
        script_path: &Path,
        target_org: &str,
    ) -> std::result::Result<ExecOutput, ExecFailure>;
}
