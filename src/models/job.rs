//! Job metadata and batch summary types.
//!
//! K_i: These types represent a named batch of work units sharing a target org
//! and an Apex template.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle status of a job.
///
/// K_i: Status transitions are prepared → running → (paused ⇄ running) → completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    /// Scripts generated, not yet executed
    Prepared,
    /// A run is in progress
    Running,
    /// Intentionally stopped mid-batch; pause marker present
    Paused,
    /// Entire backlog executed
    Completed,
}

/// Persisted metadata for a job.
///
/// Resume reads `target_org` and `apex_template` from here; the record IDs are
/// only needed at preparation time and are not stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobRecord {
    /// Job name as the user entered it (lookup is case-insensitive)
    pub job_name: String,

    /// Alias or username of the target org
    pub target_org: String,

    /// SOQL query that produced the record IDs
    pub soql_query: String,

    /// Apex template each record ID was bound into
    pub apex_template: String,

    /// Current lifecycle status
    pub status: JobStatus,

    /// Last status transition time
    pub timestamp: DateTime<Utc>,

    /// Summary of the most recent run, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<BatchSummary>,
}

/// Aggregate counters returned to the caller after a run.
///
/// K_i: total == successful + failed always holds; a paused run reports only
/// the units actually completed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub successful: usize,
    pub failed: usize,
    pub total: usize,
}

impl BatchSummary {
    pub fn new(successful: usize, failed: usize) -> Self {
        Self {
            successful,
            failed,
            total: successful + failed,
        }
    }
}
