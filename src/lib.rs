//! apexbatch - Resumable batch execution of Apex scripts against Salesforce orgs.
//!
//! ## Architecture
//!
//! apexbatch drives a large, ordered batch of generated Apex scripts through the
//! `sf` CLI with a fixed-size worker pool:
//! - **Executor**: Checkpointed, pausable worker pool over a per-job script directory
//! - **Store**: Job metadata (`jobs.json`) and org listing cache (`orgs.json`)
//! - **Exec**: The external `sf` CLI boundary (apex run, SOQL query, org list)
//!
//! ## Epistemic design
//!
//! - K_i (Knowledge): Compile-time enforced invariants (types, enums)
//! - B_i (Beliefs): Runtime fallible operations (Result, Option)
//! - I^R (Resolvable): User-configurable parameters
//! - I^B (Bounded): Filesystem/remote-org uncertainties (checkpoint, resume)

pub mod exec;
pub mod executor;
pub mod models;
pub mod progress;
pub mod store;

// Re-exports for convenience
pub use exec::{ExecFailure, ExecOutput, ScriptExecutor, SfCli};
pub use executor::{
    enumerate_units, BatchProcessor, BatchRequest, CheckpointStore, JobPaths, PauseController,
};
pub use models::{BatchError, BatchSummary, Config, JobRecord, JobStatus, Result};
pub use progress::ProgressSink;
pub use store::{JobStore, OrgCache};
