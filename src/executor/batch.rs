//! Batch orchestration: namespace → enumerate → checkpoint → filter → pool.

use crate::exec::ScriptExecutor;
use crate::executor::{
    enumerate_units, filter_pending, CheckpointStore, JobPaths, PauseController, ResultRecorder,
    WorkerPool,
};
use crate::models::{BatchError, BatchSummary, Result};
use crate::progress::{NullSink, ProgressSink};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

/// Parameters for one batch run.
#[derive(Debug, Clone)]
pub struct BatchRequest {
    pub job_name: String,
    pub target_org: String,
    /// Concurrency bound; 0 falls back to the pool default of 5
    pub concurrency: usize,
}

/// Drives resumable batch execution for jobs under one base storage root.
///
/// Owns the checkpoint and pause markers for the duration of a run; callers
/// must not run two instances against the same job concurrently.
pub struct BatchProcessor {
    base_dir: PathBuf,
    executor: Arc<dyn ScriptExecutor>,
    pause: PauseController,
    progress: Arc<dyn ProgressSink>,
}

impl BatchProcessor {
    pub fn new(base_dir: impl Into<PathBuf>, executor: Arc<dyn ScriptExecutor>) -> Self {
        Self {
            base_dir: base_dir.into(),
            executor,
            pause: PauseController::new(),
            progress: Arc::new(NullSink),
        }
    }

    /// Attach a progress sink for lifecycle notifications.
    pub fn with_progress(mut self, progress: Arc<dyn ProgressSink>) -> Self {
        self.progress = progress;
        self
    }

    /// Share an externally created pause controller instead of the built-in one.
    pub fn with_pause(mut self, pause: PauseController) -> Self {
        self.pause = pause;
        self
    }

    /// Resolve the script and results directories for a job without creating them.
    pub fn resolve_paths(&self, job_name: &str) -> JobPaths {
        JobPaths::resolve(&self.base_dir, job_name)
    }

    /// Materialize one `.apex` file per record ID from the template.
    ///
    /// Pure file I/O; not concurrent. Record IDs are lower-cased so the unit
    /// identity is case-insensitive like the job namespace.
    pub fn generate_scripts(
        &self,
        job_name: &str,
        record_ids: &[String],
        apex_template: &str,
    ) -> Result<()> {
        let paths = self.resolve_paths(job_name);
        paths.ensure()?;

        let template = apex_template.trim();
        for record_id in record_ids {
            let file_name = format!("{}.apex", record_id.to_lowercase());
            let path = paths.script_dir.join(&file_name);
            let content = format!("Id recordId = '{record_id}';\n{template}");
            std::fs::write(&path, content)
                .map_err(|e| BatchError::io(format!("writing {}", path.display()), e))?;
            self.progress
                .notify(&format!("Generated Apex file for ID: {record_id}"));
        }

        info!(job = %paths.job_key, count = record_ids.len(), "Scripts generated");
        Ok(())
    }

    /// Execute the job's pending backlog.
    ///
    /// Always yields a final summary: a paused run reports the units actually
    /// completed, and an empty script directory reports zeros without error.
    pub async fn run(&self, request: BatchRequest) -> Result<BatchSummary> {
        let paths = self.resolve_paths(&request.job_name);
        paths.ensure()?;

        let checkpoints =
            CheckpointStore::new(paths.checkpoint_file.clone(), paths.pause_file.clone());

        // A fresh run attempt always starts un-paused
        checkpoints.clear_pause_marker()?;

        let units = enumerate_units(&paths.script_dir)?;
        let total = units.len();
        self.progress
            .notify(&format!("Total scripts to process: {total}"));

        // The skip set is fixed here, once, before any worker starts
        let checkpoint = checkpoints.load_checkpoint();
        let plan = filter_pending(units, checkpoint.as_deref());
        if plan.resume_point_missing {
            self.progress
                .notify("Resume point not found, re-scanning all scripts");
        }

        info!(
            job = %paths.job_key,
            total,
            pending = plan.pending.len(),
            already_done = plan.skipped,
            concurrency = request.concurrency,
            "Starting batch run"
        );

        let pool = WorkerPool::new(Arc::clone(&self.executor), request.concurrency);
        pool.run(crate::executor::PoolRun {
            pending: plan.pending,
            target_org: request.target_org,
            already_done: plan.skipped,
            total,
            recorder: ResultRecorder::new(paths.results_dir.clone()),
            checkpoints,
            pause: self.pause.clone(),
            progress: Arc::clone(&self.progress),
        })
        .await
    }

    /// Stop issuing new work after in-flight units finish.
    pub fn request_pause(&self) {
        self.pause.request_pause();
    }

    /// Clear the pause state; required before re-running a paused job.
    pub fn resume(&self) {
        self.pause.resume();
    }

    /// Handle for requesting a pause from another task or thread.
    pub fn pause_controller(&self) -> PauseController {
        self.pause.clone()
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }
}
