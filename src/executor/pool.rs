//! Worker pool scheduler.
//!
//! Epistemic foundation:
//! - K_i: A shared atomic cursor guarantees each pending unit is claimed by
//!   exactly one worker exactly once
//! - K_i: Completion order across workers is NOT guaranteed; the checkpoint
//!   only advances along the contiguous completed prefix of the pending order
//! - B_i: Each execution may succeed or fail; one bad unit never blocks the rest
//! - I^B: Pause may arrive at any time and is honored between unit claims

use crate::exec::ScriptExecutor;
use crate::executor::{CheckpointStore, PauseController, ResultRecorder};
use crate::models::{BatchSummary, Result};
use crate::progress::ProgressSink;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tracing::{info, warn};

/// Fallback worker count when the caller supplies a non-positive bound.
pub const DEFAULT_POOL_SIZE: usize = 5;

/// Everything one run's workers share.
pub struct PoolRun {
    /// Units still to execute, in enumerated order (immutable for the run)
    pub pending: Vec<PathBuf>,
    /// Target org handle passed to every execution
    pub target_org: String,
    /// Count of units the resume filter already excluded
    pub already_done: usize,
    /// Full backlog size (pending + already done), for progress messages
    pub total: usize,
    pub recorder: ResultRecorder,
    pub checkpoints: CheckpointStore,
    pub pause: PauseController,
    pub progress: Arc<dyn ProgressSink>,
}

/// Pull-based pool of workers draining a shared pending list.
pub struct WorkerPool {
    executor: Arc<dyn ScriptExecutor>,
    pool_size: usize,
}

impl WorkerPool {
    /// Create a pool. A non-positive size falls back to [`DEFAULT_POOL_SIZE`].
    pub fn new(executor: Arc<dyn ScriptExecutor>, pool_size: usize) -> Self {
        Self {
            executor,
            pool_size: if pool_size == 0 {
                DEFAULT_POOL_SIZE
            } else {
                pool_size
            },
        }
    }

    /// Execute the pending units, then settle the durable markers: pause
    /// marker when the run was paused, cleared checkpoint state when the
    /// backlog drained completely.
    pub async fn run(&self, run: PoolRun) -> Result<BatchSummary> {
        let shared = Arc::new(RunShared {
            frontier: Mutex::new(Frontier::new(run.pending.len())),
            pending: run.pending,
            target_org: run.target_org,
            already_done: run.already_done,
            total: run.total,
            cursor: AtomicUsize::new(0),
            successful: AtomicUsize::new(0),
            failed: AtomicUsize::new(0),
            executor: Arc::clone(&self.executor),
            recorder: run.recorder,
            checkpoints: run.checkpoints.clone(),
            pause: run.pause.clone(),
            progress: run.progress,
        });

        let workers = self.pool_size.min(shared.pending.len()).max(1);
        let mut handles = Vec::with_capacity(workers);
        for _ in 0..workers {
            let shared = Arc::clone(&shared);
            handles.push(tokio::spawn(worker_loop(shared)));
        }

        for handle in handles {
            if let Err(e) = handle.await {
                warn!(error = %e, "Worker task panicked");
            }
        }

        let summary = BatchSummary::new(
            shared.successful.load(Ordering::Relaxed),
            shared.failed.load(Ordering::Relaxed),
        );

        if run.pause.pause_requested() {
            run.checkpoints.write_pause_marker()?;
            run.pause.mark_paused();
            info!(
                completed = summary.total,
                remaining = shared.pending.len() - summary.total,
                "Run paused"
            );
        } else {
            // Entire backlog drained: the checkpoint has served its purpose
            run.checkpoints.clear_all()?;
            info!(
                successful = summary.successful,
                failed = summary.failed,
                "Run complete"
            );
        }

        Ok(summary)
    }
}

struct RunShared {
    pending: Vec<PathBuf>,
    target_org: String,
    already_done: usize,
    total: usize,
    cursor: AtomicUsize,
    successful: AtomicUsize,
    failed: AtomicUsize,
    frontier: Mutex<Frontier>,
    executor: Arc<dyn ScriptExecutor>,
    recorder: ResultRecorder,
    checkpoints: CheckpointStore,
    pause: PauseController,
    progress: Arc<dyn ProgressSink>,
}

async fn worker_loop(shared: Arc<RunShared>) {
    loop {
        // Pause is observed between claims; an in-flight unit runs to completion
        if shared.pause.pause_requested() {
            break;
        }

        // Atomically claim the next index
        let index = shared.cursor.fetch_add(1, Ordering::SeqCst);
        if index >= shared.pending.len() {
            break;
        }

        let unit = &shared.pending[index];
        let position = shared.already_done + index + 1;
        let name = unit
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| unit.display().to_string());
        shared.progress.notify(&format!(
            "Processing script {position}/{}: {name}",
            shared.total
        ));

        match shared.executor.execute(unit, &shared.target_org).await {
            Ok(output) => {
                shared.recorder.record_success(unit, &output);
                shared.successful.fetch_add(1, Ordering::Relaxed);
            }
            Err(failure) => {
                warn!(unit = %unit.display(), error = %failure, "Script execution failed");
                shared.recorder.record_failure(unit, &failure);
                shared.failed.fetch_add(1, Ordering::Relaxed);
            }
        }

        shared.advance_checkpoint(index);

        shared.progress.notify(&format!(
            "Progress: {} successful, {} failed",
            shared.successful.load(Ordering::Relaxed),
            shared.failed.load(Ordering::Relaxed)
        ));
    }
}

impl RunShared {
    /// Record completion of `index` and move the checkpoint to the end of the
    /// contiguous completed prefix, preserving the invariant that every unit
    /// ordered before the checkpoint has a result artifact.
    fn advance_checkpoint(&self, index: usize) {
        let frontier_unit = {
            let mut frontier = match self.frontier.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            frontier.complete(index).map(|i| self.pending[i].clone())
        };

        if let Some(unit) = frontier_unit {
            // Best-effort durability: a failed write costs re-execution, not data
            if let Err(e) = self.checkpoints.write_checkpoint(&unit) {
                warn!(error = %e, "Failed to write checkpoint");
            }
        }
    }
}

/// Contiguous-prefix completion tracker.
struct Frontier {
    done: Vec<bool>,
    next: usize,
}

impl Frontier {
    fn new(len: usize) -> Self {
        Self {
            done: vec![false; len],
            next: 0,
        }
    }

    /// Mark `index` complete; if the contiguous prefix advanced, return the
    /// index of its new last element.
    fn complete(&mut self, index: usize) -> Option<usize> {
        self.done[index] = true;
        if index != self.next {
            return None;
        }
        while self.next < self.done.len() && self.done[self.next] {
            self.next += 1;
        }
        Some(self.next - 1)
    }
}
