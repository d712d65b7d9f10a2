//! Cooperative pause control.
//!
//! Epistemic foundation:
//! - K_i: State machine Running → PauseRequested → Paused; resume returns to Running
//! - K_i: Workers observe the request between unit claims, never mid-unit
//! - I^B: Any thread may request a pause while workers are active

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use tracing::info;

/// Pause state observable by the worker pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PauseState {
    Running,
    PauseRequested,
    Paused,
}

const RUNNING: u8 = 0;
const PAUSE_REQUESTED: u8 = 1;
const PAUSED: u8 = 2;

/// Shared pause flag, passed explicitly to the scheduler rather than held as
/// ambient state so multiple executor instances can coexist in one process.
#[derive(Debug, Clone, Default)]
pub struct PauseController {
    state: Arc<AtomicU8>,
}

impl PauseController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request that workers stop claiming new units. Safe from any thread.
    pub fn request_pause(&self) {
        if self
            .state
            .compare_exchange(RUNNING, PAUSE_REQUESTED, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
        {
            info!("Pause requested");
        }
    }

    /// Return to Running. Must be called before the next run of a paused job.
    pub fn resume(&self) {
        self.state.store(RUNNING, Ordering::SeqCst);
    }

    /// Whether workers should stop claiming units.
    pub fn pause_requested(&self) -> bool {
        self.state.load(Ordering::SeqCst) != RUNNING
    }

    /// Called by the scheduler once all workers have stopped claiming.
    pub(crate) fn mark_paused(&self) {
        self.state.store(PAUSED, Ordering::SeqCst);
    }

    pub fn state(&self) -> PauseState {
        match self.state.load(Ordering::SeqCst) {
            RUNNING => PauseState::Running,
            PAUSE_REQUESTED => PauseState::PauseRequested,
            _ => PauseState::Paused,
        }
    }
}
