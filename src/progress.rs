//! Progress sink abstraction.
//!
//! Epistemic foundation:
//! - K_i: The executor only assumes a sink accepts text
//! - I^B: The consumer may be slow; a slow sink must not stall the worker pool,
//!   so the buffered sink drops messages instead of blocking

use std::sync::Arc;
use tracing::{debug, info};

/// Receives lifecycle progress messages from the executor.
///
/// Implementations must not block: workers call `notify` between unit
/// executions on the hot path.
pub trait ProgressSink: Send + Sync {
    fn notify(&self, message: &str);
}

/// Discards all progress messages.
#[derive(Debug, Default)]
pub struct NullSink;

impl ProgressSink for NullSink {
    fn notify(&self, _message: &str) {}
}

/// Forwards progress messages to the tracing subscriber.
#[derive(Debug, Default)]
pub struct LogSink;

impl ProgressSink for LogSink {
    fn notify(&self, message: &str) {
        info!("{message}");
    }
}

/// Bounded sink that forwards to a channel without ever blocking a worker.
///
/// When the consumer falls behind and the buffer fills, new messages are
/// dropped and counted rather than stalling the pool.
pub struct BufferedSink {
    tx: tokio::sync::mpsc::Sender<String>,
    dropped: std::sync::atomic::AtomicU64,
}

impl BufferedSink {
    /// Create a sink with the given buffer capacity, returning the receiving end.
    pub fn new(capacity: usize) -> (Arc<Self>, tokio::sync::mpsc::Receiver<String>) {
        let (tx, rx) = tokio::sync::mpsc::channel(capacity);
        (
            Arc::new(Self {
                tx,
                dropped: std::sync::atomic::AtomicU64::new(0),
            }),
            rx,
        )
    }

    /// Number of messages dropped because the consumer fell behind.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(std::sync::atomic::Ordering::Relaxed)
    }
}

impl ProgressSink for BufferedSink {
    fn notify(&self, message: &str) {
        if self.tx.try_send(message.to_string()).is_err() {
            self.dropped
                .fetch_add(1, std::sync::atomic::Ordering::Relaxed);
            debug!("Progress sink full, dropped message");
        }
    }
}
