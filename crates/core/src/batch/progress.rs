//! Shared progress counters and the reporters that observe them.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::info;

/// Completion counters for one batch.
///
/// `total` is fixed at construction. `completed` only moves forward, one
/// step per finished item, and only through the orchestrator.
#[derive(Debug)]
pub struct ProgressState {
    total: usize,
    completed: AtomicUsize,
}

impl ProgressState {
    pub fn new(total: usize) -> Self {
        Self {
            total,
            completed: AtomicUsize::new(0),
        }
    }

    /// Records one finished item and returns the counters right after it.
    pub(crate) fn record_completion(&self) -> ProgressSnapshot {
        let completed = self.completed.fetch_add(1, Ordering::AcqRel) + 1;
        debug_assert!(completed <= self.total, "completed past total");
        ProgressSnapshot {
            completed,
            total: self.total,
        }
    }

    pub fn snapshot(&self) -> ProgressSnapshot {
        ProgressSnapshot {
            completed: self.completed.load(Ordering::Acquire),
            total: self.total,
        }
    }
}

/// Point-in-time view of a batch's progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressSnapshot {
    pub completed: usize,
    pub total: usize,
}

impl ProgressSnapshot {
    pub fn is_complete(&self) -> bool {
        self.completed == self.total
    }

    pub fn percent(&self) -> f32 {
        if self.total == 0 {
            0.0
        } else {
            (self.completed as f32 / self.total as f32) * 100.0
        }
    }
}

/// Progress event forwarded by [`ChannelReporter`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchProgress {
    pub completed: usize,
    pub total: usize,
    pub percent: f32,
}

/// Observer notified after every item completion.
pub trait ProgressReporter: Send + Sync {
    fn on_progress(&self, completed: usize, total: usize);
}

/// Reporter that ignores every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopReporter;

impl ProgressReporter for NoopReporter {
    fn on_progress(&self, _completed: usize, _total: usize) {}
}

/// Reporter that logs each event.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingReporter;

impl ProgressReporter for TracingReporter {
    fn on_progress(&self, completed: usize, total: usize) {
        let snapshot = ProgressSnapshot { completed, total };
        info!(
            completed,
            total,
            percent = snapshot.percent().round() as u32,
            "Batch progress"
        );
    }
}

/// Reporter that forwards events over a channel.
///
/// Events are dropped once the receiver goes away.
#[derive(Debug, Clone)]
pub struct ChannelReporter {
    tx: mpsc::UnboundedSender<BatchProgress>,
}

impl ChannelReporter {
    pub fn new(tx: mpsc::UnboundedSender<BatchProgress>) -> Self {
        Self { tx }
    }

    /// Creates a reporter together with the receiving end of its channel.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<BatchProgress>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::new(tx), rx)
    }
}

impl ProgressReporter for ChannelReporter {
    fn on_progress(&self, completed: usize, total: usize) {
        let percent = ProgressSnapshot { completed, total }.percent();
        let _ = self.tx.send(BatchProgress {
            completed,
            total,
            percent,
        });
    }
}

/// Callback signature accepted by [`CallbackReporter`].
pub type ProgressCallback = Arc<dyn Fn(usize, usize) + Send + Sync>;

/// Reporter wrapping a plain callback.
#[derive(Clone)]
pub struct CallbackReporter {
    callback: ProgressCallback,
}

impl CallbackReporter {
    pub fn new(callback: impl Fn(usize, usize) + Send + Sync + 'static) -> Self {
        Self {
            callback: Arc::new(callback),
        }
    }
}

impl ProgressReporter for CallbackReporter {
    fn on_progress(&self, completed: usize, total: usize) {
        (self.callback)(completed, total);
    }
}

impl std::fmt::Debug for CallbackReporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallbackReporter").finish_non_exhaustive()
    }
}
