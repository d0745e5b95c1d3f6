//! Mock item processor for testing.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::batch::{BatchConfig, ItemError, ItemProcessor, WorkItem};

/// Tracks in-flight calls and their high-water mark.
#[derive(Debug, Default)]
struct InFlight {
    current: AtomicUsize,
    peak: AtomicUsize,
}

/// Decrements the in-flight counter when dropped, including during a panic.
struct InFlightGuard<'a>(&'a InFlight);

impl<'a> InFlightGuard<'a> {
    fn enter(tracker: &'a InFlight) -> Self {
        let now = tracker.current.fetch_add(1, Ordering::SeqCst) + 1;
        tracker.peak.fetch_max(now, Ordering::SeqCst);
        Self(tracker)
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.current.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Mock implementation of the ItemProcessor trait.
///
/// Provides controllable behavior for testing:
/// - Record every processed item, in call order
/// - Fail or panic on chosen item indices, or fail everything
/// - Simulate processing time, globally or per item
/// - Track the peak number of concurrent calls
///
/// # Example
///
/// ```rust,ignore
/// use playlist_dl_core::testing::MockProcessor;
///
/// let processor = MockProcessor::new();
/// processor.set_failing_indices([2, 5]).await;
/// processor.set_delay(Duration::from_millis(10)).await;
///
/// let orchestrator = BatchOrchestrator::new(processor.clone());
/// let result = orchestrator.run_batch(items, config).await?;
///
/// assert_eq!(result.failed, 2);
/// assert!(processor.max_in_flight() <= 20);
/// ```
#[derive(Debug, Clone, Default)]
pub struct MockProcessor {
    /// Items in the order their processing started.
    calls: Arc<RwLock<Vec<WorkItem>>>,
    /// Indices whose processing returns an error.
    failing: Arc<RwLock<HashSet<usize>>>,
    /// Indices whose processing panics.
    panicking: Arc<RwLock<HashSet<usize>>>,
    /// Whether every item fails.
    fail_all: Arc<RwLock<bool>>,
    /// Simulated processing time for every item.
    delay: Arc<RwLock<Duration>>,
    /// Per-index processing time, overriding `delay`.
    item_delays: Arc<RwLock<HashMap<usize, Duration>>>,
    in_flight: Arc<InFlight>,
}

impl MockProcessor {
    /// Create a new mock processor where every item succeeds immediately.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make items at these indices fail.
    pub async fn set_failing_indices(&self, indices: impl IntoIterator<Item = usize>) {
        *self.failing.write().await = indices.into_iter().collect();
    }

    /// Make items at these indices panic.
    pub async fn set_panicking_indices(&self, indices: impl IntoIterator<Item = usize>) {
        *self.panicking.write().await = indices.into_iter().collect();
    }

    /// Make every item fail.
    pub async fn set_fail_all(&self, fail: bool) {
        *self.fail_all.write().await = fail;
    }

    /// Set the simulated processing time for every item.
    pub async fn set_delay(&self, delay: Duration) {
        *self.delay.write().await = delay;
    }

    /// Set the simulated processing time for one item.
    pub async fn set_item_delay(&self, index: usize, delay: Duration) {
        self.item_delays.write().await.insert(index, delay);
    }

    /// Items in the order their processing started.
    pub async fn recorded_calls(&self) -> Vec<WorkItem> {
        self.calls.read().await.clone()
    }

    /// Number of process calls made.
    pub async fn call_count(&self) -> usize {
        self.calls.read().await.len()
    }

    /// Highest number of concurrent process calls observed.
    pub fn max_in_flight(&self) -> usize {
        self.in_flight.peak.load(Ordering::SeqCst)
    }

    /// Number of process calls currently running.
    pub fn in_flight(&self) -> usize {
        self.in_flight.current.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ItemProcessor for MockProcessor {
    fn name(&self) -> &str {
        "mock"
    }

    async fn process(&self, item: &WorkItem, _config: &BatchConfig) -> Result<(), ItemError> {
        let _guard = InFlightGuard::enter(&self.in_flight);
        self.calls.write().await.push(item.clone());

        let delay = match self.item_delays.read().await.get(&item.index) {
            Some(d) => *d,
            None => *self.delay.read().await,
        };
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        if self.panicking.read().await.contains(&item.index) {
            panic!("mock processor panic on item {}", item.index);
        }

        let fail_all = *self.fail_all.read().await;
        if fail_all || self.failing.read().await.contains(&item.index) {
            return Err(ItemError::failed(
                format!("mock failure on item {}", item.index),
                Some(format!("ERROR: {} unavailable", item.id)),
            ));
        }

        Ok(())
    }
}
