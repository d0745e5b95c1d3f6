//! Bounded concurrent batch orchestrator.

use chrono::Utc;
use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{mpsc, RwLock, Semaphore};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::error::{BatchError, EnumerationError};
use super::progress::{NoopReporter, ProgressReporter, ProgressSnapshot, ProgressState};
use super::traits::{Enumerator, ItemProcessor};
use super::types::{
    BatchConfig, BatchResult, FailedItem, FailureKind, FailureReason, Outcome, WorkItem,
};

/// Error type for [`BatchOrchestrator::run_source`].
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// The source could not be enumerated; nothing was dispatched.
    #[error(transparent)]
    Enumeration(#[from] EnumerationError),

    /// The batch could not start.
    #[error(transparent)]
    Batch(#[from] BatchError),
}

/// Result of enumerating a source and running its batch.
#[derive(Debug, Clone)]
pub enum SourceRun {
    /// The source listed no items, so no batch was started.
    NoItems,
    /// The batch ran to completion.
    Completed(BatchResult),
}

/// One `(index, outcome)` pair pushed by a worker.
type Completion = (usize, Outcome);

/// Running tally folded from worker completions.
struct Tally {
    outcomes: Vec<Option<Outcome>>,
    succeeded: usize,
    failed: usize,
}

impl Tally {
    fn new(total: usize) -> Self {
        Self {
            outcomes: vec![None; total],
            succeeded: 0,
            failed: 0,
        }
    }

    /// Whether `index` is in range and has not reported yet.
    fn accepts(&self, index: usize) -> bool {
        matches!(self.outcomes.get(index), Some(None))
    }

    fn fold(&mut self, index: usize, outcome: Outcome) {
        if outcome.is_success() {
            self.succeeded += 1;
        } else {
            self.failed += 1;
        }
        self.outcomes[index] = Some(outcome);
    }

    fn missing(&self) -> Vec<usize> {
        self.outcomes
            .iter()
            .enumerate()
            .filter(|(_, o)| o.is_none())
            .map(|(i, _)| i)
            .collect()
    }

    fn is_complete(&self) -> bool {
        self.succeeded + self.failed == self.outcomes.len()
    }
}

/// Runs every item of a batch through an [`ItemProcessor`] under a
/// concurrency cap.
///
/// Items are dispatched in input order. Each finished item bumps the shared
/// [`ProgressState`], notifies the reporter, and is folded into the tally by
/// a single aggregating consumer. Processor errors and panics are converted
/// into failed outcomes and never abort sibling items.
pub struct BatchOrchestrator<P: ItemProcessor> {
    processor: Arc<P>,
    reporter: Arc<dyn ProgressReporter>,
    current: Arc<RwLock<Option<Arc<ProgressState>>>>,
}

impl<P: ItemProcessor + 'static> BatchOrchestrator<P> {
    /// Creates an orchestrator that reports progress nowhere.
    pub fn new(processor: P) -> Self {
        Self::from_arc(Arc::new(processor))
    }

    /// Creates an orchestrator sharing an existing processor.
    pub fn from_arc(processor: Arc<P>) -> Self {
        Self {
            processor,
            reporter: Arc::new(NoopReporter),
            current: Arc::new(RwLock::new(None)),
        }
    }

    /// Sets the progress reporter.
    pub fn with_reporter(mut self, reporter: Arc<dyn ProgressReporter>) -> Self {
        self.reporter = reporter;
        self
    }

    /// Returns the processor.
    pub fn processor(&self) -> &P {
        &self.processor
    }

    /// Returns the progress of the running batch, or of the last finished
    /// one. `None` before any batch has started.
    pub async fn progress(&self) -> Option<ProgressSnapshot> {
        self.current.read().await.as_ref().map(|p| p.snapshot())
    }

    /// Enumerates `source` and runs the resulting batch.
    ///
    /// An empty listing yields [`SourceRun::NoItems`] without starting a batch.
    pub async fn run_source<E: Enumerator + ?Sized>(
        &self,
        enumerator: &E,
        source: &str,
        config: BatchConfig,
    ) -> Result<SourceRun, SourceError> {
        info!(
            enumerator = enumerator.name(),
            source, "Enumerating batch source"
        );
        let ids = enumerator.list_items(source).await?;
        if ids.is_empty() {
            info!(source, "0 items found, batch not started");
            return Ok(SourceRun::NoItems);
        }
        info!(source, items = ids.len(), "Found items");

        let result = self.run_batch(WorkItem::from_ids(ids), config).await?;
        Ok(SourceRun::Completed(result))
    }

    /// Runs every item exactly once and returns the final tally.
    ///
    /// Fails with [`BatchError::EmptyBatch`] when `items` is empty and with
    /// [`BatchError::DestinationUnavailable`] when the destination directory
    /// cannot be created; in both cases nothing is dispatched.
    pub async fn run_batch(
        &self,
        items: Vec<WorkItem>,
        config: BatchConfig,
    ) -> Result<BatchResult, BatchError> {
        if items.is_empty() {
            return Err(BatchError::EmptyBatch);
        }

        tokio::fs::create_dir_all(&config.destination)
            .await
            .map_err(|source| BatchError::DestinationUnavailable {
                path: config.destination.clone(),
                source,
            })?;

        let batch_id = Uuid::new_v4();
        let started_at = Utc::now();
        let start = Instant::now();
        let total = items.len();
        let concurrency = config.effective_concurrency(total);

        let progress = Arc::new(ProgressState::new(total));
        *self.current.write().await = Some(Arc::clone(&progress));

        info!(
            %batch_id,
            total,
            concurrency,
            format = %config.format,
            destination = %config.destination.display(),
            processor = self.processor.name(),
            "Starting batch"
        );

        let config = Arc::new(config);
        let semaphore = Arc::new(Semaphore::new(concurrency));
        // Capacity `total` means a worker never waits to report.
        let (result_tx, result_rx) = mpsc::channel::<Completion>(total);

        let dispatch = Self::dispatch(
            batch_id,
            &items,
            Arc::clone(&self.processor),
            Arc::clone(&config),
            semaphore,
            result_tx,
        );
        let aggregate = Self::aggregate(batch_id, result_rx, &progress, self.reporter.as_ref());

        let ((), mut tally) = tokio::join!(dispatch, aggregate);

        Self::settle_missing(batch_id, &mut tally, &progress, self.reporter.as_ref());
        debug_assert!(tally.is_complete());
        debug_assert!(progress.snapshot().is_complete());

        let failures: Vec<FailedItem> = tally
            .outcomes
            .iter()
            .zip(items.iter())
            .filter_map(|(outcome, item)| match outcome {
                Some(Outcome::Failure { reason }) => Some(FailedItem {
                    index: item.index,
                    id: item.id.clone(),
                    reason: reason.clone(),
                }),
                _ => None,
            })
            .collect();

        let result = BatchResult {
            batch_id,
            total,
            succeeded: tally.succeeded,
            failed: tally.failed,
            concurrency,
            destination: config.destination.clone(),
            failures,
            started_at,
            finished_at: Utc::now(),
            duration_ms: start.elapsed().as_millis() as u64,
        };

        info!(
            %batch_id,
            succeeded = result.succeeded,
            failed = result.failed,
            duration_ms = result.duration_ms,
            "Batch finished"
        );

        Ok(result)
    }

    /// Hands items to workers in input order, waiting for a free slot before
    /// each one.
    async fn dispatch(
        batch_id: Uuid,
        items: &[WorkItem],
        processor: Arc<P>,
        config: Arc<BatchConfig>,
        semaphore: Arc<Semaphore>,
        result_tx: mpsc::Sender<Completion>,
    ) {
        for item in items {
            // Only fails on a closed semaphore. Items left undispatched are
            // settled as lost once the result channel drains.
            let Ok(permit) = Arc::clone(&semaphore).acquire_owned().await else {
                warn!(%batch_id, index = item.index, "Worker pool closed, stopping dispatch");
                break;
            };

            debug!(%batch_id, index = item.index, item = %item.id, "Dispatching item");

            let item = item.clone();
            let processor = Arc::clone(&processor);
            let config = Arc::clone(&config);
            let tx = result_tx.clone();

            tokio::spawn(async move {
                let outcome = execute(processor.as_ref(), &item, &config).await;
                drop(permit);
                match &outcome {
                    Outcome::Success => {
                        debug!(%batch_id, index = item.index, item = %item.id, "Item succeeded")
                    }
                    Outcome::Failure { reason } => {
                        warn!(%batch_id, index = item.index, item = %item.id, reason = %reason, "Item failed")
                    }
                }
                let _ = tx.send((item.index, outcome)).await;
            });
        }
    }

    /// Drains worker completions until every item has reported or all
    /// senders are gone.
    async fn aggregate(
        batch_id: Uuid,
        mut result_rx: mpsc::Receiver<Completion>,
        progress: &ProgressState,
        reporter: &dyn ProgressReporter,
    ) -> Tally {
        let mut tally = Tally::new(progress.snapshot().total);

        while let Some((index, outcome)) = result_rx.recv().await {
            if !tally.accepts(index) {
                warn!(%batch_id, index, "Ignoring unexpected completion");
                continue;
            }

            let snapshot = progress.record_completion();
            reporter.on_progress(snapshot.completed, snapshot.total);
            tally.fold(index, outcome);

            if tally.is_complete() {
                break;
            }
        }

        tally
    }

    /// Records a `Dispatch` failure for every item that never reported,
    /// counting each one toward progress like any other completion.
    fn settle_missing(
        batch_id: Uuid,
        tally: &mut Tally,
        progress: &ProgressState,
        reporter: &dyn ProgressReporter,
    ) {
        for index in tally.missing() {
            warn!(%batch_id, index, "Worker exited without reporting an outcome");
            let snapshot = progress.record_completion();
            reporter.on_progress(snapshot.completed, snapshot.total);
            tally.fold(
                index,
                Outcome::failure(FailureKind::Dispatch, "worker exited without reporting"),
            );
        }
    }
}

/// Runs the processor for one item, converting errors and panics into a
/// failed outcome.
async fn execute<P: ItemProcessor + ?Sized>(
    processor: &P,
    item: &WorkItem,
    config: &BatchConfig,
) -> Outcome {
    // The call itself sits inside the guarded future so a processor that
    // panics before returning its future is caught too.
    match AssertUnwindSafe(async { processor.process(item, config).await })
        .catch_unwind()
        .await
    {
        Ok(Ok(())) => Outcome::Success,
        Ok(Err(e)) => Outcome::Failure {
            reason: FailureReason::from(&e),
        },
        Err(panic) => Outcome::failure(FailureKind::Panicked, panic_message(panic.as_ref())),
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::types::OutputFormat;
    use crate::testing::{MockEnumerator, MockProcessor, RecordingReporter};
    use tempfile::TempDir;

    fn config(dir: &TempDir, max_workers: usize) -> BatchConfig {
        BatchConfig::new(OutputFormat::Mp3, dir.path()).with_max_workers(max_workers)
    }

    #[test]
    fn test_tally_tracks_missing() {
        let mut tally = Tally::new(3);
        assert!(tally.accepts(0));
        assert!(!tally.accepts(3));

        tally.fold(0, Outcome::Success);
        tally.fold(2, Outcome::failure(FailureKind::Item, "nope"));
        assert!(!tally.accepts(0));
        assert_eq!(tally.missing(), vec![1]);
        assert!(!tally.is_complete());

        tally.fold(1, Outcome::Success);
        assert!(tally.is_complete());
        assert_eq!(tally.succeeded, 2);
        assert_eq!(tally.failed, 1);
    }

    #[test]
    fn test_settle_missing_counts_lost_workers() {
        let progress = ProgressState::new(3);
        let reporter = RecordingReporter::new();
        let mut tally = Tally::new(3);

        progress.record_completion();
        tally.fold(1, Outcome::Success);

        BatchOrchestrator::<MockProcessor>::settle_missing(
            Uuid::new_v4(),
            &mut tally,
            &progress,
            &reporter,
        );

        assert!(tally.is_complete());
        assert_eq!(tally.succeeded, 1);
        assert_eq!(tally.failed, 2);
        assert!(progress.snapshot().is_complete());
        assert_eq!(reporter.events(), vec![(2, 3), (3, 3)]);
        for index in [0, 2] {
            match &tally.outcomes[index] {
                Some(Outcome::Failure { reason }) => {
                    assert_eq!(reason.kind, FailureKind::Dispatch)
                }
                other => panic!("expected dispatch failure, got {:?}", other),
            }
        }
    }

    #[test]
    fn test_settle_missing_is_noop_when_complete() {
        let progress = ProgressState::new(1);
        let reporter = RecordingReporter::new();
        let mut tally = Tally::new(1);
        progress.record_completion();
        tally.fold(0, Outcome::Success);

        BatchOrchestrator::<MockProcessor>::settle_missing(
            Uuid::new_v4(),
            &mut tally,
            &progress,
            &reporter,
        );

        assert_eq!(tally.failed, 0);
        assert!(reporter.events().is_empty());
    }

    #[test]
    fn test_panic_message() {
        let boxed: Box<dyn Any + Send> = Box::new("static message");
        assert_eq!(panic_message(boxed.as_ref()), "static message");
        let boxed: Box<dyn Any + Send> = Box::new(String::from("owned message"));
        assert_eq!(panic_message(boxed.as_ref()), "owned message");
        let boxed: Box<dyn Any + Send> = Box::new(42u32);
        assert_eq!(panic_message(boxed.as_ref()), "unknown panic");
    }

    #[tokio::test]
    async fn test_empty_batch_is_rejected() {
        let dir = TempDir::new().unwrap();
        let processor = MockProcessor::new();
        let orchestrator = BatchOrchestrator::new(processor.clone());

        let result = orchestrator.run_batch(vec![], config(&dir, 20)).await;
        assert!(matches!(result, Err(BatchError::EmptyBatch)));
        assert_eq!(processor.call_count().await, 0);
        assert!(orchestrator.progress().await.is_none());
    }

    #[tokio::test]
    async fn test_progress_is_complete_after_run() {
        let dir = TempDir::new().unwrap();
        let reporter = Arc::new(RecordingReporter::new());
        let orchestrator =
            BatchOrchestrator::new(MockProcessor::new()).with_reporter(reporter.clone());

        let items = WorkItem::from_ids(["a", "b", "c"]);
        let result = orchestrator.run_batch(items, config(&dir, 2)).await.unwrap();

        assert_eq!(result.succeeded, 3);
        let progress = orchestrator.progress().await.unwrap();
        assert_eq!(progress.completed, 3);
        assert_eq!(progress.total, 3);
        assert_eq!(reporter.events(), vec![(1, 3), (2, 3), (3, 3)]);
    }

    #[tokio::test]
    async fn test_failure_reasons_are_collected() {
        let dir = TempDir::new().unwrap();
        let processor = MockProcessor::new();
        processor.set_failing_indices([1]).await;
        processor.set_panicking_indices([3]).await;
        let orchestrator = BatchOrchestrator::new(processor);

        let items = WorkItem::from_ids(["a", "b", "c", "d"]);
        let result = orchestrator.run_batch(items, config(&dir, 4)).await.unwrap();

        assert_eq!(result.succeeded, 2);
        assert_eq!(result.failed, 2);
        assert_eq!(result.failures.len(), 2);
        assert_eq!(result.failures[0].index, 1);
        assert_eq!(result.failures[0].id, "b");
        assert_eq!(result.failures[0].reason.kind, FailureKind::Item);
        assert_eq!(result.failures[1].index, 3);
        assert_eq!(result.failures[1].reason.kind, FailureKind::Panicked);
    }

    #[tokio::test]
    async fn test_run_source_with_no_items() {
        let dir = TempDir::new().unwrap();
        let enumerator = MockEnumerator::new();
        let processor = MockProcessor::new();
        let orchestrator = BatchOrchestrator::new(processor.clone());

        let run = orchestrator
            .run_source(&enumerator, "playlist", config(&dir, 20))
            .await
            .unwrap();
        assert!(matches!(run, SourceRun::NoItems));
        assert_eq!(processor.call_count().await, 0);
        assert_eq!(enumerator.recorded_sources().await, vec!["playlist"]);
    }

    #[tokio::test]
    async fn test_run_source_enumeration_error() {
        let dir = TempDir::new().unwrap();
        let enumerator = MockEnumerator::new();
        enumerator
            .set_next_error(EnumerationError::parse_error("bad json"))
            .await;
        let processor = MockProcessor::new();
        let orchestrator = BatchOrchestrator::new(processor.clone());

        let result = orchestrator
            .run_source(&enumerator, "playlist", config(&dir, 20))
            .await;
        assert!(matches!(result, Err(SourceError::Enumeration(_))));
        assert_eq!(processor.call_count().await, 0);
    }
}
