//! Batch module: bounded concurrent processing of enumerated work items.
//!
//! This module provides the `BatchOrchestrator` which:
//! - Dispatches every item exactly once, in input order
//! - Caps the number of items processed in parallel
//! - Isolates per-item failures (errors and panics) from the rest of the batch
//! - Reports progress after every completed item
//!
//! The orchestrator only depends on the [`Enumerator`], [`ItemProcessor`] and
//! [`ProgressReporter`] traits; concrete implementations live elsewhere.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use playlist_dl_core::batch::{BatchConfig, BatchOrchestrator, OutputFormat, TracingReporter, WorkItem};
//! use playlist_dl_core::ytdlp::{YtDlpConfig, YtDlpProcessor};
//!
//! let processor = YtDlpProcessor::new(YtDlpConfig::default());
//! let orchestrator = BatchOrchestrator::new(processor)
//!     .with_reporter(Arc::new(TracingReporter));
//!
//! let items = WorkItem::from_ids(urls);
//! let config = BatchConfig::new(OutputFormat::Mp3, "downloads");
//! let result = orchestrator.run_batch(items, config).await?;
//! println!("{} succeeded, {} failed", result.succeeded, result.failed);
//! ```

mod error;
mod orchestrator;
mod progress;
mod traits;
mod types;

pub use error::{BatchError, EnumerationError, ItemError};
pub use orchestrator::{BatchOrchestrator, SourceError, SourceRun};
pub use progress::{
    BatchProgress, CallbackReporter, ChannelReporter, NoopReporter, ProgressCallback,
    ProgressReporter, ProgressSnapshot, ProgressState, TracingReporter,
};
pub use traits::{Enumerator, ItemProcessor};
pub use types::{
    BatchConfig, BatchResult, FailedItem, FailureKind, FailureReason, Outcome, OutputFormat,
    ParseFormatError, WorkItem, DEFAULT_MAX_WORKERS,
};
