//! Types for the batch module.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use uuid::Uuid;

use super::error::ItemError;

/// Default ceiling on concurrently processed items.
pub const DEFAULT_MAX_WORKERS: usize = 20;

/// One unit of batch work.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkItem {
    /// Position in the enumerated sequence.
    pub index: usize,
    /// Opaque identifier (usually a URL).
    pub id: String,
}

impl WorkItem {
    /// Creates a new work item.
    pub fn new(index: usize, id: impl Into<String>) -> Self {
        Self {
            index,
            id: id.into(),
        }
    }

    /// Builds work items from identifiers, indexed by their position.
    ///
    /// Duplicate identifiers are kept as separate items.
    pub fn from_ids<I, S>(ids: I) -> Vec<WorkItem>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ids.into_iter()
            .enumerate()
            .map(|(index, id)| WorkItem::new(index, id))
            .collect()
    }
}

/// Output encoding for processed items.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// MP3 audio.
    #[default]
    Mp3,
    /// OGG Vorbis audio.
    Ogg,
    /// MP4 video.
    Mp4,
}

impl OutputFormat {
    /// File extension of produced artifacts.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Mp3 => "mp3",
            Self::Ogg => "ogg",
            Self::Mp4 => "mp4",
        }
    }

    /// Whether this format keeps only the audio stream.
    pub fn is_audio_only(&self) -> bool {
        matches!(self, Self::Mp3 | Self::Ogg)
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Error returned when parsing an unknown output format.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown output format '{0}' (expected mp3, ogg or mp4)")]
pub struct ParseFormatError(pub String);

impl FromStr for OutputFormat {
    type Err = ParseFormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mp3" => Ok(Self::Mp3),
            "ogg" | "vorbis" => Ok(Self::Ogg),
            "mp4" => Ok(Self::Mp4),
            other => Err(ParseFormatError(other.to_string())),
        }
    }
}

/// Immutable settings shared read-only by every worker of one batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Output encoding.
    pub format: OutputFormat,
    /// Directory receiving the produced artifacts.
    pub destination: PathBuf,
    /// Ceiling on concurrently processed items.
    pub max_workers: usize,
}

impl BatchConfig {
    /// Creates a configuration with the default worker ceiling.
    pub fn new(format: OutputFormat, destination: impl Into<PathBuf>) -> Self {
        Self {
            format,
            destination: destination.into(),
            max_workers: DEFAULT_MAX_WORKERS,
        }
    }

    /// Sets the worker ceiling.
    pub fn with_max_workers(mut self, max: usize) -> Self {
        self.max_workers = max;
        self
    }

    /// Number of workers used for a batch of `total` items.
    ///
    /// Always at least 1.
    pub fn effective_concurrency(&self, total: usize) -> usize {
        total.min(self.max_workers).max(1)
    }
}

/// Classification of a per-item failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// The item processor returned an error.
    Item,
    /// The item processor panicked.
    Panicked,
    /// The item could not be handed to a worker, or its worker vanished
    /// before reporting.
    Dispatch,
}

/// Structured reason attached to a failed item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureReason {
    pub kind: FailureKind,
    pub message: String,
}

impl FailureReason {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl From<&ItemError> for FailureReason {
    fn from(err: &ItemError) -> Self {
        Self::new(FailureKind::Item, err.diagnostic())
    }
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            FailureKind::Item => write!(f, "{}", self.message),
            FailureKind::Panicked => write!(f, "processor panicked: {}", self.message),
            FailureKind::Dispatch => write!(f, "dispatch failed: {}", self.message),
        }
    }
}

/// Result of processing one work item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    Success,
    Failure { reason: FailureReason },
}

impl Outcome {
    /// Creates a failure outcome.
    pub fn failure(kind: FailureKind, message: impl Into<String>) -> Self {
        Self::Failure {
            reason: FailureReason::new(kind, message),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }
}

/// A failed item as reported in the final result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedItem {
    pub index: usize,
    pub id: String,
    pub reason: FailureReason,
}

/// Final tally of a batch run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchResult {
    /// Identifier used to correlate log lines of this run.
    pub batch_id: Uuid,
    /// Number of items in the batch.
    pub total: usize,
    /// Items processed successfully.
    pub succeeded: usize,
    /// Items that failed.
    pub failed: usize,
    /// Number of workers used.
    pub concurrency: usize,
    /// Directory receiving the produced artifacts.
    pub destination: PathBuf,
    /// Failed items ordered by index.
    pub failures: Vec<FailedItem>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// Wall-clock duration in milliseconds.
    pub duration_ms: u64,
}

impl BatchResult {
    /// Whether every item succeeded.
    pub fn all_succeeded(&self) -> bool {
        self.failed == 0
    }
}
