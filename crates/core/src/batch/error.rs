//! Error types for the batch module.

use std::path::PathBuf;
use thiserror::Error;

/// Fatal errors returned by a batch run.
///
/// Per-item failures never surface here; they are tallied in the
/// [`BatchResult`](super::BatchResult).
#[derive(Debug, Error)]
pub enum BatchError {
    /// The batch had no items to process.
    #[error("Batch is empty, nothing to process")]
    EmptyBatch,

    /// The destination directory does not exist and could not be created.
    #[error("Destination directory unavailable: {path}")]
    DestinationUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors that can occur while expanding a source into work items.
#[derive(Debug, Error)]
pub enum EnumerationError {
    /// The enumerator's external tool could not be found.
    #[error("Enumerator binary not found at path: {path}")]
    ToolNotFound { path: PathBuf },

    /// The enumerator ran but reported a failure.
    #[error("Enumeration failed: {reason}")]
    Failed {
        reason: String,
        stderr: Option<String>,
    },

    /// The enumerator did not finish in time.
    #[error("Enumeration timed out after {timeout_secs} seconds")]
    Timeout { timeout_secs: u64 },

    /// The enumerator output could not be understood.
    #[error("Failed to parse enumerator output: {reason}")]
    ParseError { reason: String },

    /// I/O error while enumerating.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl EnumerationError {
    /// Creates a new failed error with optional stderr output.
    pub fn failed(reason: impl Into<String>, stderr: Option<String>) -> Self {
        Self::Failed {
            reason: reason.into(),
            stderr,
        }
    }

    /// Creates a new parse error.
    pub fn parse_error(reason: impl Into<String>) -> Self {
        Self::ParseError {
            reason: reason.into(),
        }
    }
}

/// Errors an item processor reports for a single work item.
#[derive(Debug, Error)]
pub enum ItemError {
    /// The processor's external tool could not be found.
    #[error("Processor binary not found at path: {path}")]
    ToolNotFound { path: PathBuf },

    /// Processing ran but failed.
    #[error("Processing failed: {reason}")]
    Failed {
        reason: String,
        stderr: Option<String>,
    },

    /// Processing did not finish in time.
    #[error("Processing timed out after {timeout_secs} seconds")]
    Timeout { timeout_secs: u64 },

    /// I/O error while processing.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ItemError {
    /// Creates a new failed error with optional stderr output.
    pub fn failed(reason: impl Into<String>, stderr: Option<String>) -> Self {
        Self::Failed {
            reason: reason.into(),
            stderr,
        }
    }

    /// Returns the error message together with the last line of captured
    /// stderr, if any.
    pub fn diagnostic(&self) -> String {
        match self {
            Self::Failed {
                stderr: Some(stderr),
                ..
            } => match stderr.lines().rev().find(|l| !l.trim().is_empty()) {
                Some(last) => format!("{}: {}", self, last.trim()),
                None => self.to_string(),
            },
            _ => self.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diagnostic_uses_last_stderr_line() {
        let err = ItemError::failed(
            "exit status 1",
            Some("WARNING: something\nERROR: Video unavailable\n\n".to_string()),
        );
        assert_eq!(
            err.diagnostic(),
            "Processing failed: exit status 1: ERROR: Video unavailable"
        );
    }

    #[test]
    fn test_diagnostic_without_stderr() {
        let err = ItemError::Timeout { timeout_secs: 30 };
        assert_eq!(err.diagnostic(), "Processing timed out after 30 seconds");

        let err = ItemError::failed("boom", Some("   \n".to_string()));
        assert_eq!(err.diagnostic(), "Processing failed: boom");
    }

    #[test]
    fn test_batch_error_display() {
        let err = BatchError::DestinationUnavailable {
            path: PathBuf::from("/nope"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        assert_eq!(err.to_string(), "Destination directory unavailable: /nope");
        assert_eq!(
            BatchError::EmptyBatch.to_string(),
            "Batch is empty, nothing to process"
        );
    }
}
