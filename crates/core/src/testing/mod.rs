//! Testing utilities and mock implementations of the batch collaborators.
//!
//! Lets the orchestrator be exercised end to end without spawning yt-dlp.
//!
//! # Example
//!
//! ```rust,ignore
//! use playlist_dl_core::testing::{MockEnumerator, MockProcessor, RecordingReporter};
//!
//! let enumerator = MockEnumerator::with_items(["https://a", "https://b"]);
//! let processor = MockProcessor::new();
//! let reporter = Arc::new(RecordingReporter::new());
//!
//! let orchestrator = BatchOrchestrator::new(processor.clone()).with_reporter(reporter.clone());
//! let run = orchestrator.run_source(&enumerator, "playlist", config).await?;
//! ```

mod mock_enumerator;
mod mock_processor;
mod recording_reporter;

pub use mock_enumerator::MockEnumerator;
pub use mock_processor::MockProcessor;
pub use recording_reporter::RecordingReporter;

/// Test fixtures and helper functions.
pub mod fixtures {
    use crate::batch::WorkItem;

    /// Create `count` work items with distinct video URLs.
    pub fn work_items(count: usize) -> Vec<WorkItem> {
        WorkItem::from_ids((0..count).map(video_url))
    }

    /// Create a video URL for position `n`.
    pub fn video_url(n: usize) -> String {
        format!("https://www.youtube.com/watch?v=video{:04}", n)
    }
}
