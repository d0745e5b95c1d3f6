//! Progress reporter that records every event.

use std::sync::Mutex;

use crate::batch::ProgressReporter;

/// Records `(completed, total)` pairs in the order they were reported.
#[derive(Debug, Default)]
pub struct RecordingReporter {
    events: Mutex<Vec<(usize, usize)>>,
}

impl RecordingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// All events reported so far.
    pub fn events(&self) -> Vec<(usize, usize)> {
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// The most recent event, if any.
    pub fn last(&self) -> Option<(usize, usize)> {
        self.events().last().copied()
    }
}

impl ProgressReporter for RecordingReporter {
    fn on_progress(&self, completed: usize, total: usize) {
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push((completed, total));
    }
}
