//! yt-dlp backed collaborators for the batch orchestrator.
//!
//! - [`YtDlpEnumerator`] lists playlist entries with `--flat-playlist`
//! - [`YtDlpProcessor`] downloads one entry and extracts/converts it to the
//!   batch's output format
//!
//! Both spawn the configured binary as a subprocess with a timeout; a missing
//! binary is reported as a dedicated error rather than a generic I/O failure.

mod command;
mod config;
mod enumerator;
mod processor;

pub use config::YtDlpConfig;
pub use enumerator::YtDlpEnumerator;
pub use processor::YtDlpProcessor;
