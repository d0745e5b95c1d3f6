use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::batch::{BatchConfig, OutputFormat, DEFAULT_MAX_WORKERS};
use crate::ytdlp::YtDlpConfig;

/// Root configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default)]
    pub batch: BatchSettings,
    #[serde(default)]
    pub ytdlp: YtDlpConfig,
}

/// Batch configuration
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct BatchSettings {
    /// Ceiling on items processed in parallel
    #[serde(default = "default_max_workers")]
    pub max_workers: usize,
    /// Output encoding
    #[serde(default)]
    pub format: OutputFormat,
    /// Directory receiving downloaded files
    #[serde(default = "default_destination")]
    pub destination: PathBuf,
}

impl Default for BatchSettings {
    fn default() -> Self {
        Self {
            max_workers: default_max_workers(),
            format: OutputFormat::default(),
            destination: default_destination(),
        }
    }
}

impl BatchSettings {
    /// Resolves the immutable per-run configuration.
    pub fn to_batch_config(&self) -> BatchConfig {
        BatchConfig::new(self.format, self.destination.clone()).with_max_workers(self.max_workers)
    }
}

fn default_max_workers() -> usize {
    DEFAULT_MAX_WORKERS
}

fn default_destination() -> PathBuf {
    PathBuf::from("downloads")
}
