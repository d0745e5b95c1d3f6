//! Per-item download and conversion through yt-dlp.

use async_trait::async_trait;
use std::path::Path;
use tracing::debug;

use crate::batch::{BatchConfig, ItemError, ItemProcessor, OutputFormat, WorkItem};

use super::command;
use super::config::YtDlpConfig;

/// Output filename template, relative to the destination directory.
const OUTPUT_TEMPLATE: &str = "%(title)s.%(ext)s";

/// Downloads one item and converts it to the batch's output format.
#[derive(Debug, Clone)]
pub struct YtDlpProcessor {
    config: YtDlpConfig,
}

impl YtDlpProcessor {
    pub fn new(config: YtDlpConfig) -> Self {
        Self { config }
    }

    pub fn with_defaults() -> Self {
        Self::new(YtDlpConfig::default())
    }

    pub fn config(&self) -> &YtDlpConfig {
        &self.config
    }

    /// Format selection and post-processing arguments for `format`.
    pub fn format_args(format: OutputFormat) -> Vec<String> {
        let args: &[&str] = match format {
            OutputFormat::Mp3 => &[
                "-f",
                "bestaudio/best",
                "-x",
                "--audio-format",
                "mp3",
                "--audio-quality",
                "192K",
            ],
            OutputFormat::Ogg => &["-f", "bestaudio/best", "-x", "--audio-format", "vorbis"],
            OutputFormat::Mp4 => &["-f", "best[ext=mp4]"],
        };
        args.iter().map(|a| a.to_string()).collect()
    }

    /// Full argument list for downloading `url` into `destination`.
    pub fn download_args(&self, url: &str, format: OutputFormat, destination: &Path) -> Vec<String> {
        let mut args = Self::format_args(format);

        args.extend([
            "--quiet".to_string(),
            "--no-warnings".to_string(),
            "--no-progress".to_string(),
            "-o".to_string(),
            destination.join(OUTPUT_TEMPLATE).to_string_lossy().to_string(),
        ]);

        args.extend(self.config.extra_args.iter().cloned());

        // URL goes after `--` so yt-dlp never parses it as an option.
        args.push("--".to_string());
        args.push(url.to_string());

        args
    }

    /// Checks that the yt-dlp binary can be executed.
    pub async fn validate(&self) -> Result<String, ItemError> {
        let output = command::run(&self.config.path, &["--version".to_string()], 30).await?;
        Ok(output.stdout.trim().to_string())
    }
}

#[async_trait]
impl ItemProcessor for YtDlpProcessor {
    fn name(&self) -> &str {
        "yt-dlp"
    }

    async fn process(&self, item: &WorkItem, config: &BatchConfig) -> Result<(), ItemError> {
        let args = self.download_args(&item.id, config.format, &config.destination);
        let output = command::run(&self.config.path, &args, self.config.timeout_secs).await?;

        if !output.stderr.trim().is_empty() {
            debug!(index = item.index, stderr = %output.stderr.trim(), "yt-dlp reported diagnostics");
        }
        Ok(())
    }
}
