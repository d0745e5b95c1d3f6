//! Configuration for the yt-dlp collaborators.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration shared by [`YtDlpEnumerator`](super::YtDlpEnumerator) and
/// [`YtDlpProcessor`](super::YtDlpProcessor).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct YtDlpConfig {
    /// Path to the yt-dlp binary.
    #[serde(default = "default_path")]
    pub path: PathBuf,

    /// Timeout for downloading a single item in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Timeout for listing a playlist in seconds.
    #[serde(default = "default_enumerate_timeout")]
    pub enumerate_timeout_secs: u64,

    /// Additional arguments passed to every download.
    #[serde(default)]
    pub extra_args: Vec<String>,
}

fn default_path() -> PathBuf {
    PathBuf::from("yt-dlp")
}

fn default_timeout() -> u64 {
    3600 // 1 hour
}

fn default_enumerate_timeout() -> u64 {
    120
}

impl Default for YtDlpConfig {
    fn default() -> Self {
        Self {
            path: default_path(),
            timeout_secs: default_timeout(),
            enumerate_timeout_secs: default_enumerate_timeout(),
            extra_args: Vec::new(),
        }
    }
}

impl YtDlpConfig {
    /// Creates a config pointing at a custom binary.
    pub fn with_path(path: PathBuf) -> Self {
        Self {
            path,
            ..Default::default()
        }
    }

    /// Sets the per-item timeout in seconds.
    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    /// Sets the enumeration timeout in seconds.
    pub fn with_enumerate_timeout(mut self, timeout_secs: u64) -> Self {
        self.enumerate_timeout_secs = timeout_secs;
        self
    }

    /// Sets extra download arguments.
    pub fn with_extra_args(mut self, args: Vec<String>) -> Self {
        self.extra_args = args;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = YtDlpConfig::default();
        assert_eq!(config.path, PathBuf::from("yt-dlp"));
        assert_eq!(config.timeout_secs, 3600);
        assert_eq!(config.enumerate_timeout_secs, 120);
        assert!(config.extra_args.is_empty());
    }

    #[test]
    fn test_config_builder() {
        let config = YtDlpConfig::with_path(PathBuf::from("/opt/bin/yt-dlp"))
            .with_timeout(600)
            .with_enumerate_timeout(30)
            .with_extra_args(vec!["--restrict-filenames".to_string()]);

        assert_eq!(config.path, PathBuf::from("/opt/bin/yt-dlp"));
        assert_eq!(config.timeout_secs, 600);
        assert_eq!(config.enumerate_timeout_secs, 30);
        assert_eq!(config.extra_args, vec!["--restrict-filenames"]);
    }

    #[test]
    fn test_deserialize_partial() {
        let config: YtDlpConfig = toml::from_str("timeout_secs = 90").unwrap();
        assert_eq!(config.timeout_secs, 90);
        assert_eq!(config.path, PathBuf::from("yt-dlp"));
    }
}
