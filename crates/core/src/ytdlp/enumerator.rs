//! Playlist enumeration through `yt-dlp --flat-playlist`.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::batch::{EnumerationError, Enumerator};

use super::command;
use super::config::YtDlpConfig;

/// Lists the entries of a playlist without downloading anything.
#[derive(Debug, Clone)]
pub struct YtDlpEnumerator {
    config: YtDlpConfig,
}

impl YtDlpEnumerator {
    pub fn new(config: YtDlpConfig) -> Self {
        Self { config }
    }

    pub fn with_defaults() -> Self {
        Self::new(YtDlpConfig::default())
    }

    /// Arguments for a flat playlist listing of `source`.
    pub fn list_args(source: &str) -> Vec<String> {
        vec![
            "--flat-playlist".to_string(),
            "--dump-single-json".to_string(),
            "--quiet".to_string(),
            "--no-warnings".to_string(),
            source.to_string(),
        ]
    }

    /// Extracts entry URLs, in playlist order, from yt-dlp's single-JSON dump.
    ///
    /// A dump without `entries` is a single video and yields its own URL.
    pub fn parse_listing(json: &str) -> Result<Vec<String>, EnumerationError> {
        #[derive(Deserialize)]
        struct Listing {
            #[serde(default)]
            entries: Option<Vec<Option<Entry>>>,
            #[serde(flatten)]
            own: Entry,
        }

        #[derive(Deserialize)]
        struct Entry {
            url: Option<String>,
            webpage_url: Option<String>,
            id: Option<String>,
        }

        impl Entry {
            fn resolve(self) -> Option<String> {
                self.url
                    .or(self.webpage_url)
                    .or_else(|| {
                        self.id
                            .map(|id| format!("https://www.youtube.com/watch?v={}", id))
                    })
            }
        }

        let listing: Listing = serde_json::from_str(json)
            .map_err(|e| EnumerationError::parse_error(format!("invalid yt-dlp JSON: {}", e)))?;

        let Some(entries) = listing.entries else {
            return listing
                .own
                .resolve()
                .map(|url| vec![url])
                .ok_or_else(|| EnumerationError::parse_error("listing has neither entries nor a URL"));
        };

        let mut urls = Vec::with_capacity(entries.len());
        for (position, entry) in entries.into_iter().enumerate() {
            match entry.and_then(Entry::resolve) {
                Some(url) => urls.push(url),
                None => warn!(position, "Skipping playlist entry without a URL"),
            }
        }
        Ok(urls)
    }
}

#[async_trait]
impl Enumerator for YtDlpEnumerator {
    fn name(&self) -> &str {
        "yt-dlp"
    }

    async fn list_items(&self, source: &str) -> Result<Vec<String>, EnumerationError> {
        let output = command::run(
            &self.config.path,
            &Self::list_args(source),
            self.config.enumerate_timeout_secs,
        )
        .await?;

        let urls = Self::parse_listing(&output.stdout)?;
        debug!(source, entries = urls.len(), "Listed playlist");
        Ok(urls)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_list_args() {
        let args = YtDlpEnumerator::list_args("https://example.com/playlist?list=PL1");
        assert_eq!(args[0], "--flat-playlist");
        assert!(args.contains(&"--dump-single-json".to_string()));
        assert_eq!(args.last().unwrap(), "https://example.com/playlist?list=PL1");
    }

    #[test]
    fn test_parse_playlist_in_order() {
        let json = r#"{
            "_type": "playlist",
            "id": "PL1",
            "title": "Mix",
            "webpage_url": "https://www.youtube.com/playlist?list=PL1",
            "entries": [
                {"_type": "url", "id": "aaa", "url": "https://www.youtube.com/watch?v=aaa"},
                {"_type": "url", "id": "bbb", "webpage_url": "https://www.youtube.com/watch?v=bbb"},
                {"_type": "url", "id": "ccc"},
                {"_type": "url", "id": "aaa", "url": "https://www.youtube.com/watch?v=aaa"}
            ]
        }"#;

        let urls = YtDlpEnumerator::parse_listing(json).unwrap();
        assert_eq!(
            urls,
            vec![
                "https://www.youtube.com/watch?v=aaa",
                "https://www.youtube.com/watch?v=bbb",
                "https://www.youtube.com/watch?v=ccc",
                "https://www.youtube.com/watch?v=aaa",
            ]
        );
    }

    #[test]
    fn test_parse_skips_unusable_entries() {
        let json = r#"{"entries": [null, {"title": "deleted"}, {"url": "https://x/1"}]}"#;
        let urls = YtDlpEnumerator::parse_listing(json).unwrap();
        assert_eq!(urls, vec!["https://x/1"]);
    }

    #[test]
    fn test_parse_empty_playlist() {
        let urls = YtDlpEnumerator::parse_listing(r#"{"entries": []}"#).unwrap();
        assert!(urls.is_empty());
    }

    #[test]
    fn test_parse_single_video() {
        let json = r#"{"id": "zzz", "webpage_url": "https://www.youtube.com/watch?v=zzz"}"#;
        let urls = YtDlpEnumerator::parse_listing(json).unwrap();
        assert_eq!(urls, vec!["https://www.youtube.com/watch?v=zzz"]);
    }

    #[test]
    fn test_parse_invalid_json() {
        let result = YtDlpEnumerator::parse_listing("not json");
        assert!(matches!(result, Err(EnumerationError::ParseError { .. })));

        let result = YtDlpEnumerator::parse_listing("{}");
        assert!(matches!(result, Err(EnumerationError::ParseError { .. })));
    }

    #[tokio::test]
    async fn test_missing_binary() {
        let enumerator =
            YtDlpEnumerator::new(YtDlpConfig::with_path(PathBuf::from("/nonexistent/yt-dlp")));
        let result = enumerator.list_items("https://example.com/playlist").await;
        assert!(matches!(result, Err(EnumerationError::ToolNotFound { .. })));
    }
}
