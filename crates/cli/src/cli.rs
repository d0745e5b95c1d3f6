use std::path::PathBuf;

use clap::Parser;

use playlist_dl_core::{AppConfig, OutputFormat};

/// Download every entry of a playlist in parallel.
#[derive(Debug, Parser)]
#[command(name = "playlist-dl", version)]
pub struct Cli {
    /// Playlist URL (anything yt-dlp can list)
    pub source: String,

    /// Directory receiving the downloaded files
    #[arg(short, long)]
    pub dest: Option<PathBuf>,

    /// Output format: mp3, ogg or mp4
    #[arg(short, long)]
    pub format: Option<OutputFormat>,

    /// Maximum number of parallel downloads
    #[arg(short = 'j', long)]
    pub max_workers: Option<usize>,

    /// TOML configuration file
    #[arg(short, long, env = "PLAYLIST_DL_CONFIG")]
    pub config: Option<PathBuf>,
}

impl Cli {
    /// Overrides configuration values with the flags that were given.
    pub fn apply(&self, config: &mut AppConfig) {
        if let Some(dest) = &self.dest {
            config.batch.destination = dest.clone();
        }
        if let Some(format) = self.format {
            config.batch.format = format;
        }
        if let Some(max) = self.max_workers {
            config.batch.max_workers = max;
        }
    }
}
