mod cli;
mod summary;

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use playlist_dl_core::{
    load_config, load_config_from_env, validate_config, BatchConfig, BatchOrchestrator,
    Enumerator, ItemProcessor, SourceRun, TracingReporter, YtDlpEnumerator, YtDlpProcessor,
};

use cli::Cli;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    // Load configuration
    let mut config = match &cli.config {
        Some(path) => {
            info!("Loading configuration from {:?}", path);
            load_config(path).with_context(|| format!("Failed to load config from {:?}", path))?
        }
        None => load_config_from_env().context("Failed to load configuration")?,
    };
    cli.apply(&mut config);

    validate_config(&config).context("Configuration validation failed")?;

    let batch_config = config.batch.to_batch_config();
    info!(
        "Format: {}, destination: {:?}, worker ceiling: {}",
        batch_config.format, batch_config.destination, batch_config.max_workers
    );

    let processor = YtDlpProcessor::new(config.ytdlp.clone());
    match processor.validate().await {
        Ok(version) => info!("Using yt-dlp {}", version),
        Err(e) => warn!("yt-dlp check failed, downloads will likely fail: {}", e),
    }

    let enumerator = YtDlpEnumerator::new(config.ytdlp.clone());
    let orchestrator = BatchOrchestrator::new(processor).with_reporter(Arc::new(TracingReporter));

    let report = download(&enumerator, &orchestrator, &cli.source, batch_config).await?;
    print!("{}", report);

    Ok(())
}

/// Enumerates `source`, runs its batch and renders the report to print.
async fn download<E, P>(
    enumerator: &E,
    orchestrator: &BatchOrchestrator<P>,
    source: &str,
    config: BatchConfig,
) -> Result<String>
where
    E: Enumerator + ?Sized,
    P: ItemProcessor + 'static,
{
    let run = orchestrator
        .run_source(enumerator, source, config)
        .await
        .with_context(|| format!("Failed to process {}", source))?;

    Ok(match run {
        SourceRun::NoItems => format!("0 items found in {}\n", source),
        SourceRun::Completed(result) => summary::render(&result),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use playlist_dl_core::testing::{MockEnumerator, MockProcessor};
    use playlist_dl_core::{EnumerationError, OutputFormat};
    use tempfile::TempDir;

    fn config(dir: &TempDir) -> BatchConfig {
        BatchConfig::new(OutputFormat::Mp3, dir.path()).with_max_workers(4)
    }

    #[tokio::test]
    async fn test_download_reports_empty_source() {
        let dir = TempDir::new().unwrap();
        let processor = MockProcessor::new();
        let orchestrator = BatchOrchestrator::new(processor.clone());

        let report = download(&MockEnumerator::new(), &orchestrator, "pl", config(&dir))
            .await
            .unwrap();

        assert_eq!(report, "0 items found in pl\n");
        assert_eq!(processor.call_count().await, 0);
    }

    #[tokio::test]
    async fn test_download_renders_summary_with_failures() {
        let dir = TempDir::new().unwrap();
        let processor = MockProcessor::new();
        processor.set_failing_indices([1]).await;
        let orchestrator = BatchOrchestrator::new(processor);
        let enumerator = MockEnumerator::with_items(["https://x/1", "https://x/2", "https://x/3"]);

        let report = download(&enumerator, &orchestrator, "pl", config(&dir))
            .await
            .unwrap();

        assert!(report.contains("Succeeded: 2"));
        assert!(report.contains("Failed:    1"));
        assert!(report.contains("#2 https://x/2: Processing failed: mock failure on item 1"));
    }

    #[tokio::test]
    async fn test_download_fails_on_enumeration_error() {
        let dir = TempDir::new().unwrap();
        let enumerator = MockEnumerator::with_items(["https://x/1"]);
        enumerator
            .set_next_error(EnumerationError::failed("playlist is private", None))
            .await;
        let processor = MockProcessor::new();
        let orchestrator = BatchOrchestrator::new(processor.clone());

        let err = download(&enumerator, &orchestrator, "pl", config(&dir))
            .await
            .unwrap_err();

        assert!(format!("{:#}", err).contains("Failed to process pl"));
        assert_eq!(processor.call_count().await, 0);
    }
}
