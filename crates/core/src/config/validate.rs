use super::{types::AppConfig, ConfigError};

/// Validate configuration
/// Currently validates:
/// - At least one worker
/// - Non-empty destination and yt-dlp path
/// - Non-zero timeouts
pub fn validate_config(config: &AppConfig) -> Result<(), ConfigError> {
    if config.batch.max_workers == 0 {
        return Err(ConfigError::ValidationError(
            "batch.max_workers must be at least 1".to_string(),
        ));
    }

    if config.batch.destination.as_os_str().is_empty() {
        return Err(ConfigError::ValidationError(
            "batch.destination cannot be empty".to_string(),
        ));
    }

    if config.ytdlp.path.as_os_str().is_empty() {
        return Err(ConfigError::ValidationError(
            "ytdlp.path cannot be empty".to_string(),
        ));
    }

    if config.ytdlp.timeout_secs == 0 || config.ytdlp.enumerate_timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "ytdlp timeouts cannot be 0".to_string(),
        ));
    }

    Ok(())
}
