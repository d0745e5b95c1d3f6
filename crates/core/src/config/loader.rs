use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use std::path::Path;

use super::{types::AppConfig, ConfigError};

/// Prefix of environment variables overriding configuration values.
/// Nested keys are separated by a double underscore, e.g.
/// `PLAYLIST_DL_BATCH__MAX_WORKERS=4`.
pub const ENV_PREFIX: &str = "PLAYLIST_DL_";

fn base() -> Figment {
    Figment::from(Serialized::defaults(AppConfig::default()))
}

fn extract(figment: Figment) -> Result<AppConfig, ConfigError> {
    figment
        .merge(Env::prefixed(ENV_PREFIX).split("__"))
        .extract()
        .map_err(|e| ConfigError::ParseError(e.to_string()))
}

/// Load configuration from file with environment variable overrides
pub fn load_config(path: &Path) -> Result<AppConfig, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::FileNotFound(path.display().to_string()));
    }

    extract(base().merge(Toml::file(path)))
}

/// Load configuration from defaults and environment variables only
pub fn load_config_from_env() -> Result<AppConfig, ConfigError> {
    extract(base())
}

/// Load configuration from TOML string (useful for testing)
pub fn load_config_from_str(toml_str: &str) -> Result<AppConfig, ConfigError> {
    toml::from_str(toml_str).map_err(|e| ConfigError::ParseError(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::OutputFormat;
    use std::path::PathBuf;

    #[test]
    fn test_load_config_from_str_valid() {
        let toml = r#"
[batch]
max_workers = 5
"#;
        let config = load_config_from_str(toml).unwrap();
        assert_eq!(config.batch.max_workers, 5);
    }

    #[test]
    fn test_load_config_from_str_bad_type() {
        let toml = r#"
[batch]
max_workers = "many"
"#;
        let result = load_config_from_str(toml);
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_load_config_file_not_found() {
        let result = load_config(Path::new("/nonexistent/config.toml"));
        assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
    }

    #[test]
    fn test_load_config_from_file() {
        // Inside a jail so env overrides set by other tests cannot leak in.
        figment::Jail::expect_with(|jail| {
            jail.create_file(
                "config.toml",
                r#"
[batch]
format = "mp4"
destination = "/tmp/videos"

[ytdlp]
timeout_secs = 60
"#,
            )?;

            let config = load_config(Path::new("config.toml")).map_err(|e| e.to_string())?;
            assert_eq!(config.batch.format, OutputFormat::Mp4);
            assert_eq!(config.batch.destination, PathBuf::from("/tmp/videos"));
            assert_eq!(config.batch.max_workers, 20);
            assert_eq!(config.ytdlp.timeout_secs, 60);
            Ok(())
        });
    }

    #[test]
    fn test_env_overrides_file() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(
                "config.toml",
                r#"
[batch]
max_workers = 10
format = "ogg"
"#,
            )?;
            jail.set_env("PLAYLIST_DL_BATCH__MAX_WORKERS", "3");
            jail.set_env("PLAYLIST_DL_YTDLP__PATH", "/opt/yt-dlp");

            let config = load_config(Path::new("config.toml")).map_err(|e| e.to_string())?;
            assert_eq!(config.batch.max_workers, 3);
            assert_eq!(config.batch.format, OutputFormat::Ogg);
            assert_eq!(config.ytdlp.path, PathBuf::from("/opt/yt-dlp"));
            Ok(())
        });
    }

    #[test]
    fn test_load_config_from_env_defaults() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("PLAYLIST_DL_BATCH__FORMAT", "mp4");

            let config = load_config_from_env().map_err(|e| e.to_string())?;
            assert_eq!(config.batch.format, OutputFormat::Mp4);
            assert_eq!(config.batch.max_workers, 20);
            assert_eq!(config.batch.destination, PathBuf::from("downloads"));
            Ok(())
        });
    }
}
