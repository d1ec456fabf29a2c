//! Configuration management for katha.
//!
//! Settings are layered:
//! 1. Default values
//! 2. Config file (`~/.katha/config.toml`, or `--config` / `KATHA_CONFIG`)
//! 3. Environment variables

mod schema;

pub use schema::{
    Backend, ConfigIssue, IssueLevel, KathaConfig, LlmSettings, ServerSettings, SpeechBackend,
    SpeechSettings,
};

use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Error type for configuration operations.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),
    /// TOML serialization error.
    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
    /// The target file exists and overwriting was not requested.
    #[error("config file already exists: {0}")]
    AlreadyExists(PathBuf),
}

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Get the default config directory path.
#[must_use]
pub fn default_config_dir() -> PathBuf {
    dirs_next::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".katha")
}

/// Get the default config file path.
#[must_use]
pub fn config_path() -> PathBuf {
    default_config_dir().join("config.toml")
}

/// The explicit path if given, the default path otherwise.
#[must_use]
pub fn resolve_path(explicit: Option<PathBuf>) -> PathBuf {
    explicit.unwrap_or_else(config_path)
}

/// Load the file at `path` (defaults if it does not exist) and apply the
/// process environment on top.
///
/// # Errors
///
/// Fails if the file exists but cannot be read or parsed.
pub async fn load(path: &Path) -> ConfigResult<KathaConfig> {
    Ok(load_config_from(path).await?.with_env())
}

/// Load configuration from a specific path, without environment overrides.
///
/// # Errors
///
/// Fails if the file exists but cannot be read or parsed.
pub async fn load_config_from(path: &Path) -> ConfigResult<KathaConfig> {
    if !path.exists() {
        info!(path = %path.display(), "config file not found, using defaults");
        return Ok(KathaConfig::default());
    }

    let content = tokio::fs::read_to_string(path).await?;
    let config: KathaConfig = toml::from_str(&content)?;
    debug!(path = %path.display(), "loaded config file");

    Ok(config)
}

/// Save configuration to a specific path, creating parent directories.
///
/// # Errors
///
/// Fails if the directory or file cannot be written.
pub async fn save_config_to(config: &KathaConfig, path: &Path) -> ConfigResult<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    let content = toml::to_string_pretty(config)?;
    tokio::fs::write(path, content).await?;
    info!(path = %path.display(), "saved config file");

    Ok(())
}

/// Write a default configuration file at `path`.
///
/// # Errors
///
/// Returns [`ConfigError::AlreadyExists`] if the file exists and `force` is
/// false, or an I/O error if it cannot be written.
pub async fn init_config(path: &Path, force: bool) -> ConfigResult<KathaConfig> {
    if path.exists() && !force {
        return Err(ConfigError::AlreadyExists(path.to_path_buf()));
    }

    let config = KathaConfig::default();
    save_config_to(&config, path).await?;
    Ok(config)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn scratch(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("katha-config-{}-{name}", std::process::id()))
            .join("config.toml")
    }

    #[test]
    fn default_paths() {
        assert!(default_config_dir().ends_with(".katha"));
        assert!(config_path().ends_with("config.toml"));
    }

    #[test]
    fn explicit_path_wins() {
        let explicit = PathBuf::from("/tmp/elsewhere.toml");
        assert_eq!(resolve_path(Some(explicit.clone())), explicit);
        assert_eq!(resolve_path(None), config_path());
    }

    #[tokio::test]
    async fn missing_file_gives_defaults() {
        let config = load_config_from(&scratch("missing")).await.unwrap();
        assert_eq!(config.llm.max_output_tokens, 1500);
    }

    #[tokio::test]
    async fn init_then_load() {
        let path = scratch("init");
        let _ = tokio::fs::remove_file(&path).await;

        init_config(&path, false).await.unwrap();
        assert!(matches!(
            init_config(&path, false).await,
            Err(ConfigError::AlreadyExists(_))
        ));
        init_config(&path, true).await.unwrap();

        let loaded = load_config_from(&path).await.unwrap();
        assert_eq!(loaded.server.addr, "127.0.0.1:8501");

        let _ = tokio::fs::remove_dir_all(path.parent().unwrap()).await;
    }

    #[tokio::test]
    async fn broken_file_is_parse_error() {
        let path = scratch("broken");
        tokio::fs::create_dir_all(path.parent().unwrap()).await.unwrap();
        tokio::fs::write(&path, "[llm\nbackend = ").await.unwrap();

        assert!(matches!(
            load_config_from(&path).await,
            Err(ConfigError::TomlParse(_))
        ));

        let _ = tokio::fs::remove_dir_all(path.parent().unwrap()).await;
    }
}
