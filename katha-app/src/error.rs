//! Application error type.

use crate::config::ConfigError;

/// Result type for application operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Errors raised outside the story core.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Startup configuration is missing or invalid.
    #[error("configuration error: {0}")]
    Config(String),

    /// The story core or one of its backends failed.
    #[error(transparent)]
    Katha(#[from] katha::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The web server could not start or stopped unexpectedly.
    #[error("server error: {0}")]
    Server(String),
}

impl AppError {
    /// Create a configuration error.
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a server error.
    #[must_use]
    pub fn server(message: impl Into<String>) -> Self {
        Self::Server(message.into())
    }
}

impl From<ConfigError> for AppError {
    fn from(err: ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<katha::LlmError> for AppError {
    fn from(err: katha::LlmError) -> Self {
        Self::Katha(err.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_errors_read_plainly() {
        let err = AppError::config("no API key for the hosted backend");
        assert_eq!(
            err.to_string(),
            "configuration error: no API key for the hosted backend"
        );
    }

    #[test]
    fn katha_errors_are_transparent() {
        let err = AppError::from(katha::Error::NoStory);
        assert_eq!(err.to_string(), katha::Error::NoStory.to_string());
    }
}
