use thiserror::Error;

/// Top-level error type for Notegraph shared infrastructure.
#[derive(Error, Debug)]
pub enum NotegraphError {
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<config::ConfigError> for NotegraphError {
    fn from(err: config::ConfigError) -> Self {
        NotegraphError::Config(err.to_string())
    }
}
