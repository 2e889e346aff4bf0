use thiserror::Error;

/// Top-level error type for the Sentient system.
///
/// Subsystem crates define their own error types and convert into this one
/// at process boundaries (startup, configuration, server bind).
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SentientError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid autonomy mode: {0}")]
    InvalidMode(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("API error: {0}")]
    Api(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Shutdown in progress")]
    ShuttingDown,
}

impl From<toml::de::Error> for SentientError {
    fn from(err: toml::de::Error) -> Self {
        SentientError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for SentientError {
    fn from(err: toml::ser::Error) -> Self {
        SentientError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for SentientError {
    fn from(err: serde_json::Error) -> Self {
        SentientError::Serialization(err.to_string())
    }
}

/// A specialized `Result` type for Sentient operations.
pub type Result<T> = std::result::Result<T, SentientError>;
