//! Error types for the liftlog_core library.

use std::io;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// A rejected set shorthand. The message is shown to the user as-is.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct ParseError {
    message: String,
}

impl ParseError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Core error type for liftlog_core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// IO error occurred
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// TOML parsing error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Configuration validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Malformed set shorthand; nothing from the input was applied
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// Referenced exercise/workout/set/record is missing or belongs to someone else
    #[error("Not found: {0}")]
    NotFound(String),

    /// Uniqueness violation (e.g. duplicate exercise name)
    #[error("Already exists: {0}")]
    AlreadyExists(String),

    /// Rejected input outside the shorthand grammar
    #[error("Invalid input: {0}")]
    Invalid(String),

    /// Storage or transaction failure
    #[error("Storage error: {0}")]
    Storage(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}
