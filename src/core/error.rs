//! Error types for the fixrisk library.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias using fixrisk's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while mining history or scoring files.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// File not found.
    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    /// Git operation error.
    #[error("Git error: {0}")]
    Git(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A window boundary that is not a `YYYY-MM-DD` date.
    #[error("Invalid date for {field}: '{value}' (expected YYYY-MM-DD)")]
    InvalidDate { field: &'static str, value: String },

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Batch file parse error.
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Remote repository error.
    #[error("Remote repository error: {0}")]
    Remote(String),

    /// Ground truth file could not be interpreted.
    #[error("Ground truth error: {0}")]
    GroundTruth(String),

    /// Analysis-specific error.
    #[error("Analysis error: {message}")]
    Analysis { message: String },
}

impl Error {
    /// Create a new analysis error.
    pub fn analysis(message: impl Into<String>) -> Self {
        Self::Analysis {
            message: message.into(),
        }
    }

    /// Create a new git error.
    pub fn git(message: impl Into<String>) -> Self {
        Self::Git(message.into())
    }

    /// Create a new config error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create an invalid date error for the named field.
    pub fn invalid_date(field: &'static str, value: impl Into<String>) -> Self {
        Self::InvalidDate {
            field,
            value: value.into(),
        }
    }

    /// True for errors raised before any repository access.
    pub fn is_config_error(&self) -> bool {
        matches!(self, Self::Config(_) | Self::InvalidDate { .. })
    }
}
