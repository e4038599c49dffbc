//! Error types for Gambit

use thiserror::Error;

/// Main error type for Gambit
#[derive(Error, Debug)]
pub enum GambitError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Unsupported file type: {0}")]
    UnsupportedFileType(String),

    #[error("File too large: {size} bytes exceeds limit of {limit} bytes")]
    FileTooLarge { size: u64, limit: u64 },

    /// Failure reported by the storage or data backend, passed through verbatim
    #[error("Backend error{}: {message}", .status.map(|s| format!(" ({})", s)).unwrap_or_default())]
    Backend { status: Option<u16>, message: String },

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Timed out: {0}")]
    Timeout(String),

    #[error("Configuration file not found in {0}")]
    ConfigNotFound(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

impl GambitError {
    /// Backend failure without an HTTP status
    pub fn backend(message: impl Into<String>) -> Self {
        GambitError::Backend {
            status: None,
            message: message.into(),
        }
    }

    /// Whether the error was raised before contacting any backend
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            GambitError::Validation(_)
                | GambitError::UnsupportedFileType(_)
                | GambitError::FileTooLarge { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, GambitError>;
