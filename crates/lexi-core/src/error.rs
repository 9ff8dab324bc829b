//! Error types for the chunking pipeline.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias using LexiError.
pub type Result<T> = std::result::Result<T, LexiError>;

/// Errors that can occur while building the chunk index.
#[derive(Error, Debug)]
pub enum LexiError {
    /// Source directory missing or not a directory.
    #[error("Source directory not found: {}", path.display())]
    SourceNotFound { path: PathBuf },

    /// Failed to load or decode a source document.
    #[error("Failed to load {}: {reason}", path.display())]
    LoadFailed { path: PathBuf, reason: String },

    /// Invalid argument provided.
    #[error("Invalid argument: {message}")]
    InvalidArgument { message: String },

    /// A structural heading pattern failed to compile.
    #[error("Invalid heading pattern for {level}: {message}")]
    Pattern { level: String, message: String },

    /// Database error.
    #[error("Database error: {message}")]
    Database { message: String },

    /// Embedding error.
    #[error("Embedding error: {message}")]
    Embedding { message: String },

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration error.
    #[error("Configuration error: {message}")]
    Config { message: String },
}

impl LexiError {
    /// Create a load failure for a path.
    pub fn load_failed(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::LoadFailed {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create an invalid argument error.
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Create a database error.
    pub fn database(message: impl Into<String>) -> Self {
        Self::Database {
            message: message.into(),
        }
    }

    /// Create an embedding error.
    pub fn embedding(message: impl Into<String>) -> Self {
        Self::Embedding {
            message: message.into(),
        }
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Stable error code, used in CLI output and failure reports.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::SourceNotFound { .. } => "SOURCE_NOT_FOUND",
            Self::LoadFailed { .. } => "LOAD_FAILED",
            Self::InvalidArgument { .. } => "INVALID_ARGUMENT",
            Self::Pattern { .. } => "INVALID_PATTERN",
            Self::Database { .. } => "DATABASE_ERROR",
            Self::Embedding { .. } => "EMBEDDING_ERROR",
            Self::Io(_) => "IO_ERROR",
            Self::Serialization(_) => "SERIALIZATION_ERROR",
            Self::Config { .. } => "CONFIG_ERROR",
        }
    }

    /// Whether this error aborts a whole pipeline run rather than one file.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::LoadFailed { .. })
    }
}
