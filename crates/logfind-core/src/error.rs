//! Error types for the retrieval engine.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while locating a log line.
#[derive(Debug, Error)]
pub enum LogError {
    /// A line does not start with a canonical timestamp.
    #[error("invalid log format: {0}")]
    InvalidFormat(String),

    /// No file covers the timestamp, or no line matches it exactly.
    #[error("log entry not found")]
    NotFound,

    /// Listing the directory or opening/mapping a file failed.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        /// Path the operation was acting on.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// Any other unexpected fault.
    #[error("internal error: {0}")]
    Internal(String),

    /// The engine has been shut down.
    #[error("log engine is closed")]
    Closed,

    /// Configuration rejected at construction time.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Coarse classification of [`LogError`] used by transports to pick a status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Timestamp prefix missing or unparsable.
    InvalidFormat,
    /// Nothing matches the requested instant.
    NotFound,
    /// Filesystem failure.
    Io,
    /// Everything else.
    Internal,
}

impl LogError {
    /// Builds an [`LogError::Io`] for `path`.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Returns the coarse kind of this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidFormat(_) => ErrorKind::InvalidFormat,
            Self::NotFound => ErrorKind::NotFound,
            Self::Io { .. } => ErrorKind::Io,
            Self::Internal(_) | Self::Closed | Self::InvalidConfig(_) => ErrorKind::Internal,
        }
    }

    /// Returns true if this error means "no such line".
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound)
    }
}

/// Result type alias for engine operations.
pub type Result<T> = std::result::Result<T, LogError>;
