//! Error types for the impact stories service
//!
//! A missing story is not an error: store lookups return `Option` and callers
//! branch on `None` directly. Everything here is a genuine failure.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Main result type used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the service
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid or missing configuration. Fatal at startup, never retried.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Storage layer errors
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Internal system errors
    #[error("Internal error: {0}")]
    Internal(String),

    /// Prometheus metrics errors
    #[error("Metrics error: {0}")]
    Metrics(#[from] prometheus::Error),
}

/// Storage-specific errors
#[derive(Error, Debug)]
pub enum StorageError {
    /// Reading or writing the backing file failed
    #[error("Storage unavailable at {path}: {source}")]
    Unavailable {
        /// File the operation was working on
        path: PathBuf,
        /// Underlying I/O failure
        #[source]
        source: std::io::Error,
    },

    /// Exclusive access was not granted within the configured timeout
    #[error("Timed out after {waited:?} waiting for exclusive access to {path}")]
    LockTimeout {
        /// Backing file of the store
        path: PathBuf,
        /// How long the caller waited
        waited: Duration,
    },

    /// The document could not be parsed. Only surfaced in strict mode;
    /// the lenient default treats such a document as empty.
    #[error("Malformed document at {path}: {source}")]
    MalformedDocument {
        /// Backing file of the store
        path: PathBuf,
        /// Parse failure
        #[source]
        source: serde_json::Error,
    },

    /// The in-memory document could not be encoded
    #[error("Failed to encode document: {0}")]
    Encode(#[source] serde_json::Error),

    /// No id is left above the highest one in the document
    #[error("No story id left after {highest}")]
    IdSpaceExhausted {
        /// Highest id already taken
        highest: u64,
    },

    /// The story's like counter is at its maximum
    #[error("Story {id} cannot take more likes")]
    LikeLimitReached {
        /// Story that was liked
        id: u64,
    },
}

impl Error {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an invalid input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Create an internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Whether the backing storage could not be reached (I/O failure or lock timeout)
    pub fn is_storage_unavailable(&self) -> bool {
        matches!(
            self,
            Error::Storage(StorageError::Unavailable { .. })
                | Error::Storage(StorageError::LockTimeout { .. })
        )
    }

    /// Check if this is a client error (4xx equivalent)
    pub fn is_client_error(&self) -> bool {
        matches!(self, Error::InvalidInput(_))
    }

    /// Check if this is a server error (5xx equivalent)
    pub fn is_server_error(&self) -> bool {
        !self.is_client_error()
    }
}

impl StorageError {
    pub(crate) fn unavailable(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Unavailable {
            path: path.into(),
            source,
        }
    }
}
