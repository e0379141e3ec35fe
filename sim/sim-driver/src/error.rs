//! Error types for driver construction and driver data files.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while building a driver or reading/writing its data.
#[derive(Debug, Error)]
pub enum DriverError {
    /// Controller parameters are out of range.
    #[error("invalid driver parameters: {0}")]
    InvalidParameters(String),

    /// A path cannot be followed.
    #[error("invalid path: {0}")]
    InvalidPath(String),

    /// A driver data file could not be read or written.
    #[error("failed to access driver data file {path}: {source}")]
    Io {
        /// Path of the file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A row of a driver data file is malformed.
    #[error("{path}:{line}: {reason}")]
    Parse {
        /// Path of the file.
        path: PathBuf,
        /// One-based line number.
        line: usize,
        /// What is wrong with the row.
        reason: String,
    },

    /// Playback data contains no samples.
    #[error("driver data {0} has no samples")]
    Empty(PathBuf),
}

impl DriverError {
    /// Create an invalid parameters error.
    pub fn invalid_parameters(msg: impl Into<String>) -> Self {
        Self::InvalidParameters(msg.into())
    }

    /// Create an invalid path error.
    pub fn invalid_path(msg: impl Into<String>) -> Self {
        Self::InvalidPath(msg.into())
    }

    /// Wrap an I/O error with the file it concerns.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result type for driver operations.
pub type Result<T> = std::result::Result<T, DriverError>;
