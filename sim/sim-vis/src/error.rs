//! Error types for visual systems.

#[cfg(feature = "raster")]
use std::path::PathBuf;

use thiserror::Error;

use crate::backend::Backend;

/// Errors that can occur while creating or using a visual system.
#[derive(Debug, Error)]
pub enum VisError {
    /// The backend cannot perform the operation.
    #[error("{backend} backend does not support {operation}")]
    Unsupported {
        /// Backend asked.
        backend: Backend,
        /// Operation requested.
        operation: &'static str,
    },

    /// A backend name was not recognised.
    #[error("unknown visual backend {0:?} (expected raster or headless)")]
    UnknownBackend(String),

    /// Visual configuration is out of range.
    #[error("invalid visual configuration: {0}")]
    InvalidConfig(String),

    /// A frame could not be encoded or written.
    #[cfg(feature = "raster")]
    #[error("failed to write frame {path}: {source}")]
    Image {
        /// Target path.
        path: PathBuf,
        /// Underlying encoder error.
        #[source]
        source: image::ImageError,
    },
}

impl VisError {
    /// Create an invalid configuration error.
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }
}

/// Result type for visual system operations.
pub type Result<T> = std::result::Result<T, VisError>;
