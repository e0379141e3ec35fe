//! Error types for terrain construction.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while building or initializing a terrain.
#[derive(Debug, Error)]
pub enum TerrainError {
    /// Grid dimensions or spacing are unusable.
    #[error("invalid grid: {0}")]
    InvalidGrid(String),

    /// Soil or surface parameters are out of range.
    #[error("invalid parameters: {0}")]
    InvalidParameters(String),

    /// The terrain was queried before `initialize`.
    #[error("terrain is not initialized")]
    NotInitialized,

    /// Height-map image could not be loaded.
    #[error("failed to load height map {path}: {source}")]
    HeightMap {
        /// Path of the image.
        path: PathBuf,
        /// Underlying decoder error.
        #[source]
        source: image::ImageError,
    },
}

impl TerrainError {
    /// Create an invalid grid error.
    pub fn invalid_grid(msg: impl Into<String>) -> Self {
        Self::InvalidGrid(msg.into())
    }

    /// Create an invalid parameters error.
    pub fn invalid_parameters(msg: impl Into<String>) -> Self {
        Self::InvalidParameters(msg.into())
    }
}

/// Result type for terrain operations.
pub type Result<T> = std::result::Result<T, TerrainError>;
