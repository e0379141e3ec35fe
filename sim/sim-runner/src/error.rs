//! Error types for assembling and running a simulation.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while setting up or stepping the simulation loop.
#[derive(Debug, Error)]
pub enum RunError {
    /// The output directory could not be created.
    #[error("failed to create output directory {path}: {source}")]
    OutputDir {
        /// Directory that could not be created.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// An output file could not be written.
    #[error("failed to write {path}: {source}")]
    Io {
        /// File being written.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A configuration file could not be parsed.
    #[error("failed to parse configuration {path}: {source}")]
    ConfigFile {
        /// Configuration file.
        path: PathBuf,
        /// Underlying TOML error.
        #[source]
        source: Box<toml::de::Error>,
    },

    /// Run configuration is inconsistent.
    #[error("invalid run configuration: {0}")]
    InvalidConfig(String),

    /// Step cadence or stepping failure.
    #[error(transparent)]
    Sim(#[from] sim_types::SimError),

    /// Terrain construction failure.
    #[error(transparent)]
    Terrain(#[from] sim_terrain::TerrainError),

    /// Vehicle construction failure.
    #[error(transparent)]
    Vehicle(#[from] sim_vehicle::VehicleError),

    /// Driver construction or recording failure.
    #[error(transparent)]
    Driver(#[from] sim_driver::DriverError),

    /// Visual system failure, including frame capture.
    #[error(transparent)]
    Vis(#[from] sim_vis::VisError),
}

impl RunError {
    /// Create an invalid configuration error.
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }

    /// Wrap an I/O error with the file it concerns.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Check if this is an output-directory failure.
    #[must_use]
    pub fn is_output_dir(&self) -> bool {
        matches!(self, Self::OutputDir { .. })
    }
}

/// Result type for runner operations.
pub type Result<T> = std::result::Result<T, RunError>;
