//! Error types for vehicle construction.

use thiserror::Error;

/// Errors that can occur while building a vehicle.
#[derive(Debug, Error)]
pub enum VehicleError {
    /// A component parameter is out of range.
    #[error("invalid vehicle parameters: {0}")]
    InvalidParameters(String),

    /// The vehicle has no wheels.
    #[error("vehicle has no axles")]
    NoAxles,
}

impl VehicleError {
    /// Create an invalid parameters error.
    pub fn invalid_parameters(msg: impl Into<String>) -> Self {
        Self::InvalidParameters(msg.into())
    }
}

/// Result type for vehicle construction.
pub type Result<T> = std::result::Result<T, VehicleError>;
