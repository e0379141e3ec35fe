//! Core types for the vehicle-on-soil simulation loop.
//!
//! This crate provides the data shared by every module that takes part in a
//! tick:
//!
//! - [`DriverInputs`] - Throttle, steering and braking for one tick
//! - [`SimulationClock`] - Fixed-step monotonic simulation time
//! - [`StepConfig`] - Step size, render cadence, end time
//! - [`Timer`] - Start/stop wall-clock interval timer
//! - [`VehicleState`] - Read-only snapshot of the vehicle
//!
//! # Design Philosophy
//!
//! These types are **pure data**. They have no physics and no I/O. They are
//! the common language between the vehicle model, the terrain, drivers, the
//! visual system and the loop that sequences them.
//!
//! # Coordinate System
//!
//! - X: forward (chassis), east (world)
//! - Y: left (chassis), north (world)
//! - Z: up
//! - Right-handed, SI units
//!
//! # Example
//!
//! ```
//! use sim_types::{DriverInputs, SimulationClock, StepConfig};
//!
//! let config = StepConfig::default();
//! assert_eq!(config.render_steps(), 4);
//!
//! let mut clock = SimulationClock::new(config.step_size);
//! clock.advance(config.step_size);
//! assert!(clock.time() > 0.0);
//!
//! let inputs = DriverInputs::new(0.7, 0.0, 0.0);
//! assert!(inputs.is_valid());
//! ```

#![deny(clippy::unwrap_used, clippy::expect_used)]
#![warn(missing_docs)]
#![allow(
    clippy::missing_const_for_fn,
    clippy::suboptimal_flops,
    clippy::missing_errors_doc,
)]

mod clock;
mod config;
mod error;
mod inputs;
mod state;
mod timer;

pub use clock::SimulationClock;
pub use config::StepConfig;
pub use error::SimError;
pub use inputs::DriverInputs;
pub use state::{VehicleState, WheelState};
pub use timer::Timer;

// Re-export math types for convenience
pub use nalgebra::{Isometry3, Point3, Translation3, UnitQuaternion, Vector3};

/// Result type for simulation operations.
pub type Result<T> = std::result::Result<T, SimError>;

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]
mod tests {
    use super::*;

    #[test]
    fn test_clock_follows_step_config() {
        let config = StepConfig::with_step_size(0.01).end_time(1.0);
        let mut clock = SimulationClock::new(config.step_size);
        while clock.time() < config.end_time.unwrap_or_default() - 1e-12 {
            clock.advance(config.step_size);
        }
        assert_eq!(clock.ticks(), 100);
    }
}
