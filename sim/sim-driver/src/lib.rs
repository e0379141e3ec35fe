//! Drivers producing throttle, steering and braking each tick.
//!
//! This crate provides:
//!
//! - [`Driver`] - Trait the simulation loop drives
//! - [`SineSteerDriver`] - Open-loop delayed throttle ramp and sine steer
//! - [`PathFollowerDriver`] - PID steering onto a [`Path`] with PID speed hold
//! - [`PlaybackDriver`] - Interpolated replay of recorded inputs
//! - [`InputRecorder`] - Writes applied inputs in the playback format
//! - [`PidController`] - Clamped PID with anti-windup
//!
//! # Tick Contract
//!
//! ```text
//! driver.synchronize(time, &vehicle_state);
//! let inputs = driver.inputs();   // same snapshot goes to every module
//! driver.advance(step_size);
//! ```
//!
//! # Example
//!
//! ```
//! use sim_driver::{Driver, SineSteerDriver};
//! use sim_types::VehicleState;
//!
//! let mut driver = SineSteerDriver::new(0.5);
//! driver.synchronize(0.6, &VehicleState::default());
//! assert!((driver.inputs().throttle - 0.35).abs() < 1e-12);
//! ```

#![deny(clippy::unwrap_used, clippy::expect_used)]
#![warn(missing_docs)]
#![allow(
    clippy::missing_const_for_fn,
    clippy::suboptimal_flops,
    clippy::missing_errors_doc,
    clippy::module_name_repetitions,
)]

mod error;
mod path;
mod path_follower;
mod pid;
mod playback;
mod sine_steer;

use sim_types::{DriverInputs, VehicleState};

pub use error::{DriverError, Result};
pub use path::{Path, PathProjection, StraightLinePath};
pub use path_follower::{PathFollowerDriver, PathFollowerParams};
pub use pid::{PidController, PidGains};
pub use playback::{DriverSample, INPUTS_FILE_NAME, InputRecorder, PlaybackDriver};
pub use sine_steer::SineSteerDriver;

/// Source of driver inputs.
pub trait Driver {
    /// Reset internal state before a run.
    fn initialize(&mut self);

    /// Compute inputs for simulation time `time`.
    fn synchronize(&mut self, time: f64, state: &VehicleState);

    /// Inputs computed at the last synchronize.
    fn inputs(&self) -> DriverInputs;

    /// Advance internal state by `dt`.
    fn advance(&mut self, dt: f64);
}

impl<D: Driver + ?Sized> Driver for Box<D> {
    fn initialize(&mut self) {
        (**self).initialize();
    }

    fn synchronize(&mut self, time: f64, state: &VehicleState) {
        (**self).synchronize(time, state);
    }

    fn inputs(&self) -> DriverInputs {
        (**self).inputs()
    }

    fn advance(&mut self, dt: f64) {
        (**self).advance(dt);
    }
}
