//! Wheeled vehicle dynamics over rigid or deformable terrain.
//!
//! This crate provides:
//!
//! - [`Vehicle`] - Trait the simulation loop drives (initialize, synchronize, advance)
//! - [`WheeledVehicle`] - Rigid chassis on ray-cast spring-damper struts
//! - [`Axle`], [`Wheel`], [`Suspension`] - Running gear
//! - [`Powertrain`] - Engine, transmission, driveline and brakes
//! - [`Tire`] - Tire type and contact material
//! - [`hmmwv`] - Ready-made four-wheel utility vehicle
//!
//! # Tick Contract
//!
//! ```text
//! vehicle.synchronize(time, &inputs, &mut terrain);  // wheel forces from terrain contact
//! vehicle.advance(step_size)?;                       // integrate chassis, tick clock
//! ```
//!
//! The vehicle owns the simulation clock; [`Vehicle::time`] is the time the
//! loop reads at the top of every tick.
//!
//! # Example
//!
//! ```
//! use sim_terrain::RigidTerrain;
//! use sim_types::DriverInputs;
//! use sim_vehicle::{DriveType, Tire, Vehicle, hmmwv};
//! use nalgebra::Isometry3;
//!
//! let mut vehicle = hmmwv(Tire::default(), DriveType::Awd, 3e-3).unwrap();
//! let mut terrain = RigidTerrain::flat(0.0);
//! vehicle.initialize(Isometry3::translation(0.0, 0.0, 0.6));
//!
//! for _ in 0..100 {
//!     let time = vehicle.time();
//!     vehicle.synchronize(time, &DriverInputs::ZERO, &mut terrain);
//!     vehicle.advance(3e-3).unwrap();
//! }
//! assert!(vehicle.state().wheels.iter().all(|w| w.in_contact));
//! ```

#![deny(clippy::unwrap_used, clippy::expect_used)]
#![warn(missing_docs)]
#![allow(
    clippy::missing_const_for_fn,
    clippy::suboptimal_flops,
    clippy::missing_errors_doc,
    clippy::module_name_repetitions,
)]

mod axle;
mod chassis;
mod error;
mod hmmwv;
mod powertrain;
mod tire;
mod wheeled;

use nalgebra::Isometry3;
use sim_terrain::Terrain;
use sim_types::{DriverInputs, VehicleState};

pub use axle::{Axle, Suspension, Wheel, WheelSpec};
pub use chassis::{Chassis, ChassisState};
pub use error::{Result, VehicleError};
pub use hmmwv::{HMMWV_WHEEL_RADIUS, hmmwv};
pub use powertrain::{Brakes, DriveType, Engine, Powertrain, Steering, Transmission};
pub use tire::{Tire, TireMaterial, TireType};
pub use wheeled::{GRAVITY, WheeledVehicle, WheeledVehicleBuilder};

/// Vehicle model driven by the simulation loop.
pub trait Vehicle {
    /// Place the vehicle at rest at `pose` and reset its clock to zero.
    fn initialize(&mut self, pose: Isometry3<f64>);

    /// Current simulation time.
    fn time(&self) -> f64;

    /// Total mass (kg).
    fn mass(&self) -> f64;

    /// Snapshot of the vehicle state.
    fn state(&self) -> VehicleState;

    /// Poses of the bodies terrain patches can follow: chassis, then wheels.
    fn tracked_poses(&self) -> Vec<Isometry3<f64>>;

    /// Apply driver inputs and exchange forces with the terrain at `time`.
    fn synchronize(&mut self, time: f64, inputs: &DriverInputs, terrain: &mut dyn Terrain);

    /// Integrate the vehicle by `dt`.
    ///
    /// # Errors
    ///
    /// Returns an error if `dt` is invalid or the state diverges.
    fn advance(&mut self, dt: f64) -> sim_types::Result<()>;
}
