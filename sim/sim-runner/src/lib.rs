//! Simulation loop for a wheeled vehicle on deformable soil.
//!
//! This crate ties the other modules together:
//!
//! - [`SimulationLoop`] - Per-tick render, capture, synchronize, advance sequence
//! - [`RunConfig`] - Immutable run configuration (defaults, TOML, CLI overrides)
//! - [`build_modules`] - Vehicle, terrain, driver and visual system from a config
//! - [`OutputLayout`] / [`Telemetry`] - Output directory, frames, CSV rows
//! - [`FrameCounters`] - Step and frame numbering
//!
//! # Tick
//!
//! ```text
//! time = vehicle.time()
//! timer markers
//! vis.begin_scene(); vis.render(scene); vis.end_scene()
//! every render_steps ticks: vis.write_image(IMG/img_###.jpg)
//! driver.synchronize(time, state); inputs = driver.inputs()
//! terrain.synchronize(time)
//! vehicle.synchronize(time, inputs, terrain)
//! vis.synchronize(time, inputs)
//! driver, terrain, vehicle, vis .advance(step_size)
//! ```
//!
//! The loop ends when [`VisualSystem::run`](sim_vis::VisualSystem::run)
//! returns false.
//!
//! # Example
//!
//! ```no_run
//! use sim_runner::{RunConfig, SimulationLoop, build_modules};
//!
//! let config = RunConfig::default().with_end_time(2.0);
//! let modules = build_modules(&config)?;
//! let mut sim = SimulationLoop::new(
//!     &config,
//!     modules.vehicle,
//!     modules.terrain,
//!     modules.driver,
//!     modules.vis,
//! )?;
//! let report = sim.run()?;
//! println!("{report}");
//! # Ok::<(), sim_runner::RunError>(())
//! ```

#![deny(clippy::unwrap_used, clippy::expect_used)]
#![warn(missing_docs)]
#![allow(
    clippy::missing_const_for_fn,
    clippy::suboptimal_flops,
    clippy::missing_errors_doc,
    clippy::module_name_repetitions,
)]

mod config;
mod counters;
mod error;
mod modules;
mod output;
mod simulation;
mod telemetry;

pub use config::{
    DriverConfig, OutputConfig, RunConfig, TerrainConfig, TerrainModel, TimerConfig,
    VehicleConfig, VisualOptions,
};
pub use counters::FrameCounters;
pub use error::{Result, RunError};
pub use modules::{Modules, build_modules};
pub use output::{
    IMG_DIR, OutputLayout, SUMMARY_FILE_NAME, TELEMETRY_FILE_NAME, frame_file_name,
};
pub use simulation::{LoopReport, SimulationLoop};
pub use telemetry::{TELEMETRY_HEADER, Telemetry};
