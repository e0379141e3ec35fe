//! Visual systems for the vehicle-on-soil simulation loop.
//!
//! This crate provides:
//!
//! - [`VisualSystem`] - Trait the loop drives (scene calls, capture, stepping)
//! - [`Backend`] / [`negotiate`] - Pick a compiled-in backend, falling back with a warning
//! - [`RasterVisual`] - Software top-down chase view with false-colour sinkage (feature `raster`)
//! - [`HeadlessVisual`] - No pixels, same loop behaviour
//! - [`Scene`] - Borrowed vehicle state and terrain for one render call
//!
//! # Design Philosophy
//!
//! A visual system is a *window into* the simulation: it reads the scene it
//! is handed and never feeds anything back into the physics. The only signal
//! it sends the loop is [`VisualSystem::run`].
//!
//! # Example
//!
//! ```
//! use sim_vis::{Backend, VisConfig, create};
//!
//! let config = VisConfig {
//!     backend: Backend::Headless,
//!     end_time: Some(1.0),
//!     ..VisConfig::default()
//! };
//! let (negotiated, vis) = create(&config).unwrap();
//! assert_eq!(negotiated.chosen, Backend::Headless);
//! assert!(vis.run());
//! ```

#![deny(clippy::unwrap_used, clippy::expect_used)]
#![warn(missing_docs)]
#![allow(
    clippy::missing_const_for_fn,
    clippy::suboptimal_flops,
    clippy::missing_errors_doc,
    clippy::module_name_repetitions,
)]

mod backend;
mod camera;
mod error;
mod headless;
#[cfg(feature = "raster")]
mod raster;
mod scene;

use std::path::Path;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use sim_types::DriverInputs;

pub use backend::{Backend, Capabilities, Negotiated, negotiate};
pub use camera::{ChaseCamera, Viewport};
pub use error::{Result, VisError};
pub use headless::HeadlessVisual;
#[cfg(feature = "raster")]
pub use raster::RasterVisual;
pub use scene::Scene;

/// Slack on the end-time comparison so accumulated steps land on it.
const END_TIME_TOLERANCE: f64 = 1e-9;

/// Renderer driven by the simulation loop.
pub trait VisualSystem {
    /// Backend behind this system.
    fn backend(&self) -> Backend;

    /// What this system can do.
    fn capabilities(&self) -> Capabilities;

    /// Reset before a run.
    fn initialize(&mut self);

    /// Whether the loop should keep going.
    fn run(&self) -> bool;

    /// Start a frame.
    fn begin_scene(&mut self);

    /// Draw the scene into the current frame.
    fn render(&mut self, scene: &Scene<'_>);

    /// Finish the frame.
    fn end_scene(&mut self);

    /// Save the last frame to `path`.
    fn write_image(&mut self, path: &Path) -> Result<()>;

    /// Bring the system to `time` with the tick's driver inputs.
    fn synchronize(&mut self, time: f64, inputs: &DriverInputs);

    /// Advance by `dt`.
    fn advance(&mut self, dt: f64);
}

impl<S: VisualSystem + ?Sized> VisualSystem for Box<S> {
    fn backend(&self) -> Backend {
        (**self).backend()
    }

    fn capabilities(&self) -> Capabilities {
        (**self).capabilities()
    }

    fn initialize(&mut self) {
        (**self).initialize();
    }

    fn run(&self) -> bool {
        (**self).run()
    }

    fn begin_scene(&mut self) {
        (**self).begin_scene();
    }

    fn render(&mut self, scene: &Scene<'_>) {
        (**self).render(scene);
    }

    fn end_scene(&mut self) {
        (**self).end_scene();
    }

    fn write_image(&mut self, path: &Path) -> Result<()> {
        (**self).write_image(path)
    }

    fn synchronize(&mut self, time: f64, inputs: &DriverInputs) {
        (**self).synchronize(time, inputs);
    }

    fn advance(&mut self, dt: f64) {
        (**self).advance(dt);
    }
}

/// `run()` for systems that stop at an optional end time.
pub(crate) fn keep_running(time: f64, end_time: Option<f64>) -> bool {
    end_time.is_none_or(|end| time + END_TIME_TOLERANCE < end)
}

/// Visual system settings.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct VisConfig {
    /// Requested backend.
    pub backend: Backend,
    /// Frame width (pixels).
    pub width: u32,
    /// Frame height (pixels).
    pub height: u32,
    /// Chase camera.
    pub camera: ChaseCamera,
    /// Stop the run at this time (None runs until the loop is stopped).
    pub end_time: Option<f64>,
}

impl Default for VisConfig {
    fn default() -> Self {
        Self {
            backend: Backend::default(),
            width: 640,
            height: 480,
            camera: ChaseCamera::default(),
            end_time: None,
        }
    }
}

impl VisConfig {
    /// Set the end time.
    #[must_use]
    pub fn with_end_time(mut self, end_time: f64) -> Self {
        self.end_time = Some(end_time);
        self
    }

    /// Set the frame size.
    #[must_use]
    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Validate the settings.
    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(VisError::invalid_config(format!(
                "image size must be non-zero, got {}x{}",
                self.width, self.height
            )));
        }
        if let Some(end) = self.end_time {
            if !end.is_finite() || end < 0.0 {
                return Err(VisError::invalid_config(
                    "end_time must be non-negative and finite",
                ));
            }
        }
        Ok(())
    }
}

/// Negotiate a backend and build its visual system.
pub fn create(config: &VisConfig) -> Result<(Negotiated, Box<dyn VisualSystem>)> {
    config.validate()?;
    let negotiated = negotiate(config.backend);
    let vis: Box<dyn VisualSystem> = match negotiated.chosen {
        #[cfg(feature = "raster")]
        Backend::Raster => Box::new(RasterVisual::new(
            config.width,
            config.height,
            config.camera,
            config.end_time,
        )?),
        _ => Box::new(HeadlessVisual::new(config.end_time)),
    };
    Ok((negotiated, vis))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]
mod tests {
    use super::*;

    #[test]
    fn test_keep_running() {
        assert!(keep_running(5.0, None));
        assert!(!keep_running(0.0, Some(0.0)));
        assert!(keep_running(0.999, Some(1.0)));
        assert!(!keep_running(1.0 - 1e-12, Some(1.0)));
    }

    #[test]
    fn test_create_respects_choice() {
        let (negotiated, vis) = create(&VisConfig {
            backend: Backend::Headless,
            ..VisConfig::default()
        })
        .unwrap();
        assert_eq!(vis.backend(), negotiated.chosen);
        assert_eq!(vis.capabilities(), negotiated.capabilities);
    }

    #[test]
    fn test_config_validation() {
        assert!(VisConfig::default().validate().is_ok());
        assert!(VisConfig::default().with_size(0, 10).validate().is_err());
        assert!(VisConfig::default().with_end_time(-1.0).validate().is_err());
    }
}
