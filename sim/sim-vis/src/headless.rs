//! Visual system that renders nothing.

use std::path::Path;

use sim_types::DriverInputs;
use tracing::debug;

use crate::backend::{Backend, Capabilities};
use crate::error::{Result, VisError};
use crate::scene::Scene;
use crate::{VisualSystem, keep_running};

/// Visual system without a framebuffer.
///
/// Keeps time and counts frames so the loop behaves the same as with a real
/// renderer; image capture is unsupported.
#[derive(Debug, Clone, Default)]
pub struct HeadlessVisual {
    end_time: Option<f64>,
    time: f64,
    inputs: DriverInputs,
    frames: u64,
    in_scene: bool,
}

impl HeadlessVisual {
    /// Headless system stopping at `end_time` (or never).
    #[must_use]
    pub fn new(end_time: Option<f64>) -> Self {
        Self {
            end_time,
            ..Self::default()
        }
    }

    /// Completed `begin_scene`/`end_scene` pairs.
    #[must_use]
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Visual time.
    #[must_use]
    pub fn time(&self) -> f64 {
        self.time
    }

    /// Inputs received at the last synchronize.
    #[must_use]
    pub fn inputs(&self) -> DriverInputs {
        self.inputs
    }
}

impl VisualSystem for HeadlessVisual {
    fn backend(&self) -> Backend {
        Backend::Headless
    }

    fn capabilities(&self) -> Capabilities {
        Backend::Headless.capabilities()
    }

    fn initialize(&mut self) {
        self.time = 0.0;
        self.frames = 0;
        self.in_scene = false;
        debug!(end_time = ?self.end_time, "headless visual system initialized");
    }

    fn run(&self) -> bool {
        keep_running(self.time, self.end_time)
    }

    fn begin_scene(&mut self) {
        self.in_scene = true;
    }

    fn render(&mut self, _scene: &Scene<'_>) {}

    fn end_scene(&mut self) {
        if self.in_scene {
            self.frames += 1;
            self.in_scene = false;
        }
    }

    fn write_image(&mut self, _path: &Path) -> Result<()> {
        Err(VisError::Unsupported {
            backend: Backend::Headless,
            operation: "image capture",
        })
    }

    fn synchronize(&mut self, time: f64, inputs: &DriverInputs) {
        self.time = time;
        self.inputs = *inputs;
    }

    fn advance(&mut self, dt: f64) {
        if dt.is_finite() && dt > 0.0 {
            self.time += dt;
        }
    }
}
