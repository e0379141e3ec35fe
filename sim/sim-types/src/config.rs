//! Step cadence configuration.
//!
//! Controls how fast simulated time advances per tick and how often the
//! render loop captures a frame.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Relative slack used when converting a render interval into a step count,
/// so that exact multiples do not round up because of float noise.
const RENDER_STEPS_TOLERANCE: f64 = 1e-9;

/// Fixed-step timing for a simulation run.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct StepConfig {
    /// Integration step size (seconds).
    pub step_size: f64,
    /// Time interval between two render frames (1/FPS).
    pub render_step_size: f64,
    /// Simulation end time (None to run until the visual system stops).
    pub end_time: Option<f64>,
}

impl Default for StepConfig {
    fn default() -> Self {
        Self {
            step_size: 3e-3,
            render_step_size: 1.0 / 100.0,
            end_time: None,
        }
    }
}

impl StepConfig {
    /// Create a step config with the given step size and default render rate.
    #[must_use]
    pub fn with_step_size(step_size: f64) -> Self {
        Self {
            step_size,
            ..Default::default()
        }
    }

    /// Set the render interval.
    #[must_use]
    pub fn render_step_size(mut self, render_step_size: f64) -> Self {
        self.render_step_size = render_step_size;
        self
    }

    /// Set the end time.
    #[must_use]
    pub fn end_time(mut self, end_time: f64) -> Self {
        self.end_time = Some(end_time);
        self
    }

    /// Validate the configuration.
    pub fn validate(&self) -> crate::Result<()> {
        if !self.step_size.is_finite() || self.step_size <= 0.0 {
            return Err(crate::SimError::InvalidTimestep(self.step_size));
        }

        if self.step_size > 1.0 {
            return Err(crate::SimError::invalid_config(
                "step_size > 1 second is likely an error",
            ));
        }

        if !self.render_step_size.is_finite() || self.render_step_size <= 0.0 {
            return Err(crate::SimError::invalid_config(
                "render_step_size must be positive and finite",
            ));
        }

        if let Some(end) = self.end_time {
            if !end.is_finite() || end < 0.0 {
                return Err(crate::SimError::invalid_config(
                    "end_time must be non-negative and finite",
                ));
            }
        }

        Ok(())
    }

    /// Number of simulation steps between two render frames.
    ///
    /// `ceil(render_step_size / step_size)`, never less than 1.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn render_steps(&self) -> u64 {
        let ratio = self.render_step_size / self.step_size;
        if !ratio.is_finite() || ratio <= 1.0 {
            return 1;
        }
        (ratio - RENDER_STEPS_TOLERANCE).ceil().max(1.0) as u64
    }

    /// Get the step frequency in Hz.
    #[must_use]
    pub fn frequency(&self) -> f64 {
        1.0 / self.step_size
    }
}
