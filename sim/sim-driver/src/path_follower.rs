//! Closed-loop path following with PID steering and speed control.

use nalgebra::{Point3, Vector3};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use sim_types::{DriverInputs, VehicleState};

use crate::Driver;
use crate::error::{DriverError, Result};
use crate::path::Path;
use crate::pid::{PidController, PidGains};

/// Tuning of a [`PathFollowerDriver`].
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct PathFollowerParams {
    /// Distance of the sentinel point ahead of the chassis (m).
    pub look_ahead: f64,
    /// Steering gains on the sentinel's lateral error.
    pub steering_gains: PidGains,
    /// Speed gains on the speed error.
    pub speed_gains: PidGains,
    /// Speed to hold (m/s).
    pub target_speed: f64,
}

impl Default for PathFollowerParams {
    fn default() -> Self {
        Self {
            look_ahead: 5.0,
            steering_gains: PidGains::new(0.5, 0.0, 0.0),
            speed_gains: PidGains::new(0.4, 0.0, 0.0),
            target_speed: 5.0,
        }
    }
}

impl PathFollowerParams {
    /// Validate the tuning.
    pub fn validate(&self) -> Result<()> {
        if !(self.look_ahead.is_finite() && self.look_ahead > 0.0) {
            return Err(DriverError::invalid_parameters(format!(
                "look-ahead must be positive, got {}",
                self.look_ahead
            )));
        }
        if !self.target_speed.is_finite() {
            return Err(DriverError::invalid_parameters("target speed must be finite"));
        }
        if !(self.steering_gains.is_finite() && self.speed_gains.is_finite()) {
            return Err(DriverError::invalid_parameters("controller gains must be finite"));
        }
        Ok(())
    }
}

/// Driver that steers a sentinel point onto a path and holds a speed.
///
/// Each synchronize places the sentinel `look_ahead` metres ahead of the
/// chassis, finds its closest point on the path (the target) and feeds the
/// signed sentinel-to-target distance to the steering controller. The speed
/// controller output is split into throttle (positive) and braking
/// (negative).
#[derive(Debug, Clone)]
pub struct PathFollowerDriver {
    path: Path,
    params: PathFollowerParams,
    steering: PidController,
    speed: PidController,
    sentinel: Point3<f64>,
    target: Point3<f64>,
    last_time: Option<f64>,
    inputs: DriverInputs,
}

impl PathFollowerDriver {
    /// Create a path follower.
    pub fn new(path: Path, params: PathFollowerParams) -> Result<Self> {
        params.validate()?;
        let start = path.points()[0];
        Ok(Self {
            steering: PidController::new(params.steering_gains),
            speed: PidController::new(params.speed_gains),
            path,
            params,
            sentinel: start,
            target: start,
            last_time: None,
            inputs: DriverInputs::ZERO,
        })
    }

    /// Path being followed.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Tuning.
    #[must_use]
    pub fn params(&self) -> &PathFollowerParams {
        &self.params
    }

    /// Look-ahead point at the last synchronize.
    #[must_use]
    pub fn sentinel(&self) -> Point3<f64> {
        self.sentinel
    }

    /// Closest path point to the sentinel at the last synchronize.
    #[must_use]
    pub fn target(&self) -> Point3<f64> {
        self.target
    }
}

impl Driver for PathFollowerDriver {
    fn initialize(&mut self) {
        self.steering.reset();
        self.speed.reset();
        self.last_time = None;
        self.inputs = DriverInputs::ZERO;
    }

    fn synchronize(&mut self, time: f64, state: &VehicleState) {
        let dt = self.last_time.map_or(0.0, |last| time - last);
        self.last_time = Some(time);

        let heading = state.forward();
        let heading = Vector3::new(heading.x, heading.y, 0.0)
            .try_normalize(1e-9)
            .unwrap_or_else(Vector3::x);
        let position = state.position();
        self.sentinel = position + heading * self.params.look_ahead;
        self.target = self.path.project(&self.sentinel).point;

        // Positive when the target lies left of the vehicle-to-sentinel line
        let to_sentinel = self.sentinel - position;
        let to_target = self.target - position;
        let side = to_sentinel.x * to_target.y - to_sentinel.y * to_target.x;
        let miss = Vector3::new(
            self.target.x - self.sentinel.x,
            self.target.y - self.sentinel.y,
            0.0,
        )
        .norm();
        let lateral_error = if side >= 0.0 { miss } else { -miss };

        let steering = self.steering.update(lateral_error, dt);
        let effort = self.speed.update(self.params.target_speed - state.speed(), dt);
        self.inputs = DriverInputs::new(effort.max(0.0), steering, (-effort).max(0.0));
    }

    fn inputs(&self) -> DriverInputs {
        self.inputs
    }

    fn advance(&mut self, _dt: f64) {}
}
