//! Delayed sine-steer manoeuvre.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use sim_types::{DriverInputs, VehicleState};

use crate::Driver;
use crate::error::{DriverError, Result};

/// Open-loop driver that ramps the throttle and then weaves.
///
/// With `t = time - delay`:
///
/// ```text
/// t < 0                 -> (0, 0, 0)
/// throttle              = throttle_slope * t     for t <= ramp_time
///                       = throttle_max           afterwards
/// steering              = 0                      for t < steer_start
///                       = A sin(2 pi (t - steer_start) / steer_period)
/// braking               = 0
/// ```
///
/// Inputs depend on time only; the vehicle state is ignored.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SineSteerDriver {
    /// Time before the manoeuvre starts (s).
    pub delay: f64,
    /// Throttle increase per second during the ramp.
    pub throttle_slope: f64,
    /// Throttle held after the ramp.
    pub throttle_max: f64,
    /// Duration of the throttle ramp (s).
    pub ramp_time: f64,
    /// Time after the delay at which steering starts (s).
    pub steer_start: f64,
    /// Steering amplitude.
    pub steer_amplitude: f64,
    /// Steering period (s).
    pub steer_period: f64,
    #[cfg_attr(feature = "serde", serde(skip))]
    inputs: DriverInputs,
}

impl Default for SineSteerDriver {
    fn default() -> Self {
        Self::new(0.5)
    }
}

impl SineSteerDriver {
    /// Driver with the standard manoeuvre starting after `delay` seconds.
    #[must_use]
    pub fn new(delay: f64) -> Self {
        Self {
            delay,
            throttle_slope: 3.5,
            throttle_max: 0.7,
            ramp_time: 0.2,
            steer_start: 2.0,
            steer_amplitude: 0.6,
            steer_period: 6.0,
            inputs: DriverInputs::ZERO,
        }
    }

    /// Set the throttle ramp.
    #[must_use]
    pub fn with_throttle_ramp(mut self, slope: f64, max: f64, ramp_time: f64) -> Self {
        self.throttle_slope = slope;
        self.throttle_max = max;
        self.ramp_time = ramp_time;
        self
    }

    /// Set the steering sine.
    #[must_use]
    pub fn with_steering(mut self, start: f64, amplitude: f64, period: f64) -> Self {
        self.steer_start = start;
        self.steer_amplitude = amplitude;
        self.steer_period = period;
        self
    }

    /// Validate the manoeuvre parameters.
    pub fn validate(&self) -> Result<()> {
        let values = [
            self.delay,
            self.throttle_slope,
            self.throttle_max,
            self.ramp_time,
            self.steer_start,
            self.steer_amplitude,
            self.steer_period,
        ];
        if values.iter().any(|v| !v.is_finite()) {
            return Err(DriverError::invalid_parameters(
                "sine-steer parameters must be finite",
            ));
        }
        if self.steer_period <= 0.0 {
            return Err(DriverError::invalid_parameters(format!(
                "steer period must be positive, got {}",
                self.steer_period
            )));
        }
        if self.ramp_time < 0.0 {
            return Err(DriverError::invalid_parameters(format!(
                "ramp time must be non-negative, got {}",
                self.ramp_time
            )));
        }
        Ok(())
    }

    /// Inputs at simulation time `time`.
    #[must_use]
    pub fn inputs_at(&self, time: f64) -> DriverInputs {
        let t = time - self.delay;
        if !t.is_finite() || t < 0.0 {
            return DriverInputs::ZERO;
        }

        let throttle = if t <= self.ramp_time {
            self.throttle_slope * t
        } else {
            self.throttle_max
        };
        let steering = if t < self.steer_start {
            0.0
        } else {
            self.steer_amplitude
                * (std::f64::consts::TAU * (t - self.steer_start) / self.steer_period).sin()
        };

        DriverInputs::new(throttle, steering, 0.0)
    }
}

impl Driver for SineSteerDriver {
    fn initialize(&mut self) {
        self.inputs = DriverInputs::ZERO;
    }

    fn synchronize(&mut self, time: f64, _state: &VehicleState) {
        self.inputs = self.inputs_at(time);
    }

    fn inputs(&self) -> DriverInputs {
        self.inputs
    }

    fn advance(&mut self, _dt: f64) {}
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_zero_before_delay() {
        let driver = SineSteerDriver::new(0.5);
        assert!(driver.inputs_at(0.0).is_zero());
        assert!(driver.inputs_at(0.499).is_zero());
        assert!(driver.inputs_at(-10.0).is_zero());
    }

    #[test]
    fn test_throttle_ramp_and_hold() {
        let driver = SineSteerDriver::new(0.5);
        assert_eq!(driver.inputs_at(0.5).throttle, 0.0);
        assert_relative_eq!(driver.inputs_at(0.6).throttle, 0.35, epsilon = 1e-12);
        assert_relative_eq!(driver.inputs_at(0.7).throttle, 0.7, epsilon = 1e-12);
        assert_eq!(driver.inputs_at(5.0).throttle, 0.7);
        assert_eq!(driver.inputs_at(5.0).braking, 0.0);
    }

    #[test]
    fn test_steering_sine() {
        let driver = SineSteerDriver::new(0.5);
        assert_eq!(driver.inputs_at(2.49).steering, 0.0);
        assert_relative_eq!(driver.inputs_at(2.5).steering, 0.0, epsilon = 1e-12);
        // Quarter period after steer start: peak left
        assert_relative_eq!(driver.inputs_at(4.0).steering, 0.6, epsilon = 1e-12);
        // Three quarters: peak right
        assert_relative_eq!(driver.inputs_at(7.0).steering, -0.6, epsilon = 1e-12);
    }

    #[test]
    fn test_non_finite_time_is_zero() {
        let driver = SineSteerDriver::default();
        assert!(driver.inputs_at(f64::NAN).is_zero());
        assert!(driver.inputs_at(f64::INFINITY).is_zero());
    }

    #[test]
    fn test_synchronize_latches_inputs() {
        let mut driver = SineSteerDriver::new(0.0);
        driver.initialize();
        driver.synchronize(1.0, &VehicleState::default());
        assert_eq!(driver.inputs().throttle, 0.7);
        driver.advance(0.003);
        // Inputs only change on synchronize
        assert_eq!(driver.inputs(), driver.inputs_at(1.0));
    }

    #[test]
    fn test_validate() {
        assert!(SineSteerDriver::default().validate().is_ok());
        let bad = SineSteerDriver::default().with_steering(2.0, 0.6, 0.0);
        assert!(bad.validate().is_err());
        let bad = SineSteerDriver::new(f64::NAN);
        assert!(bad.validate().is_err());
        let bad = SineSteerDriver::default().with_throttle_ramp(3.5, 0.7, -1.0);
        assert!(bad.validate().is_err());
    }
}
