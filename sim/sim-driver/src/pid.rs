//! PID controller with output clamping.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Proportional, integral and derivative gains.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct PidGains {
    /// Proportional gain.
    pub kp: f64,
    /// Integral gain.
    pub ki: f64,
    /// Derivative gain.
    pub kd: f64,
}

impl PidGains {
    /// Create gains.
    #[must_use]
    pub fn new(kp: f64, ki: f64, kd: f64) -> Self {
        Self { kp, ki, kd }
    }

    /// Whether every gain is finite.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.kp.is_finite() && self.ki.is_finite() && self.kd.is_finite()
    }
}

/// Discrete PID controller.
///
/// The output is clamped to `[min, max]`. While the output is saturated the
/// integral only accumulates error that pulls the output back into range.
#[derive(Debug, Clone, PartialEq)]
pub struct PidController {
    gains: PidGains,
    min: f64,
    max: f64,
    integral: f64,
    previous_error: Option<f64>,
}

impl PidController {
    /// Controller with output limits `[-1, 1]`.
    #[must_use]
    pub fn new(gains: PidGains) -> Self {
        Self {
            gains,
            min: -1.0,
            max: 1.0,
            integral: 0.0,
            previous_error: None,
        }
    }

    /// Set the output limits.
    #[must_use]
    pub fn with_limits(mut self, min: f64, max: f64) -> Self {
        self.min = min.min(max);
        self.max = min.max(max);
        self
    }

    /// Controller gains.
    #[must_use]
    pub fn gains(&self) -> PidGains {
        self.gains
    }

    /// Accumulated error integral.
    #[must_use]
    pub fn integral(&self) -> f64 {
        self.integral
    }

    /// Forget the integral and derivative history.
    pub fn reset(&mut self) {
        self.integral = 0.0;
        self.previous_error = None;
    }

    /// Controller output for `error` after `dt` seconds.
    ///
    /// A non-positive `dt` (e.g. the first call) updates neither the integral
    /// nor the derivative.
    pub fn update(&mut self, error: f64, dt: f64) -> f64 {
        let PidGains { kp, ki, kd } = self.gains;
        if !(dt.is_finite() && dt > 0.0) {
            self.previous_error = Some(error);
            return (kp * error + ki * self.integral).clamp(self.min, self.max);
        }

        let derivative = self.previous_error.map_or(0.0, |prev| (error - prev) / dt);
        self.previous_error = Some(error);

        let integral = self.integral + error * dt;
        let raw = kp * error + ki * integral + kd * derivative;
        let output = raw.clamp(self.min, self.max);

        // Anti-windup
        let unwinding = (raw > self.max && error < 0.0) || (raw < self.min && error > 0.0);
        if output == raw || unwinding {
            self.integral = integral;
        }
        output
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_proportional_only() {
        let mut pid = PidController::new(PidGains::new(0.5, 0.0, 0.0));
        assert_relative_eq!(pid.update(1.0, 0.01), 0.5);
        assert_relative_eq!(pid.update(-0.4, 0.01), -0.2);
    }

    #[test]
    fn test_output_is_clamped() {
        let mut pid = PidController::new(PidGains::new(10.0, 0.0, 0.0)).with_limits(-0.5, 0.5);
        assert_eq!(pid.update(1.0, 0.01), 0.5);
        assert_eq!(pid.update(-1.0, 0.01), -0.5);
    }

    #[test]
    fn test_integral_accumulates() {
        let mut pid = PidController::new(PidGains::new(0.0, 1.0, 0.0));
        for _ in 0..10 {
            pid.update(0.5, 0.1);
        }
        assert_relative_eq!(pid.integral(), 0.5, epsilon = 1e-12);
        assert_relative_eq!(pid.update(0.0, 0.1), 0.5, epsilon = 1e-12);
    }

    #[test]
    fn test_anti_windup() {
        let mut pid = PidController::new(PidGains::new(1.0, 1.0, 0.0));
        // Saturated for a long time
        for _ in 0..1000 {
            assert_eq!(pid.update(5.0, 0.1), 1.0);
        }
        assert!(pid.integral() < 1.0, "integral wound up to {}", pid.integral());

        // Error reversal pulls the output down immediately
        assert!(pid.update(-1.0, 0.1) < 0.0);
    }

    #[test]
    fn test_derivative() {
        let mut pid = PidController::new(PidGains::new(0.0, 0.0, 0.1)).with_limits(-10.0, 10.0);
        assert_eq!(pid.update(0.0, 0.1), 0.0);
        assert_relative_eq!(pid.update(1.0, 0.1), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_first_call_without_dt() {
        let mut pid = PidController::new(PidGains::new(0.2, 5.0, 3.0));
        assert_relative_eq!(pid.update(1.0, 0.0), 0.2);
        assert_eq!(pid.integral(), 0.0);
        pid.reset();
        assert_eq!(pid.integral(), 0.0);
    }
}
