//! Simulation clock.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Monotonic simulation clock advanced in fixed steps.
///
/// Time is derived from an integer tick count (`origin + ticks * step_size`)
/// so that long runs do not accumulate summation error. Advancing with a
/// different step size rebases the clock at the current time.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SimulationClock {
    origin: f64,
    step_size: f64,
    ticks: u64,
}

impl Default for SimulationClock {
    fn default() -> Self {
        Self::new(crate::StepConfig::default().step_size)
    }
}

impl SimulationClock {
    /// Create a clock at time zero with the given step size.
    #[must_use]
    pub fn new(step_size: f64) -> Self {
        Self {
            origin: 0.0,
            step_size,
            ticks: 0,
        }
    }

    /// Create a clock starting at `time`.
    #[must_use]
    pub fn starting_at(time: f64, step_size: f64) -> Self {
        Self {
            origin: time,
            step_size,
            ticks: 0,
        }
    }

    /// Current simulation time (seconds).
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn time(&self) -> f64 {
        self.origin + self.ticks as f64 * self.step_size
    }

    /// Step size used by the current tick run.
    #[must_use]
    pub fn step_size(&self) -> f64 {
        self.step_size
    }

    /// Number of ticks since the last rebase.
    #[must_use]
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Advance by one tick of `dt` seconds.
    ///
    /// Non-positive or non-finite `dt` leaves the clock untouched.
    pub fn advance(&mut self, dt: f64) {
        if !dt.is_finite() || dt <= 0.0 {
            return;
        }
        if (dt - self.step_size).abs() > f64::EPSILON * self.step_size.abs().max(1.0) {
            self.origin = self.time();
            self.step_size = dt;
            self.ticks = 0;
        }
        self.ticks += 1;
    }

    /// Reset to `time` with no ticks elapsed.
    pub fn reset(&mut self, time: f64) {
        self.origin = time;
        self.ticks = 0;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_advance_exact_steps() {
        let mut clock = SimulationClock::new(3e-3);
        assert_eq!(clock.time(), 0.0);

        for _ in 0..1000 {
            clock.advance(3e-3);
        }
        assert_eq!(clock.ticks(), 1000);
        assert_relative_eq!(clock.time(), 3.0, epsilon = 1e-12);
    }

    #[test]
    fn test_rebase_on_step_change() {
        let mut clock = SimulationClock::new(0.01);
        clock.advance(0.01);
        clock.advance(0.01);
        clock.advance(0.005);
        assert_relative_eq!(clock.time(), 0.025, epsilon = 1e-12);
        assert_eq!(clock.step_size(), 0.005);
        assert_eq!(clock.ticks(), 1);
    }

    #[test]
    fn test_invalid_dt_ignored() {
        let mut clock = SimulationClock::starting_at(1.0, 0.01);
        clock.advance(0.0);
        clock.advance(-1.0);
        clock.advance(f64::NAN);
        assert_eq!(clock.time(), 1.0);
        assert_eq!(clock.ticks(), 0);
    }

    #[test]
    fn test_time_non_decreasing() {
        let mut clock = SimulationClock::new(1e-3);
        let mut last = clock.time();
        for i in 0..500 {
            let dt = if i % 7 == 0 { 2e-3 } else { 1e-3 };
            clock.advance(dt);
            assert!(clock.time() > last);
            last = clock.time();
        }
    }

    #[test]
    fn test_reset() {
        let mut clock = SimulationClock::new(0.1);
        clock.advance(0.1);
        clock.reset(5.0);
        assert_eq!(clock.time(), 5.0);
        assert_eq!(clock.ticks(), 0);
    }
}
