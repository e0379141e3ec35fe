//! Driver control inputs.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Control inputs produced by a driver for one tick.
///
/// - `throttle` in `[0, 1]`
/// - `steering` in `[-1, 1]` (positive steers left)
/// - `braking` in `[0, 1]`
///
/// Inputs are a value snapshot: the loop recomputes them every tick and hands
/// the same copy to every module it synchronizes.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DriverInputs {
    /// Throttle pedal position.
    pub throttle: f64,
    /// Steering wheel position.
    pub steering: f64,
    /// Brake pedal position.
    pub braking: f64,
}

impl DriverInputs {
    /// All-zero inputs (no throttle, straight wheels, no brake).
    pub const ZERO: Self = Self {
        throttle: 0.0,
        steering: 0.0,
        braking: 0.0,
    };

    /// Create inputs, clamping every channel into its valid range.
    ///
    /// Non-finite values are treated as zero.
    #[must_use]
    pub fn new(throttle: f64, steering: f64, braking: f64) -> Self {
        Self {
            throttle: clamp_finite(throttle, 0.0, 1.0),
            steering: clamp_finite(steering, -1.0, 1.0),
            braking: clamp_finite(braking, 0.0, 1.0),
        }
    }

    /// Return a copy with every channel clamped into range.
    #[must_use]
    pub fn clamped(self) -> Self {
        Self::new(self.throttle, self.steering, self.braking)
    }

    /// Check whether every channel is within its valid range.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        (0.0..=1.0).contains(&self.throttle)
            && (-1.0..=1.0).contains(&self.steering)
            && (0.0..=1.0).contains(&self.braking)
    }

    /// Check whether all channels are zero.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        *self == Self::ZERO
    }
}

fn clamp_finite(value: f64, min: f64, max: f64) -> f64 {
    if value.is_finite() {
        value.clamp(min, max)
    } else {
        0.0
    }
}
