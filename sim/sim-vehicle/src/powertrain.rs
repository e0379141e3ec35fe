//! Steering, engine, transmission, driveline and brakes.
//!
//! The powertrain is quasi-static: wheel spin is not integrated, the engine
//! speed follows from the vehicle speed through the gearing.
//!
//! ```text
//! engine speed  = wheel speed * gear_ratio * final_drive
//! engine torque = throttle * max_torque * (1 - engine speed / max_speed)
//! wheel torque  = engine torque * gear_ratio * final_drive * efficiency / driven wheels
//! ```

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{Result, VehicleError};

/// Maps the steering input in `[-1, 1]` to a road-wheel angle.
///
/// Positive steering turns the vehicle left (counter-clockwise about +Z).
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Steering {
    /// Road-wheel angle at full lock (rad).
    pub max_angle: f64,
}

impl Default for Steering {
    fn default() -> Self {
        Self {
            max_angle: 30f64.to_radians(),
        }
    }
}

impl Steering {
    /// Road-wheel angle for a steering input.
    #[must_use]
    pub fn angle(&self, steering: f64) -> f64 {
        steering.clamp(-1.0, 1.0) * self.max_angle
    }
}

/// Engine with a linear torque curve falling to zero at `max_speed`.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Engine {
    /// Peak torque at zero speed (N m).
    pub max_torque: f64,
    /// Speed at which torque vanishes (rad/s).
    pub max_speed: f64,
}

impl Default for Engine {
    fn default() -> Self {
        Self {
            max_torque: 600.0,
            max_speed: 3300.0 * std::f64::consts::TAU / 60.0,
        }
    }
}

impl Engine {
    /// Output torque at the given throttle and engine speed.
    #[must_use]
    pub fn torque(&self, throttle: f64, speed: f64) -> f64 {
        let falloff = (1.0 - speed.abs() / self.max_speed).clamp(0.0, 1.0);
        throttle.clamp(0.0, 1.0) * self.max_torque * falloff
    }
}

/// Single-ratio gearbox and final drive.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Transmission {
    /// Gearbox ratio.
    pub gear_ratio: f64,
    /// Differential ratio.
    pub final_drive: f64,
    /// Driveline efficiency in `(0, 1]`.
    pub efficiency: f64,
}

impl Default for Transmission {
    fn default() -> Self {
        Self {
            gear_ratio: 2.48,
            final_drive: 3.73,
            efficiency: 0.9,
        }
    }
}

impl Transmission {
    /// Overall reduction from engine to wheel.
    #[must_use]
    pub fn ratio(&self) -> f64 {
        self.gear_ratio * self.final_drive
    }
}

/// Which axles receive drive torque.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum DriveType {
    /// Front axle only.
    Fwd,
    /// Rear axle only.
    Rwd,
    /// All axles.
    #[default]
    Awd,
}

impl DriveType {
    /// Whether axle `index` of `count` (front first) is driven.
    #[must_use]
    pub fn drives(self, index: usize, count: usize) -> bool {
        match self {
            Self::Fwd => index == 0,
            Self::Rwd => index + 1 == count,
            Self::Awd => true,
        }
    }
}

/// Per-wheel brakes.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Brakes {
    /// Brake torque per wheel at full pedal (N m).
    pub max_torque: f64,
}

impl Default for Brakes {
    fn default() -> Self {
        Self { max_torque: 4000.0 }
    }
}

/// Complete powertrain.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Powertrain {
    /// Engine.
    pub engine: Engine,
    /// Gearing.
    pub transmission: Transmission,
    /// Driven axles.
    pub drive_type: DriveType,
    /// Brakes.
    pub brakes: Brakes,
}

impl Powertrain {
    /// Validate the parameters.
    pub fn validate(&self) -> Result<()> {
        if !(non_negative(self.engine.max_torque) && positive(self.engine.max_speed)) {
            return Err(VehicleError::invalid_parameters(
                "engine needs non-negative torque and positive max speed",
            ));
        }
        let t = &self.transmission;
        if !(positive(t.gear_ratio) && positive(t.final_drive)) {
            return Err(VehicleError::invalid_parameters(
                "gear and final drive ratios must be positive",
            ));
        }
        if !(positive(t.efficiency) && t.efficiency <= 1.0) {
            return Err(VehicleError::invalid_parameters(format!(
                "driveline efficiency must be in (0, 1], got {}",
                t.efficiency
            )));
        }
        if !non_negative(self.brakes.max_torque) {
            return Err(VehicleError::invalid_parameters(
                "brake torque must be non-negative",
            ));
        }
        Ok(())
    }

    /// Drive torque delivered to each of `driven` wheels turning at `wheel_speed` (rad/s).
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn wheel_torque(&self, throttle: f64, wheel_speed: f64, driven: usize) -> f64 {
        if driven == 0 {
            return 0.0;
        }
        let ratio = self.transmission.ratio();
        let engine_torque = self.engine.torque(throttle, wheel_speed * ratio);
        engine_torque * ratio * self.transmission.efficiency / driven as f64
    }

    /// Brake torque on one wheel for a pedal position.
    #[must_use]
    pub fn brake_torque(&self, braking: f64) -> f64 {
        braking.clamp(0.0, 1.0) * self.brakes.max_torque
    }
}

fn positive(v: f64) -> bool {
    v.is_finite() && v > 0.0
}

fn non_negative(v: f64) -> bool {
    v.is_finite() && v >= 0.0
}
