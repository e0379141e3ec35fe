//! Axles, wheels and suspension.

use nalgebra::Point3;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{Result, VehicleError};

/// Spring-damper strut between chassis and wheel centre.
///
/// The strut hangs along the chassis `-Z` axis from the wheel's attachment
/// point. At full extension the wheel centre sits `rest_length` below it.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Suspension {
    /// Spring rate (N/m).
    pub stiffness: f64,
    /// Damping coefficient (N s/m).
    pub damping: f64,
    /// Free length (m).
    pub rest_length: f64,
}

impl Default for Suspension {
    fn default() -> Self {
        Self {
            stiffness: 6.0e4,
            damping: 4.5e3,
            rest_length: 0.3,
        }
    }
}

impl Suspension {
    /// Strut force for a compression (m) and compression rate (m/s), never pulling.
    #[must_use]
    pub fn force(&self, compression: f64, rate: f64) -> f64 {
        (self.stiffness * compression + self.damping * rate).max(0.0)
    }
}

/// One wheel: geometry, suspension and role in the driveline.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Wheel {
    /// Strut attachment point in the chassis frame.
    pub attachment: Point3<f64>,
    /// Tire radius (m).
    pub radius: f64,
    /// Tire width (m).
    pub width: f64,
    /// Wheel mass (kg).
    pub mass: f64,
    /// Suspension strut.
    pub suspension: Suspension,
    /// Whether the steering turns this wheel.
    pub steerable: bool,
    /// Whether the engine drives this wheel.
    pub driven: bool,
}

impl Wheel {
    /// Validate geometry and suspension.
    pub fn validate(&self) -> Result<()> {
        let positive = [
            self.radius,
            self.width,
            self.suspension.stiffness,
            self.suspension.rest_length,
        ];
        if positive.iter().any(|v| !(v.is_finite() && *v > 0.0)) {
            return Err(VehicleError::invalid_parameters(
                "wheel radius, width, spring rate and rest length must be positive",
            ));
        }
        if !(self.mass.is_finite() && self.mass >= 0.0)
            || !(self.suspension.damping.is_finite() && self.suspension.damping >= 0.0)
        {
            return Err(VehicleError::invalid_parameters(
                "wheel mass and damping must be non-negative",
            ));
        }
        if !(self.attachment.x.is_finite()
            && self.attachment.y.is_finite()
            && self.attachment.z.is_finite())
        {
            return Err(VehicleError::invalid_parameters(
                "wheel attachment must be finite",
            ));
        }
        Ok(())
    }
}

/// Shared wheel description used to build symmetric axles.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct WheelSpec {
    /// Tire radius (m).
    pub radius: f64,
    /// Tire width (m).
    pub width: f64,
    /// Wheel mass (kg).
    pub mass: f64,
    /// Suspension strut.
    pub suspension: Suspension,
}

/// Pair of wheels at the same longitudinal position.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Axle {
    /// Left wheel (+Y) then right wheel (-Y).
    pub wheels: [Wheel; 2],
}

impl Axle {
    /// Build an axle with mirrored wheels.
    ///
    /// `x` and `z` locate the strut attachments in the chassis frame, which
    /// sit `half_track` to either side.
    #[must_use]
    pub fn symmetric(x: f64, half_track: f64, z: f64, spec: WheelSpec, steerable: bool) -> Self {
        let wheel = |y: f64| Wheel {
            attachment: Point3::new(x, y, z),
            radius: spec.radius,
            width: spec.width,
            mass: spec.mass,
            suspension: spec.suspension,
            steerable,
            driven: false,
        };
        Self {
            wheels: [wheel(half_track), wheel(-half_track)],
        }
    }

    /// Mark both wheels as driven or not.
    #[must_use]
    pub fn driven(mut self, driven: bool) -> Self {
        for wheel in &mut self.wheels {
            wheel.driven = driven;
        }
        self
    }

    /// Longitudinal position of the axle in the chassis frame.
    #[must_use]
    pub fn x(&self) -> f64 {
        0.5 * (self.wheels[0].attachment.x + self.wheels[1].attachment.x)
    }
}
