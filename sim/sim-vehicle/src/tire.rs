//! Tire contact model.
//!
//! Tires are rigid in the rolling direction and compliant radially. The
//! lateral force follows a linear cornering law capped by the friction
//! ellipse:
//!
//! ```text
//! alpha   = atan(v_lat / max(|v_long|, v_min))
//! F_lat   = -C * N * alpha
//! |F_lat| <= sqrt((mu N)^2 - F_long^2)
//! ```

use std::f64::consts::PI;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{Result, VehicleError};

/// Speed below which slip angles are computed against this floor (m/s).
const MIN_SLIP_SPEED: f64 = 1.0;

/// Tire tread geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum TireType {
    /// Smooth cylinder.
    Cylindrical,
    /// Cylinder with lugs (wider effective footprint, stiffer cornering).
    #[default]
    Lugged,
}

impl TireType {
    /// Cornering stiffness per unit normal load (1/rad).
    #[must_use]
    pub fn cornering_coefficient(self) -> f64 {
        match self {
            Self::Cylindrical => 8.0,
            Self::Lugged => 10.0,
        }
    }

    /// Footprint width relative to the nominal tire width.
    #[must_use]
    pub fn width_factor(self) -> f64 {
        match self {
            Self::Cylindrical => 1.0,
            Self::Lugged => 1.15,
        }
    }
}

/// Contact material of the tire.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TireMaterial {
    /// Coulomb friction coefficient.
    pub mu: f64,
    /// Young's modulus (Pa).
    pub young_modulus: f64,
    /// Coefficient of restitution in `(0, 1]`.
    pub restitution: f64,
}

impl Default for TireMaterial {
    fn default() -> Self {
        Self {
            mu: 0.8,
            young_modulus: 1.0e6,
            restitution: 0.1,
        }
    }
}

impl TireMaterial {
    /// Validate the material.
    pub fn validate(&self) -> Result<()> {
        if !(self.mu.is_finite() && self.mu >= 0.0) {
            return Err(VehicleError::invalid_parameters(format!(
                "tire friction must be non-negative, got {}",
                self.mu
            )));
        }
        if !(self.young_modulus.is_finite() && self.young_modulus > 0.0) {
            return Err(VehicleError::invalid_parameters(
                "tire Young's modulus must be positive",
            ));
        }
        if !(self.restitution > 0.0 && self.restitution <= 1.0) {
            return Err(VehicleError::invalid_parameters(format!(
                "tire restitution must be in (0, 1], got {}",
                self.restitution
            )));
        }
        Ok(())
    }

    /// Radial stiffness of a footprint of the given width (N/m).
    #[must_use]
    pub fn radial_stiffness(&self, width: f64) -> f64 {
        self.young_modulus * width
    }

    /// Damping ratio equivalent to the coefficient of restitution.
    #[must_use]
    pub fn damping_ratio(&self) -> f64 {
        let ln_e = self.restitution.clamp(1e-6, 1.0).ln();
        -ln_e / (PI * PI + ln_e * ln_e).sqrt()
    }
}

/// Tire of one wheel.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Tire {
    /// Tread geometry.
    pub tire_type: TireType,
    /// Contact material.
    pub material: TireMaterial,
}

impl Tire {
    /// Lateral force opposing side slip.
    ///
    /// `ground_mu` is the terrain friction; the tighter of tire and ground
    /// friction bounds the total horizontal force.
    #[must_use]
    pub fn lateral_force(
        &self,
        normal_load: f64,
        forward_speed: f64,
        lateral_speed: f64,
        longitudinal_force: f64,
        ground_mu: f64,
    ) -> f64 {
        if normal_load <= 0.0 {
            return 0.0;
        }
        let alpha = (lateral_speed / forward_speed.abs().max(MIN_SLIP_SPEED)).atan();
        let demand = -self.tire_type.cornering_coefficient() * normal_load * alpha;

        let mu = self.material.mu.min(ground_mu.max(0.0));
        let total = mu * normal_load;
        let available = (total * total - longitudinal_force * longitudinal_force)
            .max(0.0)
            .sqrt();
        demand.clamp(-available, available)
    }
}
