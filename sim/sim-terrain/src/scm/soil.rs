//! Soil constitutive parameters.
//!
//! The soil contact model combines three classical terramechanics laws:
//!
//! ```text
//! Bekker pressure-sinkage:   p = (kc / b + kphi) * z^n
//! Mohr-Coulomb shear limit:  tau_max = c + p * tan(phi)
//! Janosi-Hanamoto shear:     tau = tau_max * (1 - exp(-j / K))
//! ```
//!
//! Where `b` is the footprint width, `z` the sinkage and `j` the shear
//! displacement.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{Result, TerrainError};

/// Parameters of the soil contact model.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SoilParameters {
    /// Bekker frictional modulus Kphi (Pa/m^n).
    pub bekker_kphi: f64,
    /// Bekker cohesive modulus Kc (Pa/m^(n-1)).
    pub bekker_kc: f64,
    /// Bekker exponent n.
    pub bekker_n: f64,
    /// Mohr cohesive limit (Pa).
    pub mohr_cohesion: f64,
    /// Mohr friction angle (degrees).
    pub mohr_friction_deg: f64,
    /// Janosi shear coefficient K (m).
    pub janosi_shear: f64,
    /// Elastic stiffness (Pa/m), must exceed Kphi.
    pub elastic_stiffness: f64,
    /// Vertical damping (Pa s/m).
    pub damping: f64,
}

impl Default for SoilParameters {
    fn default() -> Self {
        Self {
            bekker_kphi: 2e6,
            bekker_kc: 0.0,
            bekker_n: 1.1,
            mohr_cohesion: 0.0,
            mohr_friction_deg: 30.0,
            janosi_shear: 0.01,
            elastic_stiffness: 2e8,
            damping: 3e4,
        }
    }
}

impl SoilParameters {
    /// Set the Bekker coefficients.
    #[must_use]
    pub fn with_bekker(mut self, kphi: f64, kc: f64, n: f64) -> Self {
        self.bekker_kphi = kphi;
        self.bekker_kc = kc;
        self.bekker_n = n;
        self
    }

    /// Set the Mohr-Coulomb coefficients.
    #[must_use]
    pub fn with_mohr(mut self, cohesion: f64, friction_deg: f64) -> Self {
        self.mohr_cohesion = cohesion;
        self.mohr_friction_deg = friction_deg;
        self
    }

    /// Set the Janosi shear coefficient.
    #[must_use]
    pub fn with_janosi_shear(mut self, k: f64) -> Self {
        self.janosi_shear = k;
        self
    }

    /// Set the elastic stiffness and vertical damping.
    #[must_use]
    pub fn with_elastic(mut self, stiffness: f64, damping: f64) -> Self {
        self.elastic_stiffness = stiffness;
        self.damping = damping;
        self
    }

    /// Validate the parameters.
    pub fn validate(&self) -> Result<()> {
        let all = [
            self.bekker_kphi,
            self.bekker_kc,
            self.bekker_n,
            self.mohr_cohesion,
            self.mohr_friction_deg,
            self.janosi_shear,
            self.elastic_stiffness,
            self.damping,
        ];
        if all.iter().any(|v| !v.is_finite()) {
            return Err(TerrainError::invalid_parameters("soil parameters must be finite"));
        }
        if self.bekker_kphi < 0.0 || self.bekker_kc < 0.0 {
            return Err(TerrainError::invalid_parameters(
                "Bekker moduli must be non-negative",
            ));
        }
        if self.bekker_kphi + self.bekker_kc <= 0.0 {
            return Err(TerrainError::invalid_parameters(
                "Bekker Kphi + Kc must be positive",
            ));
        }
        if self.bekker_n <= 0.0 {
            return Err(TerrainError::invalid_parameters(format!(
                "Bekker exponent must be positive, got {}",
                self.bekker_n
            )));
        }
        if !(0.0..90.0).contains(&self.mohr_friction_deg) {
            return Err(TerrainError::invalid_parameters(format!(
                "friction angle must be in [0, 90) degrees, got {}",
                self.mohr_friction_deg
            )));
        }
        if self.janosi_shear <= 0.0 {
            return Err(TerrainError::invalid_parameters(
                "Janosi shear coefficient must be positive",
            ));
        }
        if self.mohr_cohesion < 0.0 || self.damping < 0.0 {
            return Err(TerrainError::invalid_parameters(
                "cohesion and damping must be non-negative",
            ));
        }
        if self.elastic_stiffness <= self.bekker_kphi {
            return Err(TerrainError::invalid_parameters(format!(
                "elastic stiffness {} must exceed Kphi {}",
                self.elastic_stiffness, self.bekker_kphi
            )));
        }
        Ok(())
    }

    /// Combined Bekker modulus `kc / b + kphi` for a footprint of width `b`.
    #[must_use]
    pub fn bekker_modulus(&self, width: f64) -> f64 {
        if width > 0.0 {
            self.bekker_kc / width + self.bekker_kphi
        } else {
            self.bekker_kphi
        }
    }

    /// Pressure needed to reach sinkage `z` under a footprint of width `b`.
    #[must_use]
    pub fn pressure(&self, width: f64, sinkage: f64) -> f64 {
        self.bekker_modulus(width) * sinkage.max(0.0).powf(self.bekker_n)
    }

    /// Sinkage produced by pressure `p` under a footprint of width `b`.
    #[must_use]
    pub fn sinkage(&self, width: f64, pressure: f64) -> f64 {
        let k = self.bekker_modulus(width);
        if pressure <= 0.0 || k <= 0.0 {
            return 0.0;
        }
        (pressure / k).powf(1.0 / self.bekker_n)
    }

    /// Friction coefficient `tan(phi)`.
    #[must_use]
    pub fn friction_coefficient(&self) -> f64 {
        self.mohr_friction_deg.to_radians().tan()
    }

    /// Shear strength limit `c + p tan(phi)` at pressure `p`.
    #[must_use]
    pub fn shear_strength(&self, pressure: f64) -> f64 {
        self.mohr_cohesion + pressure.max(0.0) * self.friction_coefficient()
    }

    /// Compaction resistance `b k z^(n+1) / (n+1)`.
    #[must_use]
    pub fn compaction_resistance(&self, width: f64, sinkage: f64) -> f64 {
        let n1 = self.bekker_n + 1.0;
        width * self.bekker_modulus(width) * sinkage.max(0.0).powf(n1) / n1
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_defaults_are_valid() {
        let soil = SoilParameters::default();
        assert!(soil.validate().is_ok());
        assert_relative_eq!(soil.friction_coefficient(), 30f64.to_radians().tan());
    }

    #[test]
    fn test_pressure_sinkage_inverse() {
        let soil = SoilParameters::default().with_bekker(2e6, 1e4, 1.1);
        let z = 0.03;
        let p = soil.pressure(0.3, z);
        assert_relative_eq!(soil.sinkage(0.3, p), z, epsilon = 1e-12);
        assert_eq!(soil.sinkage(0.3, 0.0), 0.0);
        assert_eq!(soil.sinkage(0.3, -5.0), 0.0);
    }

    #[test]
    fn test_shear_strength() {
        let soil = SoilParameters::default().with_mohr(1000.0, 45.0);
        assert_relative_eq!(soil.shear_strength(2000.0), 3000.0, epsilon = 1e-9);
        assert_relative_eq!(soil.shear_strength(-1.0), 1000.0);
    }

    #[test]
    fn test_compaction_resistance_grows_with_sinkage() {
        let soil = SoilParameters::default();
        let shallow = soil.compaction_resistance(0.3, 0.01);
        let deep = soil.compaction_resistance(0.3, 0.05);
        assert!(deep > shallow && shallow > 0.0);
        assert_eq!(soil.compaction_resistance(0.3, 0.0), 0.0);
    }

    #[test]
    fn test_validation() {
        assert!(SoilParameters::default().with_bekker(0.0, 0.0, 1.1).validate().is_err());
        assert!(SoilParameters::default().with_bekker(2e6, 0.0, 0.0).validate().is_err());
        assert!(SoilParameters::default().with_mohr(0.0, 90.0).validate().is_err());
        assert!(SoilParameters::default().with_mohr(-1.0, 30.0).validate().is_err());
        assert!(SoilParameters::default().with_janosi_shear(0.0).validate().is_err());

        // Elastic stiffness must stay above the frictional modulus
        assert!(SoilParameters::default().with_elastic(2e6, 3e4).validate().is_err());
        assert!(SoilParameters::default().with_elastic(1e6, 3e4).validate().is_err());
        assert!(SoilParameters::default().with_elastic(0.0, 3e4).validate().is_err());
        assert!(SoilParameters::default().with_elastic(2.1e6, 3e4).validate().is_ok());
        assert!(SoilParameters::default().with_elastic(2e8, -1.0).validate().is_err());

        let soil = SoilParameters {
            damping: f64::NAN,
            ..Default::default()
        };
        assert!(soil.validate().is_err());
    }
}
