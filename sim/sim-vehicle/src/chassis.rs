//! Chassis rigid body.

use nalgebra::{Isometry3, Matrix3, Point3, UnitQuaternion, Vector3};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{Result, VehicleError};

/// Mass properties of the chassis. The chassis frame origin is its centre of mass.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Chassis {
    /// Mass (kg).
    pub mass: f64,
    /// Principal moments of inertia about the chassis axes (kg m^2).
    pub inertia: Vector3<f64>,
}

impl Chassis {
    /// Validate mass properties.
    pub fn validate(&self) -> Result<()> {
        if !(self.mass.is_finite() && self.mass > 0.0) {
            return Err(VehicleError::invalid_parameters(format!(
                "chassis mass must be positive, got {}",
                self.mass
            )));
        }
        if self.inertia.iter().any(|i| !(i.is_finite() && *i > 0.0)) {
            return Err(VehicleError::invalid_parameters(
                "chassis inertia must be positive",
            ));
        }
        Ok(())
    }
}

/// Kinematic state of the chassis.
#[derive(Debug, Clone, PartialEq)]
pub struct ChassisState {
    /// Chassis frame in world coordinates.
    pub pose: Isometry3<f64>,
    /// Linear velocity (world frame).
    pub linear_velocity: Vector3<f64>,
    /// Angular velocity (world frame).
    pub angular_velocity: Vector3<f64>,
}

impl ChassisState {
    /// Chassis at rest at the given pose.
    #[must_use]
    pub fn at_rest(pose: Isometry3<f64>) -> Self {
        Self {
            pose,
            linear_velocity: Vector3::zeros(),
            angular_velocity: Vector3::zeros(),
        }
    }

    /// Velocity of a world-space point rigidly attached to the chassis.
    #[must_use]
    pub fn point_velocity(&self, point: &Point3<f64>) -> Vector3<f64> {
        let r = point - Point3::from(self.pose.translation.vector);
        self.linear_velocity + self.angular_velocity.cross(&r)
    }

    /// Semi-implicit Euler step under a total force and torque (world frame).
    ///
    /// ```text
    /// v(t+dt) = v(t) + (F/m + g) * dt
    /// w(t+dt) = w(t) + I_w^-1 (tau - w x I_w w) * dt
    /// x(t+dt) = x(t) + v(t+dt) * dt
    /// ```
    pub fn integrate(
        &mut self,
        body: &Chassis,
        mass: f64,
        force: &Vector3<f64>,
        torque: &Vector3<f64>,
        gravity: &Vector3<f64>,
        dt: f64,
    ) {
        self.linear_velocity += (force / mass + gravity) * dt;

        let rot = self.pose.rotation.to_rotation_matrix();
        let inertia_world = rot.matrix() * Matrix3::from_diagonal(&body.inertia) * rot.matrix().transpose();
        let gyro = self.angular_velocity.cross(&(inertia_world * self.angular_velocity));
        if let Some(inv) = inertia_world.try_inverse() {
            self.angular_velocity += inv * (torque - gyro) * dt;
        }

        self.pose.translation.vector += self.linear_velocity * dt;
        integrate_rotation(&mut self.pose.rotation, &self.angular_velocity, dt);
    }

    /// Whether every component is finite.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.pose.translation.vector.iter().all(|v| v.is_finite())
            && self.pose.rotation.coords.iter().all(|v| v.is_finite())
            && self.linear_velocity.iter().all(|v| v.is_finite())
            && self.angular_velocity.iter().all(|v| v.is_finite())
    }
}

/// Rotate by a world-frame angular velocity over `dt`.
fn integrate_rotation(rotation: &mut UnitQuaternion<f64>, omega: &Vector3<f64>, dt: f64) {
    if omega.norm() < 1e-10 {
        return;
    }
    let delta_q = UnitQuaternion::from_scaled_axis(omega * dt);
    *rotation = delta_q * *rotation;
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn body() -> Chassis {
        Chassis {
            mass: 100.0,
            inertia: Vector3::new(10.0, 20.0, 30.0),
        }
    }

    #[test]
    fn test_free_fall() {
        let mut state = ChassisState::at_rest(Isometry3::translation(0.0, 0.0, 10.0));
        let g = Vector3::new(0.0, 0.0, -9.81);
        for _ in 0..100 {
            state.integrate(&body(), 100.0, &Vector3::zeros(), &Vector3::zeros(), &g, 0.01);
        }
        assert_relative_eq!(state.linear_velocity.z, -9.81, epsilon = 1e-9);
        // Semi-implicit Euler falls slightly further than the exact 4.905 m
        assert!(state.pose.translation.z < 10.0 - 4.905);
        assert!(state.pose.translation.z > 10.0 - 5.0);
    }

    #[test]
    fn test_torque_spins_about_world_z() {
        let mut state = ChassisState::at_rest(Isometry3::identity());
        let torque = Vector3::new(0.0, 0.0, 30.0);
        state.integrate(&body(), 100.0, &Vector3::zeros(), &torque, &Vector3::zeros(), 0.1);
        assert_relative_eq!(state.angular_velocity, Vector3::new(0.0, 0.0, 0.1), epsilon = 1e-12);
        assert_relative_eq!(state.pose.rotation.euler_angles().2, 0.01, epsilon = 1e-12);
    }

    #[test]
    fn test_point_velocity() {
        let mut state = ChassisState::at_rest(Isometry3::translation(1.0, 0.0, 0.0));
        state.angular_velocity = Vector3::new(0.0, 0.0, 2.0);
        let v = state.point_velocity(&Point3::new(2.0, 0.0, 0.0));
        assert_relative_eq!(v, Vector3::new(0.0, 2.0, 0.0), epsilon = 1e-12);
    }

    #[test]
    fn test_divergence_detection() {
        let mut state = ChassisState::at_rest(Isometry3::identity());
        assert!(state.is_finite());
        state.linear_velocity.x = f64::NAN;
        assert!(!state.is_finite());
    }

    #[test]
    fn test_validation() {
        assert!(body().validate().is_ok());
        let bad = Chassis {
            mass: 0.0,
            ..body()
        };
        assert!(bad.validate().is_err());
        let bad = Chassis {
            inertia: Vector3::new(1.0, 0.0, 1.0),
            ..body()
        };
        assert!(bad.validate().is_err());
    }
}
