//! Vehicle state snapshots.
//!
//! Read-only views of the vehicle handed to drivers, visual systems and
//! telemetry. The vehicle owns the live state; these are copies.

use nalgebra::{Isometry3, Point3, UnitQuaternion, Vector3};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Snapshot of one wheel.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct WheelState {
    /// Wheel centre in world coordinates.
    pub center: Point3<f64>,
    /// Whether the wheel touched the terrain this tick.
    pub in_contact: bool,
    /// Normal load carried by the wheel (N).
    pub normal_load: f64,
    /// Longitudinal force delivered by the terrain (N).
    pub tractive_force: f64,
    /// Soil sinkage under the wheel (m), zero on rigid ground.
    pub sinkage: f64,
    /// Longitudinal slip ratio reported by the terrain.
    pub slip: f64,
    /// Current steer angle (rad).
    pub steer_angle: f64,
}

impl Default for WheelState {
    fn default() -> Self {
        Self {
            center: Point3::origin(),
            in_contact: false,
            normal_load: 0.0,
            tractive_force: 0.0,
            sinkage: 0.0,
            slip: 0.0,
            steer_angle: 0.0,
        }
    }
}

/// Snapshot of the whole vehicle.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct VehicleState {
    /// Simulation time of the snapshot.
    pub time: f64,
    /// Chassis reference frame in world coordinates.
    pub pose: Isometry3<f64>,
    /// Chassis linear velocity (world frame, m/s).
    pub linear_velocity: Vector3<f64>,
    /// Chassis angular velocity (world frame, rad/s).
    pub angular_velocity: Vector3<f64>,
    /// Per-wheel snapshots, axle by axle, left before right.
    pub wheels: Vec<WheelState>,
}

impl Default for VehicleState {
    fn default() -> Self {
        Self {
            time: 0.0,
            pose: Isometry3::identity(),
            linear_velocity: Vector3::zeros(),
            angular_velocity: Vector3::zeros(),
            wheels: Vec::new(),
        }
    }
}

impl VehicleState {
    /// Chassis position.
    #[must_use]
    pub fn position(&self) -> Point3<f64> {
        Point3::from(self.pose.translation.vector)
    }

    /// Chassis orientation.
    #[must_use]
    pub fn rotation(&self) -> UnitQuaternion<f64> {
        self.pose.rotation
    }

    /// Chassis forward direction (+X of the chassis frame) in world coordinates.
    #[must_use]
    pub fn forward(&self) -> Vector3<f64> {
        self.pose.rotation * Vector3::x()
    }

    /// Signed forward speed (m/s).
    #[must_use]
    pub fn speed(&self) -> f64 {
        self.linear_velocity.dot(&self.forward())
    }

    /// Heading angle about world Z (rad).
    #[must_use]
    pub fn yaw(&self) -> f64 {
        let f = self.forward();
        f.y.atan2(f.x)
    }

    /// Transform a point from the chassis frame to world coordinates.
    #[must_use]
    pub fn to_world(&self, local: &Point3<f64>) -> Point3<f64> {
        self.pose.transform_point(local)
    }

    /// Mean sinkage over wheels in contact (zero if none).
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn mean_sinkage(&self) -> f64 {
        let (sum, n) = self
            .wheels
            .iter()
            .filter(|w| w.in_contact)
            .fold((0.0, 0usize), |(s, n), w| (s + w.sinkage, n + 1));
        if n == 0 { 0.0 } else { sum / n as f64 }
    }
}
