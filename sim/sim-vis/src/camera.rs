//! Top-down chase camera.

use nalgebra::{Point3, Vector3};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use sim_types::VehicleState;

/// Orthographic camera looking straight down at a point on the chassis.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ChaseCamera {
    /// Tracked point in the chassis frame.
    pub track_point: Vector3<f64>,
    /// Width of ground shown across the image (m).
    pub view_width: f64,
}

impl Default for ChaseCamera {
    fn default() -> Self {
        Self {
            track_point: Vector3::new(0.0, 0.0, 1.75),
            view_width: 16.0,
        }
    }
}

impl ChaseCamera {
    /// Set the tracked point.
    #[must_use]
    pub fn with_track_point(mut self, track_point: Vector3<f64>) -> Self {
        self.track_point = track_point;
        self
    }

    /// Set the view width.
    #[must_use]
    pub fn with_view_width(mut self, view_width: f64) -> Self {
        self.view_width = view_width;
        self
    }

    /// World point the image is centred on.
    #[must_use]
    pub fn target(&self, vehicle: &VehicleState) -> Point3<f64> {
        vehicle.to_world(&Point3::from(self.track_point))
    }
}

/// Mapping between world XY and pixels for one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    center_x: f64,
    center_y: f64,
    /// Meters per pixel.
    scale: f64,
    width: u32,
    height: u32,
}

impl Viewport {
    /// Viewport of `width` x `height` pixels showing `view_width` meters
    /// across, centred on `(center_x, center_y)`.
    #[must_use]
    pub fn new(center_x: f64, center_y: f64, view_width: f64, width: u32, height: u32) -> Self {
        Self {
            center_x,
            center_y,
            scale: view_width / f64::from(width.max(1)),
            width,
            height,
        }
    }

    /// Meters per pixel.
    #[must_use]
    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// World XY at the centre of pixel `(px, py)`; image rows grow toward -Y.
    #[must_use]
    pub fn to_world(&self, px: u32, py: u32) -> (f64, f64) {
        let dx = f64::from(px) + 0.5 - 0.5 * f64::from(self.width);
        let dy = f64::from(py) + 0.5 - 0.5 * f64::from(self.height);
        (self.center_x + dx * self.scale, self.center_y - dy * self.scale)
    }

    /// Pixel coordinates (possibly off-screen) of a world XY point.
    #[must_use]
    pub fn to_pixel(&self, x: f64, y: f64) -> (f64, f64) {
        (
            (x - self.center_x) / self.scale + 0.5 * f64::from(self.width) - 0.5,
            (self.center_y - y) / self.scale + 0.5 * f64::from(self.height) - 0.5,
        )
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::{Isometry3, Translation3, UnitQuaternion};

    #[test]
    fn test_target_follows_chassis() {
        let camera = ChaseCamera::default().with_track_point(Vector3::new(1.0, 0.0, 0.0));
        let vehicle = VehicleState {
            pose: Isometry3::from_parts(
                Translation3::new(5.0, 2.0, 0.5),
                UnitQuaternion::from_euler_angles(0.0, 0.0, std::f64::consts::FRAC_PI_2),
            ),
            ..VehicleState::default()
        };
        let target = camera.target(&vehicle);
        assert_relative_eq!(target.x, 5.0, epsilon = 1e-12);
        assert_relative_eq!(target.y, 3.0, epsilon = 1e-12);
    }

    #[test]
    fn test_viewport_round_trip_and_orientation() {
        let view = Viewport::new(10.0, -4.0, 8.0, 80, 60);
        assert_relative_eq!(view.scale(), 0.1);

        let (x, y) = view.to_world(0, 0);
        // Top-left pixel is toward -X and +Y
        assert!(x < 10.0 && y > -4.0);

        let (px, py) = view.to_pixel(x, y);
        assert_relative_eq!(px, 0.0, epsilon = 1e-9);
        assert_relative_eq!(py, 0.0, epsilon = 1e-9);
    }
}
