//! Moving patches: regions of the soil grid that follow a vehicle body.

use nalgebra::{Isometry3, Point3, Vector3};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Body a moving patch is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum PatchAnchor {
    /// Vehicle chassis.
    #[default]
    Chassis,
    /// Wheel spindle, by wheel index (axle by axle, left before right).
    Wheel(usize),
}

impl PatchAnchor {
    /// Index of the anchor in the tracked pose list (chassis first, then wheels).
    #[must_use]
    pub fn body_index(self) -> usize {
        match self {
            Self::Chassis => 0,
            Self::Wheel(i) => 1 + i,
        }
    }
}

/// Box fixed in the frame of a tracked body.
///
/// Only grid nodes under the union of all moving patches are tested for
/// contact each step.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MovingPatch {
    /// Body the box follows.
    pub anchor: PatchAnchor,
    /// Box centre in the body frame (m).
    pub offset: Vector3<f64>,
    /// Full box dimensions in the body frame (m).
    pub size: Vector3<f64>,
}

impl MovingPatch {
    /// Create a moving patch.
    #[must_use]
    pub fn new(anchor: PatchAnchor, offset: Vector3<f64>, size: Vector3<f64>) -> Self {
        Self {
            anchor,
            offset,
            size: size.abs(),
        }
    }

    /// World-space XY bounding rectangle of the box for a given body pose.
    #[must_use]
    pub fn world_bounds(&self, pose: &Isometry3<f64>) -> ((f64, f64), (f64, f64)) {
        let half = self.size * 0.5;
        let mut min = (f64::INFINITY, f64::INFINITY);
        let mut max = (f64::NEG_INFINITY, f64::NEG_INFINITY);
        for sx in [-1.0, 1.0] {
            for sy in [-1.0, 1.0] {
                for sz in [-1.0, 1.0] {
                    let local = Point3::from(
                        self.offset + Vector3::new(sx * half.x, sy * half.y, sz * half.z),
                    );
                    let p = pose.transform_point(&local);
                    min = (min.0.min(p.x), min.1.min(p.y));
                    max = (max.0.max(p.x), max.1.max(p.y));
                }
            }
        }
        (min, max)
    }
}
