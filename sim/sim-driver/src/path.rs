//! Reference paths for closed-loop drivers.
//!
//! Paths are polylines followed in the XY plane; heights are carried along
//! but ignored for projection.

use nalgebra::{Point3, Vector3};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{DriverError, Result};

/// Closest point of a path to a query point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PathProjection {
    /// Point on the path.
    pub point: Point3<f64>,
    /// Unit tangent of the path at `point` (XY plane).
    pub tangent: Vector3<f64>,
    /// Arc length from the start of the path to `point`.
    pub station: f64,
    /// Index of the segment containing `point`.
    pub segment: usize,
}

/// Piecewise-linear path.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Path {
    points: Vec<Point3<f64>>,
}

impl Path {
    /// Create a path through `points`.
    ///
    /// # Errors
    ///
    /// Returns an error with fewer than two points, non-finite coordinates
    /// or zero total length in the XY plane.
    pub fn new(points: Vec<Point3<f64>>) -> Result<Self> {
        if points.len() < 2 {
            return Err(DriverError::invalid_path(format!(
                "need at least 2 points, got {}",
                points.len()
            )));
        }
        if points.iter().any(|p| !p.coords.iter().all(|c| c.is_finite())) {
            return Err(DriverError::invalid_path("path points must be finite"));
        }
        let path = Self { points };
        if path.length() <= 0.0 {
            return Err(DriverError::invalid_path("path has zero length"));
        }
        Ok(path)
    }

    /// Path vertices.
    #[must_use]
    pub fn points(&self) -> &[Point3<f64>] {
        &self.points
    }

    /// Total XY length.
    #[must_use]
    pub fn length(&self) -> f64 {
        self.points
            .windows(2)
            .map(|w| planar(&(w[1] - w[0])).norm())
            .sum()
    }

    /// Closest point of the path to `p` in the XY plane.
    ///
    /// Beyond either end the projection stays on the end segment's line, so
    /// a vehicle that overshoots keeps following the last heading.
    #[must_use]
    pub fn project(&self, p: &Point3<f64>) -> PathProjection {
        let last = self.points.len() - 2;
        let mut best: Option<(f64, PathProjection)> = None;
        let mut station = 0.0;

        for (i, w) in self.points.windows(2).enumerate() {
            let (a, b) = (w[0], w[1]);
            let d = planar(&(b - a));
            let len = d.norm();
            if len <= 0.0 {
                continue;
            }
            let tangent = d / len;
            let mut s = planar(&(p - a)).dot(&tangent);
            if i > 0 {
                s = s.max(0.0);
            }
            if i < last {
                s = s.min(len);
            }
            let point = a + (b - a) * (s / len);
            let dist = planar(&(p - point)).norm_squared();
            if best.as_ref().is_none_or(|(d, _)| dist < *d) {
                best = Some((
                    dist,
                    PathProjection {
                        point,
                        tangent,
                        station: station + s,
                        segment: i,
                    },
                ));
            }
            station += len;
        }

        best.map_or_else(
            || PathProjection {
                point: self.points[0],
                tangent: Vector3::x(),
                station: 0.0,
                segment: 0,
            },
            |(_, proj)| proj,
        )
    }

    /// Signed XY distance from the path to `p`, positive when `p` lies to
    /// the left of the direction of travel.
    #[must_use]
    pub fn lateral_offset(&self, p: &Point3<f64>) -> f64 {
        let proj = self.project(p);
        let offset = planar(&(p - proj.point));
        proj.tangent.x * offset.y - proj.tangent.y * offset.x
    }
}

/// Straight line from `start` to `end`.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct StraightLinePath {
    /// First point.
    pub start: Point3<f64>,
    /// Last point.
    pub end: Point3<f64>,
}

impl StraightLinePath {
    /// Create a straight line.
    #[must_use]
    pub fn new(start: Point3<f64>, end: Point3<f64>) -> Self {
        Self { start, end }
    }

    /// Convert to a two-point [`Path`].
    pub fn into_path(self) -> Result<Path> {
        Path::new(vec![self.start, self.end])
    }
}

impl TryFrom<StraightLinePath> for Path {
    type Error = DriverError;

    fn try_from(line: StraightLinePath) -> Result<Self> {
        line.into_path()
    }
}

fn planar(v: &Vector3<f64>) -> Vector3<f64> {
    Vector3::new(v.x, v.y, 0.0)
}
