//! Regular height grid for terrain surfaces.
//!
//! A height field is a 2D grid of height values that defines a 3D surface.
//! Both the rigid terrain and the deformable SCM soil store their surface in
//! one of these.
//!
//! # Coordinate System
//!
//! The grid lies in the XY plane with heights along Z. Node `(i, j)` sits at
//! `origin + (i * cell_size, j * cell_size)`; patches built with the helper
//! constructors are centred on the world origin:
//!
//! ```text
//!        Y
//!        │   (nx-1, ny-1)
//!   ┌────┼────┐
//!   │    │    │
//! ──┼────┼────┼── X
//!   │    │    │
//!   └────┼────┘
//! (0,0)  │
//! ```
//!
//! Heights are stored in row-major order (X varies fastest).

// Grid indices are small and bounds are checked before casting
#![allow(
    clippy::cast_precision_loss,
    clippy::cast_sign_loss,
    clippy::cast_possible_truncation
)]

use std::path::Path;

use image::{ImageBuffer, Luma};
use nalgebra::{Point3, Vector3};

use crate::error::{Result, TerrainError};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Upper bound on grid size, to catch unit mistakes (e.g. mm spacing on a km patch).
const MAX_NODES: usize = 64_000_000;

/// Height grid with bilinear sampling.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct HeightField {
    /// Height values in row-major order: `heights[j * nx + i]`.
    heights: Vec<f64>,
    /// Number of nodes along X.
    nx: usize,
    /// Number of nodes along Y.
    ny: usize,
    /// Node spacing in meters.
    cell_size: f64,
    /// World position of node (0, 0).
    origin_x: f64,
    origin_y: f64,
}

impl HeightField {
    /// Create a height field from raw data.
    ///
    /// # Errors
    ///
    /// Returns an error if the data length does not match `nx * ny`, if
    /// either dimension is below 2, or if `cell_size` is not positive.
    pub fn new(
        heights: Vec<f64>,
        nx: usize,
        ny: usize,
        cell_size: f64,
        origin: (f64, f64),
    ) -> Result<Self> {
        if nx < 2 || ny < 2 {
            return Err(TerrainError::invalid_grid(format!(
                "need at least 2x2 nodes, got {nx}x{ny}"
            )));
        }
        if !cell_size.is_finite() || cell_size <= 0.0 {
            return Err(TerrainError::invalid_grid(format!(
                "cell size must be positive, got {cell_size}"
            )));
        }
        if heights.len() != nx * ny {
            return Err(TerrainError::invalid_grid(format!(
                "data length {} doesn't match dimensions {nx}x{ny}",
                heights.len()
            )));
        }
        if heights.iter().any(|h| !h.is_finite()) {
            return Err(TerrainError::invalid_grid("non-finite height value"));
        }

        Ok(Self {
            heights,
            nx,
            ny,
            cell_size,
            origin_x: origin.0,
            origin_y: origin.1,
        })
    }

    /// Create a height field centred on the origin, sampling `f(x, y)` at every node.
    ///
    /// # Errors
    ///
    /// Returns an error if the patch size or spacing is invalid.
    pub fn from_fn<F>(size_x: f64, size_y: f64, delta: f64, f: F) -> Result<Self>
    where
        F: Fn(f64, f64) -> f64,
    {
        let (nx, ny) = grid_dims(size_x, size_y, delta)?;
        let origin = (-0.5 * (nx - 1) as f64 * delta, -0.5 * (ny - 1) as f64 * delta);

        let mut heights = Vec::with_capacity(nx * ny);
        for j in 0..ny {
            for i in 0..nx {
                let x = origin.0 + i as f64 * delta;
                let y = origin.1 + j as f64 * delta;
                heights.push(f(x, y));
            }
        }
        Self::new(heights, nx, ny, delta, origin)
    }

    /// Create a flat patch at the given height.
    ///
    /// # Errors
    ///
    /// Returns an error if the patch size or spacing is invalid.
    pub fn flat(size_x: f64, size_y: f64, delta: f64, height: f64) -> Result<Self> {
        Self::from_fn(size_x, size_y, delta, |_, _| height)
    }

    /// Create a patch with a single smooth mound in the middle.
    ///
    /// The mound is a raised cosine of the given peak height whose radius is
    /// 30% of the smaller patch dimension.
    ///
    /// # Errors
    ///
    /// Returns an error if the patch size or spacing is invalid.
    pub fn bump(size_x: f64, size_y: f64, delta: f64, height: f64) -> Result<Self> {
        let radius = 0.3 * size_x.min(size_y);
        Self::from_fn(size_x, size_y, delta, |x, y| {
            let r = x.hypot(y);
            if r < radius {
                0.5 * height * (1.0 + (std::f64::consts::PI * r / radius).cos())
            } else {
                0.0
            }
        })
    }

    /// Load a grayscale height-map image and map it onto a centred patch.
    ///
    /// Black maps to `h_min`, white to `h_max`. The top image row is the
    /// `+Y` edge of the patch.
    ///
    /// # Errors
    ///
    /// Returns an error if the image cannot be decoded or the patch is invalid.
    pub fn from_image(
        path: impl AsRef<Path>,
        size_x: f64,
        size_y: f64,
        h_min: f64,
        h_max: f64,
        delta: f64,
    ) -> Result<Self> {
        let path = path.as_ref();
        let image = image::open(path)
            .map_err(|source| TerrainError::HeightMap {
                path: path.to_path_buf(),
                source,
            })?
            .to_luma16();
        Self::from_luma16(&image, size_x, size_y, h_min, h_max, delta)
    }

    /// Map an in-memory 16-bit grayscale image onto a centred patch.
    ///
    /// # Errors
    ///
    /// Returns an error if the image is empty or the patch is invalid.
    pub fn from_luma16(
        image: &ImageBuffer<Luma<u16>, Vec<u16>>,
        size_x: f64,
        size_y: f64,
        h_min: f64,
        h_max: f64,
        delta: f64,
    ) -> Result<Self> {
        let (w, h) = image.dimensions();
        if w == 0 || h == 0 {
            return Err(TerrainError::invalid_grid("height-map image is empty"));
        }
        if h_max < h_min {
            return Err(TerrainError::invalid_parameters(format!(
                "h_max ({h_max}) is below h_min ({h_min})"
            )));
        }

        let pixel = |px: u32, py: u32| f64::from(image.get_pixel(px, py).0[0]) / f64::from(u16::MAX);
        let w_max = f64::from(w - 1);
        let h_max_px = f64::from(h - 1);

        Self::from_fn(size_x, size_y, delta, |x, y| {
            // Normalized patch coordinates in [0, 1]
            let u = (x / size_x + 0.5).clamp(0.0, 1.0);
            let v = (y / size_y + 0.5).clamp(0.0, 1.0);

            let fx = u * w_max;
            let fy = (1.0 - v) * h_max_px;
            let x0 = fx.floor() as u32;
            let y0 = fy.floor() as u32;
            let x1 = (x0 + 1).min(w - 1);
            let y1 = (y0 + 1).min(h - 1);
            let tx = fx - f64::from(x0);
            let ty = fy - f64::from(y0);

            let top = pixel(x0, y0) + tx * (pixel(x1, y0) - pixel(x0, y0));
            let bottom = pixel(x0, y1) + tx * (pixel(x1, y1) - pixel(x0, y1));
            let gray = top + ty * (bottom - top);

            h_min + gray * (h_max - h_min)
        })
    }

    /// Number of nodes along X.
    #[must_use]
    pub fn nx(&self) -> usize {
        self.nx
    }

    /// Number of nodes along Y.
    #[must_use]
    pub fn ny(&self) -> usize {
        self.ny
    }

    /// Total number of nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.heights.len()
    }

    /// Whether the grid has no nodes (never true for a constructed grid).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.heights.is_empty()
    }

    /// Node spacing in meters.
    #[must_use]
    pub fn cell_size(&self) -> f64 {
        self.cell_size
    }

    /// World-space bounds of the grid in XY: `((min_x, min_y), (max_x, max_y))`.
    #[must_use]
    pub fn bounds(&self) -> ((f64, f64), (f64, f64)) {
        (
            (self.origin_x, self.origin_y),
            (
                self.origin_x + (self.nx - 1) as f64 * self.cell_size,
                self.origin_y + (self.ny - 1) as f64 * self.cell_size,
            ),
        )
    }

    /// Whether a world-space XY point lies over the grid.
    #[must_use]
    pub fn contains(&self, x: f64, y: f64) -> bool {
        let ((x0, y0), (x1, y1)) = self.bounds();
        x >= x0 && x <= x1 && y >= y0 && y <= y1
    }

    /// Minimum height over the grid.
    #[must_use]
    pub fn min_height(&self) -> f64 {
        self.heights.iter().copied().fold(f64::INFINITY, f64::min)
    }

    /// Maximum height over the grid.
    #[must_use]
    pub fn max_height(&self) -> f64 {
        self.heights.iter().copied().fold(f64::NEG_INFINITY, f64::max)
    }

    /// Flat index of node `(i, j)`.
    #[must_use]
    pub fn index(&self, i: usize, j: usize) -> usize {
        j * self.nx + i
    }

    /// Height at node `(i, j)`, `None` if out of bounds.
    #[must_use]
    pub fn get(&self, i: usize, j: usize) -> Option<f64> {
        (i < self.nx && j < self.ny).then(|| self.heights[self.index(i, j)])
    }

    /// Height at flat index `idx`.
    #[must_use]
    pub fn at(&self, idx: usize) -> f64 {
        self.heights[idx]
    }

    /// Set the height at flat index `idx`.
    pub fn set_at(&mut self, idx: usize, height: f64) {
        self.heights[idx] = height;
    }

    /// World-space position of node `(i, j)`.
    #[must_use]
    pub fn node_position(&self, i: usize, j: usize) -> Option<Point3<f64>> {
        let h = self.get(i, j)?;
        Some(Point3::new(
            self.origin_x + i as f64 * self.cell_size,
            self.origin_y + j as f64 * self.cell_size,
            h,
        ))
    }

    /// World X coordinate of column `i`.
    #[must_use]
    pub fn node_x(&self, i: usize) -> f64 {
        self.origin_x + i as f64 * self.cell_size
    }

    /// World Y coordinate of row `j`.
    #[must_use]
    pub fn node_y(&self, j: usize) -> f64 {
        self.origin_y + j as f64 * self.cell_size
    }

    /// Inclusive node index ranges covering the world-space XY box, clamped
    /// to the grid. `None` if the box misses the grid entirely.
    #[must_use]
    pub fn node_range(
        &self,
        min: (f64, f64),
        max: (f64, f64),
    ) -> Option<((usize, usize), (usize, usize))> {
        let ((x0, y0), (x1, y1)) = self.bounds();
        if max.0 < x0 || max.1 < y0 || min.0 > x1 || min.1 > y1 {
            return None;
        }
        // Small slack so nodes lying exactly on the box edge are kept
        let first = |x: f64, lo: f64, n: usize| -> usize {
            ((((x - lo) / self.cell_size) - 1e-9).ceil().max(0.0) as usize).min(n - 1)
        };
        let last = |x: f64, lo: f64, n: usize| -> usize {
            ((((x - lo) / self.cell_size) + 1e-9).floor().max(0.0) as usize).min(n - 1)
        };
        let (i0, i1) = (first(min.0, x0, self.nx), last(max.0, x0, self.nx));
        let (j0, j1) = (first(min.1, y0, self.ny), last(max.1, y0, self.ny));
        if i0 > i1 || j0 > j1 {
            return None;
        }
        Some(((i0, i1), (j0, j1)))
    }

    /// Bilinear height at world-space `(x, y)`, clamped to the grid edges.
    #[must_use]
    pub fn sample(&self, x: f64, y: f64) -> f64 {
        let ((x0, y0), (x1, y1)) = self.bounds();
        let gx = (x.clamp(x0, x1) - x0) / self.cell_size;
        let gy = (y.clamp(y0, y1) - y0) / self.cell_size;

        let i0 = (gx.floor() as usize).min(self.nx - 1);
        let j0 = (gy.floor() as usize).min(self.ny - 1);
        let i1 = (i0 + 1).min(self.nx - 1);
        let j1 = (j0 + 1).min(self.ny - 1);

        let fx = gx - i0 as f64;
        let fy = gy - j0 as f64;

        let h00 = self.heights[self.index(i0, j0)];
        let h10 = self.heights[self.index(i1, j0)];
        let h01 = self.heights[self.index(i0, j1)];
        let h11 = self.heights[self.index(i1, j1)];

        let h0 = h00 + fx * (h10 - h00);
        let h1 = h01 + fx * (h11 - h01);
        h0 + fy * (h1 - h0)
    }

    /// Surface normal at world-space `(x, y)` from central differences.
    #[must_use]
    pub fn normal(&self, x: f64, y: f64) -> Vector3<f64> {
        let eps = self.cell_size;
        let dx = (self.sample(x + eps, y) - self.sample(x - eps, y)) / (2.0 * eps);
        let dy = (self.sample(x, y + eps) - self.sample(x, y - eps)) / (2.0 * eps);
        Vector3::new(-dx, -dy, 1.0).normalize()
    }
}

/// Node counts for a patch of the given size and spacing.
fn grid_dims(size_x: f64, size_y: f64, delta: f64) -> Result<(usize, usize)> {
    if !delta.is_finite() || delta <= 0.0 {
        return Err(TerrainError::invalid_grid(format!(
            "grid spacing must be positive, got {delta}"
        )));
    }
    if !(size_x.is_finite() && size_y.is_finite()) || size_x <= 0.0 || size_y <= 0.0 {
        return Err(TerrainError::invalid_grid(format!(
            "patch size must be positive, got {size_x}x{size_y}"
        )));
    }
    let nx = (size_x / delta).round() as usize + 1;
    let ny = (size_y / delta).round() as usize + 1;
    if nx.saturating_mul(ny) > MAX_NODES {
        return Err(TerrainError::invalid_grid(format!(
            "{nx}x{ny} nodes exceeds the limit of {MAX_NODES}"
        )));
    }
    Ok((nx.max(2), ny.max(2)))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_flat_patch_is_centred() {
        let hf = HeightField::flat(4.0, 2.0, 0.5, 1.5).unwrap();
        assert_eq!(hf.nx(), 9);
        assert_eq!(hf.ny(), 5);
        let ((x0, y0), (x1, y1)) = hf.bounds();
        assert_relative_eq!(x0, -2.0);
        assert_relative_eq!(x1, 2.0);
        assert_relative_eq!(y0, -1.0);
        assert_relative_eq!(y1, 1.0);
        assert_relative_eq!(hf.sample(0.3, -0.7), 1.5);
        assert_relative_eq!(hf.normal(0.0, 0.0).z, 1.0);

        let corner = hf.node_position(8, 4).unwrap();
        assert_relative_eq!(corner, Point3::new(2.0, 1.0, 1.5));
        assert!(hf.node_position(9, 0).is_none());
    }

    #[test]
    fn test_bilinear_sampling_of_plane() {
        // z = 0.5 x + 0.25 y is reproduced exactly by bilinear interpolation
        let hf = HeightField::from_fn(10.0, 10.0, 1.0, |x, y| 0.5 * x + 0.25 * y).unwrap();
        assert_relative_eq!(hf.sample(1.3, -2.7), 0.5 * 1.3 - 0.25 * 2.7, epsilon = 1e-12);

        let n = hf.normal(0.0, 0.0);
        let expected = Vector3::new(-0.5, -0.25, 1.0).normalize();
        assert_relative_eq!(n, expected, epsilon = 1e-12);
    }

    #[test]
    fn test_sampling_clamps_outside() {
        let hf = HeightField::from_fn(2.0, 2.0, 1.0, |x, _| x).unwrap();
        assert_relative_eq!(hf.sample(100.0, 0.0), 1.0);
        assert_relative_eq!(hf.sample(-100.0, 0.0), -1.0);
        assert!(!hf.contains(1.5, 0.0));
        assert!(hf.contains(1.0, 1.0));
    }

    #[test]
    fn test_bump_peak_and_edges() {
        let hf = HeightField::bump(10.0, 10.0, 0.1, 0.4).unwrap();
        assert_relative_eq!(hf.sample(0.0, 0.0), 0.4, epsilon = 1e-9);
        assert_relative_eq!(hf.sample(4.9, 4.9), 0.0);
        assert_relative_eq!(hf.max_height(), 0.4, epsilon = 1e-9);
        assert_relative_eq!(hf.min_height(), 0.0);
    }

    #[test]
    fn test_node_range() {
        let hf = HeightField::flat(10.0, 10.0, 1.0, 0.0).unwrap();
        let ((i0, i1), (j0, j1)) = hf.node_range((-0.5, -0.5), (1.5, 0.5)).unwrap();
        assert_eq!((hf.node_x(i0), hf.node_x(i1)), (0.0, 1.0));
        assert_eq!((hf.node_y(j0), hf.node_y(j1)), (0.0, 0.0));

        assert!(hf.node_range((20.0, 20.0), (21.0, 21.0)).is_none());

        // Clamped to the grid
        let ((i0, i1), _) = hf.node_range((-50.0, -1.0), (50.0, 1.0)).unwrap();
        assert_eq!((i0, i1), (0, 10));
    }

    #[test]
    fn test_invalid_grids() {
        assert!(HeightField::flat(1.0, 1.0, 0.0, 0.0).is_err());
        assert!(HeightField::flat(-1.0, 1.0, 0.1, 0.0).is_err());
        assert!(HeightField::new(vec![0.0; 3], 2, 2, 1.0, (0.0, 0.0)).is_err());
        assert!(HeightField::new(vec![0.0; 2], 2, 1, 1.0, (0.0, 0.0)).is_err());
        assert!(HeightField::new(vec![f64::NAN; 4], 2, 2, 1.0, (0.0, 0.0)).is_err());
        assert!(HeightField::flat(1e6, 1e6, 0.01, 0.0).is_err());
    }

    #[test]
    fn test_from_luma16_maps_gray_levels() {
        // Left half black, right half white
        let image = ImageBuffer::from_fn(8, 8, |x, _| {
            if x < 4 { Luma([0u16]) } else { Luma([u16::MAX]) }
        });
        let hf = HeightField::from_luma16(&image, 8.0, 8.0, -1.0, 2.0, 0.5).unwrap();
        assert_relative_eq!(hf.sample(-4.0, 0.0), -1.0, epsilon = 1e-12);
        assert_relative_eq!(hf.sample(4.0, 0.0), 2.0, epsilon = 1e-12);
        assert!(hf.min_height() >= -1.0 && hf.max_height() <= 2.0);
    }

    #[test]
    fn test_from_luma16_rejects_inverted_range() {
        let image = ImageBuffer::from_pixel(2, 2, Luma([0u16]));
        assert!(HeightField::from_luma16(&image, 1.0, 1.0, 1.0, 0.0, 0.1).is_err());
    }
}
