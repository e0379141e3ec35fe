//! Terrain patch profiles.

use std::path::PathBuf;

use crate::error::Result;
use crate::heightfield::HeightField;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Initial profile of a terrain patch. Every patch is centred on the origin.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "type", rename_all = "snake_case"))]
pub enum PatchType {
    /// Flat rectangle at height zero.
    Flat {
        /// Extent along X (m).
        size_x: f64,
        /// Extent along Y (m).
        size_y: f64,
    },
    /// Grayscale height-map image stretched over the patch.
    HeightMap {
        /// Image file (any format the `image` crate decodes).
        path: PathBuf,
        /// Extent along X (m).
        size_x: f64,
        /// Extent along Y (m).
        size_y: f64,
        /// Height of black pixels (m).
        h_min: f64,
        /// Height of white pixels (m).
        h_max: f64,
    },
    /// Procedural single mound in the middle of the patch.
    Bump {
        /// Extent along X (m).
        size_x: f64,
        /// Extent along Y (m).
        size_y: f64,
        /// Peak height (m).
        height: f64,
    },
}

impl Default for PatchType {
    fn default() -> Self {
        Self::Bump {
            size_x: 40.0,
            size_y: 40.0,
            height: 1.0,
        }
    }
}

impl PatchType {
    /// Short lowercase name, for logging.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Flat { .. } => "flat",
            Self::HeightMap { .. } => "heightmap",
            Self::Bump { .. } => "bump",
        }
    }

    /// Patch extent `(size_x, size_y)` in meters.
    #[must_use]
    pub fn size(&self) -> (f64, f64) {
        match *self {
            Self::Flat { size_x, size_y }
            | Self::HeightMap { size_x, size_y, .. }
            | Self::Bump { size_x, size_y, .. } => (size_x, size_y),
        }
    }

    /// Sample the profile on a grid with node spacing `delta`.
    pub fn build(&self, delta: f64) -> Result<HeightField> {
        match self {
            Self::Flat { size_x, size_y } => HeightField::flat(*size_x, *size_y, delta, 0.0),
            Self::HeightMap {
                path,
                size_x,
                size_y,
                h_min,
                h_max,
            } => HeightField::from_image(path, *size_x, *size_y, *h_min, *h_max, delta),
            Self::Bump {
                size_x,
                size_y,
                height,
            } => HeightField::bump(*size_x, *size_y, delta, *height),
        }
    }
}
