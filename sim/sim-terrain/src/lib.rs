//! Terrain models for wheeled vehicles.
//!
//! This crate provides the ground a vehicle drives on:
//!
//! - [`Terrain`] - Trait every terrain implements (surface queries, wheel contact, stepping)
//! - [`RigidTerrain`] - Non-deformable plane or height field with Coulomb traction
//! - [`ScmTerrain`] - Deformable soil contact model (Bekker, Mohr-Coulomb, Janosi)
//! - [`HeightField`] - Regular height grid with bilinear sampling
//! - [`PatchType`] - Initial patch profiles (flat, height-map image, procedural bump)
//!
//! # Contact Pass
//!
//! Once per tick the vehicle calls, in order:
//!
//! ```text
//! terrain.begin_contacts(&tracked_poses);   // chassis first, then wheels
//! for wheel in wheels {
//!     terrain.contact(&query)               // Option<WheelContact>
//! }
//! terrain.end_contacts();
//! ```
//!
//! The loop brackets this with `synchronize(time)` before and `advance(dt)`
//! after.
//!
//! # Coordinate System
//!
//! - Z up, heights in meters
//! - Patches are centred on the world origin

#![deny(clippy::unwrap_used, clippy::expect_used)]
#![warn(missing_docs)]
#![allow(
    clippy::missing_const_for_fn,
    clippy::suboptimal_flops,
    clippy::missing_errors_doc,
    clippy::module_name_repetitions,
)]

mod contact;
mod error;
mod heightfield;
mod patch;
mod rigid;
pub mod scm;

use nalgebra::{Isometry3, Vector3};

pub use contact::{CONTACT_SLOP, WheelContact, WheelQuery};
pub use error::{Result, TerrainError};
pub use heightfield::HeightField;
pub use patch::PatchType;
pub use rigid::{DEFAULT_ROLLING_RESISTANCE, RigidTerrain};
pub use scm::{MovingPatch, PatchAnchor, ScmTerrain, SoilParameters, StepStatistics};

/// Which terrain model is behind a `dyn Terrain`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerrainKind {
    /// Non-deformable ground.
    Rigid,
    /// Deformable soil contact model.
    Scm,
}

/// Ground model driven by the simulation loop.
pub trait Terrain {
    /// Terrain model kind.
    fn kind(&self) -> TerrainKind;

    /// Current surface height at `(x, y)`.
    fn height(&self, x: f64, y: f64) -> f64;

    /// Unit surface normal at `(x, y)`.
    fn normal(&self, x: f64, y: f64) -> Vector3<f64>;

    /// Coulomb friction coefficient at `(x, y)`.
    fn friction(&self, x: f64, y: f64) -> f64;

    /// Depth of the surface below its undisturbed level at `(x, y)`.
    fn sinkage(&self, _x: f64, _y: f64) -> f64 {
        0.0
    }

    /// XY bounds of the modelled patch, `None` for unbounded ground.
    fn extent(&self) -> Option<((f64, f64), (f64, f64))> {
        None
    }

    /// Sinkage range for false-colour plots, `None` if sinkage is not plotted.
    fn sinkage_plot_range(&self) -> Option<(f64, f64)> {
        None
    }

    /// Start a contact pass with the poses of the tracked bodies
    /// (chassis first, then wheels).
    fn begin_contacts(&mut self, bodies: &[Isometry3<f64>]);

    /// Resolve contact for one wheel.
    fn contact(&mut self, query: &WheelQuery) -> Option<WheelContact>;

    /// Finish the contact pass.
    fn end_contacts(&mut self) {}

    /// Bring the terrain to simulation time `time`.
    fn synchronize(&mut self, time: f64);

    /// Advance the terrain state by `dt`.
    fn advance(&mut self, dt: f64);

    /// Statistics of the last step, if the model keeps any.
    fn statistics(&self) -> Option<&StepStatistics> {
        None
    }
}

impl<T: Terrain + ?Sized> Terrain for Box<T> {
    fn kind(&self) -> TerrainKind {
        (**self).kind()
    }

    fn height(&self, x: f64, y: f64) -> f64 {
        (**self).height(x, y)
    }

    fn normal(&self, x: f64, y: f64) -> Vector3<f64> {
        (**self).normal(x, y)
    }

    fn friction(&self, x: f64, y: f64) -> f64 {
        (**self).friction(x, y)
    }

    fn sinkage(&self, x: f64, y: f64) -> f64 {
        (**self).sinkage(x, y)
    }

    fn extent(&self) -> Option<((f64, f64), (f64, f64))> {
        (**self).extent()
    }

    fn sinkage_plot_range(&self) -> Option<(f64, f64)> {
        (**self).sinkage_plot_range()
    }

    fn begin_contacts(&mut self, bodies: &[Isometry3<f64>]) {
        (**self).begin_contacts(bodies);
    }

    fn contact(&mut self, query: &WheelQuery) -> Option<WheelContact> {
        (**self).contact(query)
    }

    fn end_contacts(&mut self) {
        (**self).end_contacts();
    }

    fn synchronize(&mut self, time: f64) {
        (**self).synchronize(time);
    }

    fn advance(&mut self, dt: f64) {
        (**self).advance(dt);
    }

    fn statistics(&self) -> Option<&StepStatistics> {
        (**self).statistics()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use nalgebra::Point3;

    fn drive_over(terrain: &mut dyn Terrain) -> Option<WheelContact> {
        terrain.synchronize(0.0);
        terrain.begin_contacts(&[Isometry3::identity()]);
        let query = WheelQuery::at(Point3::new(0.0, 0.0, 0.46), 0.47, 0.3).with_load(5000.0);
        let contact = terrain.contact(&query);
        terrain.end_contacts();
        terrain.advance(0.003);
        contact
    }

    #[test]
    fn test_terrains_behind_trait_object() {
        let mut rigid = RigidTerrain::flat(0.0);
        let hard = drive_over(&mut rigid).unwrap();
        assert_eq!(rigid.kind(), TerrainKind::Rigid);
        assert_eq!(hard.sinkage, 0.0);
        assert!(rigid.extent().is_none());
        assert!(rigid.sinkage_plot_range().is_none());

        let mut soil = ScmTerrain::new(SoilParameters::default()).unwrap();
        soil.initialize(
            &PatchType::Flat {
                size_x: 4.0,
                size_y: 4.0,
            },
            0.05,
        )
        .unwrap();
        let soft = drive_over(&mut soil).unwrap();
        assert_eq!(soil.kind(), TerrainKind::Scm);
        assert!(soft.sinkage > hard.sinkage);
        assert!(soft.rolling_resistance > 0.0);
        assert!(soil.statistics().is_some());
        assert!(soil.extent().is_some());
    }
}
