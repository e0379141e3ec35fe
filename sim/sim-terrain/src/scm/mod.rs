//! Soil contact model (SCM) for deformable terrain.
//!
//! The soil is a height grid whose nodes sink under wheel pressure. Contact
//! is restricted each step to the moving patches that follow the vehicle.

mod patch;
mod soil;
mod stats;
mod terrain;

pub use patch::{MovingPatch, PatchAnchor};
pub use soil::SoilParameters;
pub use stats::StepStatistics;
pub use terrain::ScmTerrain;
