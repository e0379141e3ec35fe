//! What a visual system draws each frame.

use sim_terrain::Terrain;
use sim_types::VehicleState;

/// Borrowed view of the simulation for one render call.
///
/// Visual systems only read the scene; the vehicle and terrain stay the
/// source of truth.
#[derive(Clone, Copy)]
pub struct Scene<'a> {
    /// Vehicle snapshot.
    pub vehicle: &'a VehicleState,
    /// Ground to draw under the vehicle.
    pub terrain: &'a dyn Terrain,
}

impl<'a> Scene<'a> {
    /// Create a scene.
    #[must_use]
    pub fn new(vehicle: &'a VehicleState, terrain: &'a dyn Terrain) -> Self {
        Self { vehicle, terrain }
    }
}

impl std::fmt::Debug for Scene<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scene")
            .field("vehicle", self.vehicle)
            .field("terrain", &self.terrain.kind())
            .finish()
    }
}
