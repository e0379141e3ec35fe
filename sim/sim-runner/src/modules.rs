//! Assemble the modules of a run from its configuration.

use nalgebra::{Point3, Vector3};
use sim_driver::{Driver, Path, PathFollowerDriver, PlaybackDriver, StraightLinePath};
use sim_terrain::{RigidTerrain, ScmTerrain, Terrain};
use sim_vehicle::{Tire, Vehicle, WheeledVehicle, hmmwv};
use sim_vis::{Negotiated, VisualSystem};
use tracing::info;

use crate::config::{DriverConfig, RunConfig, TerrainModel};
use crate::error::Result;

/// Length of the straight path laid ahead of the vehicle when no waypoints
/// are configured (m).
const STRAIGHT_PATH_LENGTH: f64 = 100.0;

/// Modules of one run, ready for [`SimulationLoop::new`](crate::SimulationLoop::new).
pub struct Modules {
    /// HMMWV placed at its start pose.
    pub vehicle: WheeledVehicle,
    /// Initialized terrain.
    pub terrain: Box<dyn Terrain>,
    /// Driver.
    pub driver: Box<dyn Driver>,
    /// Visual system.
    pub vis: Box<dyn VisualSystem>,
    /// Backend negotiation outcome.
    pub negotiated: Negotiated,
}

impl std::fmt::Debug for Modules {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Modules")
            .field("vehicle", &self.vehicle.name())
            .field("terrain", &self.terrain.kind())
            .field("negotiated", &self.negotiated)
            .finish_non_exhaustive()
    }
}

/// Build the terrain, place the vehicle on it, and create the driver and
/// visual system.
pub fn build_modules(config: &RunConfig) -> Result<Modules> {
    config.validate()?;

    let terrain = build_terrain(config)?;

    let tire = Tire {
        tire_type: config.vehicle.tire_type,
        material: config.vehicle.tire_material,
    };
    let mut vehicle = hmmwv(tire, config.vehicle.drive_type, config.step.step_size)?;
    let pose = config
        .vehicle
        .initial_pose(&config.terrain.patch, |x, y| terrain.height(x, y));
    vehicle.initialize(pose);
    info!(
        x = pose.translation.x,
        y = pose.translation.y,
        z = pose.translation.z,
        "vehicle placed"
    );

    let driver: Box<dyn Driver> = match &config.driver {
        DriverConfig::Sine(sine) => Box::new(sine.clone()),
        DriverConfig::Path { waypoints, params } => {
            let path = if waypoints.is_empty() {
                let start = Point3::from(pose.translation.vector);
                let heading = pose.rotation * Vector3::x();
                StraightLinePath::new(start, start + heading * STRAIGHT_PATH_LENGTH).into_path()?
            } else {
                Path::new(waypoints.clone())?
            };
            Box::new(PathFollowerDriver::new(path, *params)?)
        }
        DriverConfig::Playback { file } => Box::new(PlaybackDriver::from_file(file)?),
    };
    info!(driver = config.driver.name(), "driver ready");

    let (negotiated, vis) = sim_vis::create(&config.vis_config())?;

    Ok(Modules {
        vehicle,
        terrain,
        driver,
        vis,
        negotiated,
    })
}

fn build_terrain(config: &RunConfig) -> Result<Box<dyn Terrain>> {
    let tc = &config.terrain;
    let terrain: Box<dyn Terrain> = match tc.model {
        TerrainModel::Scm => {
            let (lo, hi) = tc.plot_range;
            let mut scm = ScmTerrain::new(tc.soil)?.with_plot_range(lo, hi);
            scm.initialize(&tc.patch, tc.delta)?;
            for patch in &tc.moving_patches {
                scm.add_moving_patch(*patch);
            }
            Box::new(scm)
        }
        TerrainModel::Rigid => {
            let surface = tc.patch.build(tc.delta)?;
            info!(patch = tc.patch.name(), "rigid terrain initialized");
            Box::new(RigidTerrain::from_heightfield(surface))
        }
    };
    Ok(terrain)
}
