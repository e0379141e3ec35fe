//! HMMWV preset on rigid and deformable ground.
//!
//! Verifies:
//! - The preset settles near its design ride height on flat rigid ground
//! - On SCM soil the wheels sink and leave ruts
//! - Throttle drives the vehicle forward through soft soil
//! - The same vehicle runs against either terrain behind `dyn Terrain`

use nalgebra::{Isometry3, Vector3};
use sim_terrain::{
    MovingPatch, PatchAnchor, PatchType, RigidTerrain, ScmTerrain, SoilParameters, Terrain,
};
use sim_types::DriverInputs;
use sim_vehicle::{DriveType, GRAVITY, Tire, TireType, Vehicle, WheeledVehicle, hmmwv};

const STEP: f64 = 3e-3;

fn run(vehicle: &mut WheeledVehicle, terrain: &mut dyn Terrain, inputs: DriverInputs, steps: usize) {
    for _ in 0..steps {
        let time = vehicle.time();
        terrain.synchronize(time);
        vehicle.synchronize(time, &inputs, terrain);
        vehicle.advance(STEP).expect("vehicle advance");
        terrain.advance(STEP);
    }
}

fn soft_soil() -> ScmTerrain {
    let mut terrain = ScmTerrain::new(SoilParameters::default()).expect("soil");
    terrain
        .initialize(
            &PatchType::Flat {
                size_x: 24.0,
                size_y: 8.0,
            },
            0.1,
        )
        .expect("initialize");
    terrain.add_moving_patch(MovingPatch::new(
        PatchAnchor::Chassis,
        Vector3::zeros(),
        Vector3::new(5.0, 3.0, 1.0),
    ));
    terrain
}

// ============================================================================
// Rigid ground
// ============================================================================

#[test]
fn settles_at_ride_height_on_rigid_ground() {
    let mut vehicle = hmmwv(Tire::default(), DriveType::Awd, STEP).expect("preset");
    let mut terrain = RigidTerrain::flat(0.0);
    vehicle.initialize(Isometry3::translation(0.0, 0.0, 0.6));
    run(&mut vehicle, &mut terrain, DriverInputs::ZERO, 1500);

    let state = vehicle.state();
    assert!((state.position().z - 0.6).abs() < 0.03, "z = {}", state.position().z);
    assert!(state.linear_velocity.norm() < 1e-2);

    let total: f64 = state.wheels.iter().map(|w| w.normal_load).sum();
    let weight = vehicle.mass() * GRAVITY;
    assert!((total - weight).abs() < 0.02 * weight, "{total} vs {weight}");
    assert!(state.wheels.iter().all(|w| w.sinkage == 0.0));

    // At rest the ground carries the full weight.
    let lift = vehicle.applied_force().z;
    assert!((lift - weight).abs() < 0.03 * weight, "{lift} vs {weight}");
    assert!(vehicle.chassis_state().angular_velocity.norm() < 1e-2);
}

// ============================================================================
// Deformable soil
// ============================================================================

#[test]
fn wheels_sink_into_soft_soil() {
    let mut vehicle = hmmwv(Tire::default(), DriveType::Awd, STEP).expect("preset");
    let mut terrain = soft_soil();
    vehicle.initialize(Isometry3::translation(-5.0, 0.0, 0.6));
    run(&mut vehicle, &mut terrain, DriverInputs::ZERO, 1000);

    let state = vehicle.state();
    assert!(state.wheels.iter().all(|w| w.in_contact));
    assert!(state.mean_sinkage() > 0.0);
    assert!(state.position().z < 0.6);

    // The ground under each wheel is lower than where it started
    for wheel in &state.wheels {
        assert!(terrain.sinkage(wheel.center.x, wheel.center.y) > 0.0);
    }
}

#[test]
fn throttle_drives_through_soft_soil() {
    let tire = Tire {
        tire_type: TireType::Lugged,
        ..Tire::default()
    };
    let mut vehicle = hmmwv(tire, DriveType::Awd, STEP).expect("preset");
    let mut terrain = soft_soil();
    vehicle.initialize(Isometry3::translation(-5.0, 0.0, 0.6));
    run(&mut vehicle, &mut terrain, DriverInputs::ZERO, 500);
    let start = vehicle.state().position();

    run(&mut vehicle, &mut terrain, DriverInputs::new(0.5, 0.0, 0.0), 1000);
    let state = vehicle.state();
    assert!(state.position().x - start.x > 0.5, "moved {}", state.position().x - start.x);
    assert!(state.speed() > 0.0);
    assert!((state.position().y - start.y).abs() < 0.1);
    assert!(state.wheels.iter().any(|w| w.tractive_force > 0.0));

    let stats = terrain.statistics().expect("SCM statistics");
    assert_eq!(stats.contact_patches, 4);
    assert!(stats.active_nodes > 0);
}
