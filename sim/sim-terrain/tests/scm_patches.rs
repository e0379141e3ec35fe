//! SCM terrain over real patch profiles.
//!
//! Verifies:
//! - Height-map images map gray levels onto `[h_min, h_max]`
//! - A wheel rolling across the soil leaves a continuous rut
//! - Moving patches confine deformation to the tracked body's neighbourhood

use approx::assert_relative_eq;
use image::{ImageBuffer, Luma};
use nalgebra::{Isometry3, Point3, Vector3};
use sim_terrain::{
    MovingPatch, PatchAnchor, PatchType, ScmTerrain, SoilParameters, Terrain, WheelQuery,
};

const RADIUS: f64 = 0.47;
const WIDTH: f64 = 0.3;
const LOAD: f64 = 6000.0;

fn rolling_query(x: f64, terrain: &ScmTerrain) -> WheelQuery {
    let z = terrain.height(x, 0.0) + RADIUS - 0.01;
    WheelQuery::at(Point3::new(x, 0.0, z), RADIUS, WIDTH)
        .with_load(LOAD)
        .with_body(1)
}

// ============================================================================
// Height-map loading
// ============================================================================

#[test]
fn heightmap_image_sets_initial_profile() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("ramp.png");

    // Gray ramp from black (left) to white (right)
    let image: ImageBuffer<Luma<u8>, Vec<u8>> =
        ImageBuffer::from_fn(64, 16, |x, _| Luma([u8::try_from(x * 255 / 63).unwrap_or(255)]));
    image.save(&path).expect("write height map");

    let mut terrain = ScmTerrain::new(SoilParameters::default()).expect("soil");
    terrain
        .initialize(
            &PatchType::HeightMap {
                path,
                size_x: 8.0,
                size_y: 2.0,
                h_min: 0.0,
                h_max: 0.5,
            },
            0.05,
        )
        .expect("initialize from image");

    assert_relative_eq!(terrain.height(-4.0, 0.0), 0.0, epsilon = 1e-9);
    assert_relative_eq!(terrain.height(4.0, 0.0), 0.5, epsilon = 1e-9);
    assert_relative_eq!(terrain.height(0.0, 0.0), 0.25, epsilon = 0.01);
    // Slope rises toward +X
    assert!(terrain.normal(0.0, 0.0).x < 0.0);
    assert_eq!(terrain.sinkage(0.0, 0.0), 0.0);
}

// ============================================================================
// Rolling wheel
// ============================================================================

#[test]
fn rolling_wheel_leaves_continuous_rut() {
    let mut terrain = ScmTerrain::new(SoilParameters::default()).expect("soil");
    terrain
        .initialize(
            &PatchType::Flat {
                size_x: 10.0,
                size_y: 4.0,
            },
            0.05,
        )
        .expect("flat patch");

    let mut x = -3.0;
    let mut total_modified = 0;
    while x < 3.0 {
        terrain.synchronize(0.0);
        terrain.begin_contacts(&[Isometry3::translation(x, 0.0, 1.0)]);
        let query = rolling_query(x, &terrain);
        let contact = terrain.contact(&query).expect("wheel touches soil");
        terrain.end_contacts();
        terrain.advance(0.003);

        assert!(contact.sinkage > 0.0);
        total_modified += terrain.statistics().expect("stats").modified_nodes;
        x += 0.05;
    }
    assert!(total_modified > 0);

    // Every point along the track was pressed, the sides were not
    let mut probe = -2.5;
    while probe < 2.5 {
        assert!(terrain.sinkage(probe, 0.0) > 0.005, "no rut at x = {probe}");
        probe += 0.25;
    }
    assert_eq!(terrain.sinkage(0.0, 1.5), 0.0);
}

#[test]
fn moving_patch_follows_the_chassis() {
    let mut terrain = ScmTerrain::new(SoilParameters::default()).expect("soil");
    terrain
        .initialize(&PatchType::default(), 0.1)
        .expect("bump patch");
    terrain.add_moving_patch(MovingPatch::new(
        PatchAnchor::Chassis,
        Vector3::zeros(),
        Vector3::new(5.0, 3.0, 1.0),
    ));

    // Wheel far from the chassis: felt as ground, not deformed
    terrain.synchronize(0.0);
    terrain.begin_contacts(&[Isometry3::translation(-15.0, -15.0, 1.0)]);
    let far = rolling_query(10.0, &terrain);
    let before = terrain.height(10.0, 0.0);
    assert!(terrain.contact(&far).is_some());
    terrain.end_contacts();
    assert_relative_eq!(terrain.height(10.0, 0.0), before);
    let stats = terrain.statistics().expect("stats");
    assert_eq!(stats.ray_casts, 0);
    assert!(stats.active_nodes > 0 && stats.active_nodes < 401 * 401);

    // Chassis moved over the wheel: now it deforms
    terrain.synchronize(0.003);
    terrain.begin_contacts(&[Isometry3::translation(10.0, 0.0, 1.0)]);
    let near = rolling_query(10.0, &terrain);
    assert!(terrain.contact(&near).is_some());
    terrain.end_contacts();
    assert!(terrain.height(10.0, 0.0) < before);
    assert!(terrain.statistics().expect("stats").modified_nodes > 0);
}
