//! Short end-to-end runs with the real modules.
//!
//! Verifies:
//! - The sample configuration builds and runs on a small flat patch
//! - Frames land in `<out_dir>/IMG` as consecutive `img_###.jpg` files
//! - Telemetry, recorded inputs and the summary are written
//! - Recorded inputs replay through the playback driver

use std::fs;
use std::path::Path;

use sim_runner::{
    DriverConfig, RunConfig, SUMMARY_FILE_NAME, SimulationLoop, TELEMETRY_FILE_NAME,
    TELEMETRY_HEADER, build_modules,
};
use sim_terrain::PatchType;
use sim_vis::Backend;

fn short_run(dir: &Path) -> RunConfig {
    let mut config = RunConfig::default()
        .with_out_dir(dir.join("HMMWV_DEF_SOIL"))
        .with_end_time(0.1)
        .with_patch(PatchType::Flat {
            size_x: 16.0,
            size_y: 8.0,
        });
    config.visual.width = 64;
    config.visual.height = 48;
    config
}

fn run(config: &RunConfig) -> sim_runner::LoopReport {
    let modules = build_modules(config).expect("modules");
    let mut sim = SimulationLoop::new(
        config,
        modules.vehicle,
        modules.terrain,
        modules.driver,
        modules.vis,
    )
    .expect("loop");
    sim.run().expect("run")
}

// ============================================================================
// Frames
// ============================================================================

#[test]
fn raster_run_writes_frames() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = short_run(dir.path()).with_img_output(true);
    let report = run(&config);

    assert_eq!(report.steps, 34);
    assert_eq!(report.frames, 9);
    assert!((report.final_time - 0.102).abs() < 1e-9);

    let img_dir = dir.path().join("HMMWV_DEF_SOIL").join("IMG");
    let mut names: Vec<String> = fs::read_dir(&img_dir)
        .expect("IMG dir")
        .map(|e| e.expect("entry").file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    let expected: Vec<String> = (1..=9).map(|n| format!("img_{n:03}.jpg")).collect();
    assert_eq!(names, expected);

    let frame = image::open(img_dir.join("img_009.jpg")).expect("decode");
    assert_eq!((frame.width(), frame.height()), (64, 48));
}

#[test]
fn headless_run_skips_frames() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = short_run(dir.path())
        .with_img_output(true)
        .with_backend(Backend::Headless);
    let report = run(&config);

    assert_eq!(report.steps, 34);
    assert_eq!(report.frames, 0);
    assert!(!dir.path().join("HMMWV_DEF_SOIL").join("IMG").exists());
}

// ============================================================================
// Side outputs
// ============================================================================

#[test]
fn telemetry_and_summary() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut config = short_run(dir.path()).with_backend(Backend::Headless);
    config.output.telemetry = true;
    let report = run(&config);

    let out = dir.path().join("HMMWV_DEF_SOIL");
    let csv = fs::read_to_string(out.join(TELEMETRY_FILE_NAME)).expect("telemetry");
    let mut lines = csv.lines();
    assert_eq!(lines.next(), Some(TELEMETRY_HEADER));
    assert_eq!(lines.count(), 34);

    let summary = fs::read_to_string(out.join(SUMMARY_FILE_NAME)).expect("summary");
    assert_eq!(summary, report.to_string());
    assert!(summary.contains("Steps:         34"));
    assert!(report.vehicle_mass > 2000.0);
}

#[test]
fn recorded_inputs_replay() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut config = short_run(dir.path())
        .with_backend(Backend::Headless)
        .with_end_time(1.0);
    config.output.record_inputs = true;
    run(&config);

    let recording = dir
        .path()
        .join("HMMWV_DEF_SOIL")
        .join(sim_driver::INPUTS_FILE_NAME);
    let playback = sim_driver::PlaybackDriver::from_file(&recording).expect("playback");
    assert_eq!(playback.samples().len(), 334);

    // The sine-steer throttle ramp starts after the 0.5 s delay.
    let sine = sim_driver::SineSteerDriver::new(0.5);
    for time in [0.3, 0.6, 0.9] {
        let replayed = playback.inputs_at(time);
        let expected = sine.inputs_at(time);
        assert!((replayed.throttle - expected.throttle).abs() < 0.02);
        assert!((replayed.steering - expected.steering).abs() < 1e-9);
    }

    let replay = short_run(dir.path())
        .with_out_dir(dir.path().join("replay"))
        .with_backend(Backend::Headless)
        .with_driver(DriverConfig::Playback { file: recording });
    let report = run(&replay);
    assert_eq!(report.steps, 34);
}
