//! Run configuration.
//!
//! Everything the loop and its modules need is collected in one immutable
//! [`RunConfig`] built before the run starts: from [`Default`] (the sample
//! SCM wheeled-vehicle run), from a TOML file, and from CLI overrides.
//!
//! ```toml
//! [step]
//! step_size = 0.003
//! render_step_size = 0.01
//! end_time = 10.0
//!
//! [output]
//! out_dir = "HMMWV_DEF_SOIL"
//! img_output = true
//!
//! [terrain.patch]
//! type = "flat"
//! size_x = 16.0
//! size_y = 8.0
//!
//! [driver]
//! kind = "sine"
//! delay = 0.5
//! ```

use std::path::{Path, PathBuf};

use nalgebra::{Isometry3, Point3, Translation3, UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};
use sim_driver::{PathFollowerParams, SineSteerDriver};
use sim_terrain::{MovingPatch, PatchAnchor, PatchType, SoilParameters};
use sim_types::StepConfig;
use sim_vehicle::{DriveType, TireMaterial, TireType};
use sim_vis::{Backend, ChaseCamera, VisConfig};

use crate::error::{Result, RunError};

/// Complete configuration of one simulation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Step size, render interval and end time.
    pub step: StepConfig,
    /// Output directory and what goes into it.
    pub output: OutputConfig,
    /// Steps bracketing the timed window.
    pub timer: TimerConfig,
    /// Visual system.
    pub visual: VisualOptions,
    /// Terrain model and patch.
    pub terrain: TerrainConfig,
    /// Vehicle placement and tires.
    pub vehicle: VehicleConfig,
    /// Driver.
    pub driver: DriverConfig,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            step: StepConfig::with_step_size(3e-3)
                .render_step_size(1.0 / 100.0)
                .end_time(10.0),
            output: OutputConfig::default(),
            timer: TimerConfig::default(),
            visual: VisualOptions::default(),
            terrain: TerrainConfig::default(),
            vehicle: VehicleConfig::default(),
            driver: DriverConfig::default(),
        }
    }
}

impl RunConfig {
    /// Parse a TOML document; missing keys take their defaults.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|source| RunError::ConfigFile {
            path: PathBuf::from("<string>"),
            source: Box::new(source),
        })
    }

    /// Load a TOML configuration file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| RunError::io(path, e))?;
        toml::from_str(&text).map_err(|source| RunError::ConfigFile {
            path: path.to_path_buf(),
            source: Box::new(source),
        })
    }

    /// Set the output directory.
    #[must_use]
    pub fn with_out_dir(mut self, out_dir: impl Into<PathBuf>) -> Self {
        self.output.out_dir = out_dir.into();
        self
    }

    /// Enable or disable frame capture.
    #[must_use]
    pub fn with_img_output(mut self, img_output: bool) -> Self {
        self.output.img_output = img_output;
        self
    }

    /// Set the end time.
    #[must_use]
    pub fn with_end_time(mut self, end_time: f64) -> Self {
        self.step.end_time = Some(end_time);
        self
    }

    /// Set the requested visual backend.
    #[must_use]
    pub fn with_backend(mut self, backend: Backend) -> Self {
        self.visual.backend = backend;
        self
    }

    /// Set the terrain patch.
    #[must_use]
    pub fn with_patch(mut self, patch: PatchType) -> Self {
        self.terrain.patch = patch;
        self
    }

    /// Set the driver.
    #[must_use]
    pub fn with_driver(mut self, driver: DriverConfig) -> Self {
        self.driver = driver;
        self
    }

    /// Number of steps between captured frames.
    #[must_use]
    pub fn render_steps(&self) -> u64 {
        self.step.render_steps()
    }

    /// Visual system settings for this run.
    #[must_use]
    pub fn vis_config(&self) -> VisConfig {
        VisConfig {
            backend: self.visual.backend,
            width: self.visual.width,
            height: self.visual.height,
            camera: self.visual.camera,
            end_time: self.step.end_time,
        }
    }

    /// Check the configuration before any module is built.
    pub fn validate(&self) -> Result<()> {
        self.step.validate()?;
        self.timer.validate()?;
        self.vis_config().validate()?;
        self.terrain.validate()?;
        self.vehicle.tire_material.validate()?;
        self.driver.validate()?;
        if self.output.out_dir.as_os_str().is_empty() {
            return Err(RunError::invalid_config("output directory must not be empty"));
        }
        Ok(())
    }
}

/// Where results go.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Output directory.
    pub out_dir: PathBuf,
    /// Save frames to `<out_dir>/IMG/img_###.jpg`.
    pub img_output: bool,
    /// Write `<out_dir>/vehicle_output.csv`.
    pub telemetry: bool,
    /// Write `<out_dir>/driver_inputs.txt`.
    pub record_inputs: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            out_dir: PathBuf::from("HMMWV_DEF_SOIL"),
            img_output: false,
            telemetry: false,
            record_inputs: false,
        }
    }
}

/// Step numbers at which the wall-clock timer starts and stops.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimerConfig {
    /// Step at which timing starts.
    pub start_step: u64,
    /// Step at which timing stops and statistics are reported.
    pub stop_step: u64,
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            start_step: 800,
            stop_step: 1400,
        }
    }
}

impl TimerConfig {
    /// The stop marker must come after the start marker.
    pub fn validate(&self) -> Result<()> {
        if self.stop_step <= self.start_step {
            return Err(RunError::invalid_config(format!(
                "timer stop step {} must be after start step {}",
                self.stop_step, self.start_step
            )));
        }
        Ok(())
    }
}

/// Visual system options (the end time comes from the step config).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VisualOptions {
    /// Requested backend.
    pub backend: Backend,
    /// Frame width (pixels).
    pub width: u32,
    /// Frame height (pixels).
    pub height: u32,
    /// Chase camera.
    pub camera: ChaseCamera,
}

impl Default for VisualOptions {
    fn default() -> Self {
        let vis = VisConfig::default();
        Self {
            backend: vis.backend,
            width: vis.width,
            height: vis.height,
            camera: vis.camera,
        }
    }
}

/// Ground model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerrainModel {
    /// Deformable soil.
    #[default]
    Scm,
    /// Non-deformable ground with the same profile.
    Rigid,
}

/// Terrain settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerrainConfig {
    /// Ground model.
    pub model: TerrainModel,
    /// Initial profile.
    pub patch: PatchType,
    /// Grid spacing (m).
    pub delta: f64,
    /// Soil parameters (SCM only).
    pub soil: SoilParameters,
    /// Boxes restricting the SCM contact domain (empty for the whole grid).
    pub moving_patches: Vec<MovingPatch>,
    /// Sinkage range of the false-colour plot (m).
    pub plot_range: (f64, f64),
}

impl Default for TerrainConfig {
    fn default() -> Self {
        Self {
            model: TerrainModel::Scm,
            patch: PatchType::default(),
            delta: 0.05,
            soil: SoilParameters::default(),
            moving_patches: vec![MovingPatch::new(
                PatchAnchor::Chassis,
                Vector3::zeros(),
                Vector3::new(5.0, 3.0, 1.0),
            )],
            plot_range: (0.0, 0.1),
        }
    }
}

impl TerrainConfig {
    /// Validate grid and soil settings.
    pub fn validate(&self) -> Result<()> {
        if !(self.delta.is_finite() && self.delta > 0.0) {
            return Err(RunError::invalid_config(format!(
                "grid spacing must be positive, got {}",
                self.delta
            )));
        }
        let (lo, hi) = self.plot_range;
        if !(lo.is_finite() && hi.is_finite() && hi > lo) {
            return Err(RunError::invalid_config(format!(
                "sinkage plot range must be increasing, got ({lo}, {hi})"
            )));
        }
        self.soil.validate()?;
        Ok(())
    }
}

/// Vehicle placement and tire settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VehicleConfig {
    /// Start `(x, y, clearance)`; the chassis starts `clearance` above the
    /// ground at `(x, y)`. `None` picks a location suited to the patch.
    pub init_loc: Option<Point3<f64>>,
    /// Initial heading about +Z (rad).
    pub init_yaw: f64,
    /// Tread type.
    pub tire_type: TireType,
    /// Driven axles.
    pub drive_type: DriveType,
    /// Tire contact material.
    pub tire_material: TireMaterial,
}

impl Default for VehicleConfig {
    fn default() -> Self {
        Self {
            init_loc: None,
            init_yaw: 0.0,
            tire_type: TireType::Lugged,
            drive_type: DriveType::Awd,
            tire_material: TireMaterial::default(),
        }
    }
}

impl VehicleConfig {
    /// Start `(x, y, clearance)` for a patch.
    #[must_use]
    pub fn start_location(&self, patch: &PatchType) -> Point3<f64> {
        self.init_loc.unwrap_or(match patch {
            PatchType::Flat { .. } => Point3::new(-5.0, -2.0, 0.6),
            PatchType::HeightMap { .. } | PatchType::Bump { .. } => Point3::new(-15.0, -15.0, 0.6),
        })
    }

    /// Initial chassis pose over ground of height `ground` at the start location.
    #[must_use]
    pub fn initial_pose(&self, patch: &PatchType, ground: impl Fn(f64, f64) -> f64) -> Isometry3<f64> {
        let loc = self.start_location(patch);
        Isometry3::from_parts(
            Translation3::new(loc.x, loc.y, ground(loc.x, loc.y) + loc.z),
            UnitQuaternion::from_euler_angles(0.0, 0.0, self.init_yaw),
        )
    }
}

/// Driver selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DriverConfig {
    /// Delayed throttle ramp and sine steer.
    Sine(SineSteerDriver),
    /// Follow waypoints (or a straight line ahead of the start when empty).
    Path {
        /// Path vertices.
        #[serde(default)]
        waypoints: Vec<Point3<f64>>,
        /// Controller tuning.
        #[serde(default)]
        params: PathFollowerParams,
    },
    /// Replay a driver data file.
    Playback {
        /// Data file (`time steering throttle braking` rows).
        file: PathBuf,
    },
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self::Sine(SineSteerDriver::new(0.5))
    }
}

impl DriverConfig {
    /// Short lowercase name, for logging.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Sine(_) => "sine",
            Self::Path { .. } => "path",
            Self::Playback { .. } => "playback",
        }
    }

    /// Validate controller parameters.
    pub fn validate(&self) -> Result<()> {
        match self {
            Self::Sine(driver) => driver.validate()?,
            Self::Path { params, .. } => params.validate()?,
            Self::Playback { file } => {
                if file.as_os_str().is_empty() {
                    return Err(RunError::invalid_config("playback file must be set"));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_default_is_sample_run() {
        let config = RunConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.render_steps(), 4);
        assert_eq!(config.timer.start_step, 800);
        assert_eq!(config.timer.stop_step, 1400);
        assert_eq!(config.terrain.delta, 0.05);
        assert_eq!(config.terrain.plot_range, (0.0, 0.1));
        assert_eq!(config.terrain.moving_patches.len(), 1);
        assert_eq!(config.terrain.patch.size(), (40.0, 40.0));
        assert_eq!(config.vehicle.tire_material.mu, 0.8);
        assert!(!config.output.img_output);
        assert_eq!(config.output.out_dir, PathBuf::from("HMMWV_DEF_SOIL"));
        assert!(matches!(config.driver, DriverConfig::Sine(ref d) if d.delay == 0.5));
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = RunConfig::from_toml_str(
            r#"
            [step]
            step_size = 0.002

            [output]
            out_dir = "run_a"
            img_output = true

            [terrain.patch]
            type = "flat"
            size_x = 16.0
            size_y = 8.0

            [visual]
            backend = "headless"

            [driver]
            kind = "sine"
            delay = 1.0
            "#,
        )
        .unwrap();

        assert_eq!(config.step.step_size, 0.002);
        assert_relative_eq!(config.step.render_step_size, 0.01);
        assert_eq!(config.render_steps(), 5);
        assert_eq!(config.output.out_dir, PathBuf::from("run_a"));
        assert!(config.output.img_output);
        assert_eq!(config.terrain.patch.name(), "flat");
        assert_eq!(config.visual.backend, Backend::Headless);
        match &config.driver {
            DriverConfig::Sine(driver) => {
                assert_eq!(driver.delay, 1.0);
                assert_eq!(driver.steer_period, 6.0);
            }
            other => panic!("unexpected driver {other:?}"),
        }
        assert_eq!(config.timer, TimerConfig::default());
    }

    #[test]
    fn test_path_and_playback_drivers_parse() {
        let config = RunConfig::from_toml_str(
            r#"
            [driver]
            kind = "path"
            waypoints = [[0.0, 0.0, 0.0], [50.0, 0.0, 0.0]]

            [driver.params]
            target_speed = 8.0
            "#,
        )
        .unwrap();
        match config.driver {
            DriverConfig::Path { waypoints, params } => {
                assert_eq!(waypoints.len(), 2);
                assert_eq!(params.target_speed, 8.0);
                assert_eq!(params.look_ahead, 5.0);
            }
            other => panic!("unexpected driver {other:?}"),
        }

        let config = RunConfig::from_toml_str(
            r#"
            [driver]
            kind = "playback"
            file = "inputs.txt"
            "#,
        )
        .unwrap();
        assert_eq!(config.driver.name(), "playback");
    }

    #[test]
    fn test_bad_toml_is_reported() {
        let err = RunConfig::from_toml_str("[step]\nstep_size = \"fast\"").unwrap_err();
        assert!(matches!(err, RunError::ConfigFile { .. }));
    }

    #[test]
    fn test_validation_failures() {
        let mut config = RunConfig::default();
        config.timer.stop_step = 800;
        assert!(matches!(config.validate(), Err(RunError::InvalidConfig(_))));

        let mut config = RunConfig::default();
        config.step.step_size = 0.0;
        assert!(matches!(config.validate(), Err(RunError::Sim(_))));

        let mut config = RunConfig::default();
        config.step.render_step_size = -0.01;
        assert!(config.validate().is_err());

        let mut config = RunConfig::default();
        config.terrain.soil.bekker_n = 0.0;
        assert!(matches!(config.validate(), Err(RunError::Terrain(_))));

        let mut config = RunConfig::default();
        config.terrain.plot_range = (0.1, 0.0);
        assert!(config.validate().is_err());

        let config = RunConfig::default().with_driver(DriverConfig::Sine(
            SineSteerDriver::default().with_steering(2.0, 0.6, 0.0),
        ));
        assert!(matches!(config.validate(), Err(RunError::Driver(_))));
    }

    #[test]
    fn test_start_location_per_patch() {
        let vehicle = VehicleConfig::default();
        let flat = PatchType::Flat {
            size_x: 16.0,
            size_y: 8.0,
        };
        assert_eq!(vehicle.start_location(&flat), Point3::new(-5.0, -2.0, 0.6));
        assert_eq!(
            vehicle.start_location(&PatchType::default()),
            Point3::new(-15.0, -15.0, 0.6)
        );

        let pose = vehicle.initial_pose(&flat, |_, _| 0.25);
        assert_relative_eq!(pose.translation.z, 0.85);

        let custom = VehicleConfig {
            init_loc: Some(Point3::new(1.0, 2.0, 0.7)),
            init_yaw: std::f64::consts::FRAC_PI_2,
            ..VehicleConfig::default()
        };
        let pose = custom.initial_pose(&flat, |_, _| 0.0);
        assert_relative_eq!(pose.translation.x, 1.0);
        assert_relative_eq!((pose.rotation * Vector3::x()).y, 1.0, epsilon = 1e-12);
    }
}
