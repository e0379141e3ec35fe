//! `scm-wheeled`: an HMMWV driving a sine-steer manoeuvre on SCM soil.
//!
//! ```text
//! scm-wheeled --img-output --end-time 10
//! scm-wheeled --config run.toml --backend headless
//! scm-wheeled --patch heightmap --heightmap bump64.png
//! ```

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{Parser, ValueEnum};
use sim_runner::{DriverConfig, RunConfig, SimulationLoop, build_modules};
use sim_terrain::PatchType;
use sim_vis::Backend;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Wheeled vehicle on deformable soil
#[derive(Parser)]
#[command(name = "scm-wheeled")]
#[command(about = "HMMWV on SCM deformable terrain", long_about = None)]
#[command(version)]
struct Cli {
    /// TOML run configuration (defaults to the sample run)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Output directory
    #[arg(long)]
    out_dir: Option<PathBuf>,

    /// Save frames to <out_dir>/IMG/img_###.jpg
    #[arg(long)]
    img_output: bool,

    /// Visual backend (raster, headless)
    #[arg(long)]
    backend: Option<Backend>,

    /// Simulation end time (s)
    #[arg(long)]
    end_time: Option<f64>,

    /// Terrain patch profile
    #[arg(long, value_enum)]
    patch: Option<PatchArg>,

    /// Height-map image for `--patch heightmap`
    #[arg(long)]
    heightmap: Option<PathBuf>,

    /// Driver
    #[arg(long, value_enum)]
    driver: Option<DriverArg>,

    /// Data file for `--driver playback`
    #[arg(long)]
    driver_file: Option<PathBuf>,

    /// Record applied driver inputs to <out_dir>/driver_inputs.txt
    #[arg(long)]
    record_inputs: bool,

    /// Write per-tick telemetry to <out_dir>/vehicle_output.csv
    #[arg(long)]
    telemetry: bool,

    /// Log filter (overrides RUST_LOG)
    #[arg(long)]
    log_level: Option<String>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum PatchArg {
    Flat,
    Heightmap,
    Bump,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum DriverArg {
    Sine,
    Path,
    Playback,
}

fn init_tracing(level: Option<&str>) {
    let filter = match level {
        Some(level) => EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info")),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .init();
}

fn patch(arg: PatchArg, heightmap: Option<PathBuf>) -> Result<PatchType> {
    Ok(match arg {
        PatchArg::Flat => PatchType::Flat {
            size_x: 16.0,
            size_y: 8.0,
        },
        PatchArg::Bump => PatchType::default(),
        PatchArg::Heightmap => {
            let Some(path) = heightmap else {
                bail!("--patch heightmap needs --heightmap <image>");
            };
            PatchType::HeightMap {
                path,
                size_x: 40.0,
                size_y: 40.0,
                h_min: 0.0,
                h_max: 1.0,
            }
        }
    })
}

fn driver(arg: DriverArg, file: Option<PathBuf>) -> Result<DriverConfig> {
    Ok(match arg {
        DriverArg::Sine => DriverConfig::default(),
        DriverArg::Path => DriverConfig::Path {
            waypoints: Vec::new(),
            params: sim_driver::PathFollowerParams::default(),
        },
        DriverArg::Playback => {
            let Some(file) = file else {
                bail!("--driver playback needs --driver-file <path>");
            };
            DriverConfig::Playback { file }
        }
    })
}

fn load_config(cli: Cli) -> Result<RunConfig> {
    let mut config = match &cli.config {
        Some(path) => RunConfig::from_file(path)?,
        None => RunConfig::default(),
    };

    if let Some(out_dir) = cli.out_dir {
        config = config.with_out_dir(out_dir);
    }
    if cli.img_output {
        config = config.with_img_output(true);
    }
    if let Some(backend) = cli.backend {
        config = config.with_backend(backend);
    }
    if let Some(end_time) = cli.end_time {
        config = config.with_end_time(end_time);
    }
    if let Some(arg) = cli.patch {
        config = config.with_patch(patch(arg, cli.heightmap)?);
    } else if let Some(path) = cli.heightmap {
        config = config.with_patch(patch(PatchArg::Heightmap, Some(path))?);
    }
    if let Some(arg) = cli.driver {
        config = config.with_driver(driver(arg, cli.driver_file)?);
    }
    config.output.record_inputs |= cli.record_inputs;
    config.output.telemetry |= cli.telemetry;

    config.validate()?;
    Ok(config)
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_level.as_deref());

    let config = load_config(cli).context("invalid configuration")?;
    info!(
        patch = config.terrain.patch.name(),
        driver = config.driver.name(),
        out_dir = %config.output.out_dir.display(),
        "starting run"
    );

    let modules = build_modules(&config).context("failed to build simulation")?;
    let mut sim = SimulationLoop::new(
        &config,
        modules.vehicle,
        modules.terrain,
        modules.driver,
        modules.vis,
    )
    .context("failed to set up simulation loop")?;

    let report = sim.run().context("simulation failed")?;
    println!("{report}");
    Ok(())
}
