//! The simulation loop.

use std::fmt;
use std::time::Duration;

use sim_driver::{Driver, INPUTS_FILE_NAME, InputRecorder};
use sim_terrain::{StepStatistics, Terrain};
use sim_types::Timer;
use sim_vehicle::Vehicle;
use sim_vis::{Scene, VisualSystem};
use tracing::{debug, info, warn};

use crate::config::{RunConfig, TimerConfig};
use crate::counters::FrameCounters;
use crate::error::Result;
use crate::output::{OutputLayout, TELEMETRY_FILE_NAME};
use crate::telemetry::Telemetry;

/// Sequences one vehicle, its terrain, a driver and a visual system.
///
/// Every tick renders, captures a frame when one is due, computes the
/// driver inputs, synchronizes all modules to the same time and inputs,
/// and only then advances them by one step.
#[derive(Debug)]
pub struct SimulationLoop<V, T, D, S> {
    vehicle: V,
    terrain: T,
    driver: D,
    vis: S,
    step_size: f64,
    timer_markers: TimerConfig,
    counters: FrameCounters,
    timer: Timer,
    timer_stopped: bool,
    capture: bool,
    layout: OutputLayout,
    telemetry: Option<Telemetry>,
    recorder: Option<InputRecorder>,
    statistics: Option<StepStatistics>,
    vehicle_mass: f64,
}

impl<V, T, D, S> SimulationLoop<V, T, D, S>
where
    V: Vehicle,
    T: Terrain,
    D: Driver,
    S: VisualSystem,
{
    /// Prepare the output directory and initialize the driver and visual
    /// system. The vehicle and terrain must already be initialized.
    pub fn new(config: &RunConfig, vehicle: V, terrain: T, mut driver: D, mut vis: S) -> Result<Self> {
        config.step.validate()?;
        config.timer.validate()?;

        let mut output = config.output.clone();
        if output.img_output && !vis.capabilities().image_capture {
            warn!(backend = %vis.backend(), "visual backend cannot capture frames, image output disabled");
            output.img_output = false;
        }
        let layout = OutputLayout::prepare(&output)?;

        let telemetry = if output.telemetry {
            Some(Telemetry::create(layout.file(TELEMETRY_FILE_NAME))?)
        } else {
            None
        };
        let recorder = if output.record_inputs {
            Some(InputRecorder::create(layout.file(INPUTS_FILE_NAME))?)
        } else {
            None
        };

        let vehicle_mass = vehicle.mass();
        info!(mass = vehicle_mass, "total vehicle mass");

        driver.initialize();
        vis.initialize();

        let counters = FrameCounters::new(config.render_steps());
        info!(
            step_size = config.step.step_size,
            render_steps = counters.render_steps(),
            end_time = ?config.step.end_time,
            "simulation loop ready"
        );

        Ok(Self {
            vehicle,
            terrain,
            driver,
            vis,
            step_size: config.step.step_size,
            timer_markers: config.timer,
            counters,
            timer: Timer::new(),
            timer_stopped: false,
            capture: output.img_output,
            layout,
            telemetry,
            recorder,
            statistics: None,
            vehicle_mass,
        })
    }

    /// Vehicle.
    #[must_use]
    pub fn vehicle(&self) -> &V {
        &self.vehicle
    }

    /// Terrain.
    #[must_use]
    pub fn terrain(&self) -> &T {
        &self.terrain
    }

    /// Driver.
    #[must_use]
    pub fn driver(&self) -> &D {
        &self.driver
    }

    /// Visual system.
    #[must_use]
    pub fn vis(&self) -> &S {
        &self.vis
    }

    /// Step and frame counters.
    #[must_use]
    pub fn counters(&self) -> FrameCounters {
        self.counters
    }

    /// Output directories.
    #[must_use]
    pub fn layout(&self) -> &OutputLayout {
        &self.layout
    }

    /// Whether frames are captured.
    #[must_use]
    pub fn captures_frames(&self) -> bool {
        self.capture
    }

    /// Wall-clock time between the timer markers, once the stop marker passed.
    #[must_use]
    pub fn timer_elapsed(&self) -> Option<Duration> {
        self.timer_stopped.then(|| self.timer.elapsed())
    }

    /// Run one tick.
    ///
    /// This performs:
    /// 1. Start or stop the timer at its marker steps
    /// 2. Render the scene
    /// 3. Capture a frame if one is due
    /// 4. Compute the driver inputs for the current time
    /// 5. Synchronize terrain, vehicle and visual system
    /// 6. Advance driver, terrain, vehicle and visual system
    ///
    /// # Errors
    ///
    /// Returns an error if a frame or output row cannot be written, or if the
    /// vehicle diverges.
    pub fn step(&mut self) -> Result<()> {
        let time = self.vehicle.time();
        let step_number = self.counters.step_number();

        // 1. Timer markers
        if step_number == self.timer_markers.start_step {
            info!(step = step_number, time, "timer started");
            self.timer.start();
        }
        if step_number == self.timer_markers.stop_step {
            self.timer.stop();
            self.timer_stopped = true;
            info!(
                step = step_number,
                time,
                elapsed = self.timer.seconds(),
                "timer stopped"
            );
            if let Some(stats) = self.terrain.statistics() {
                info!("{stats}");
                self.statistics = Some(stats.clone());
            }
        }

        // 2. Render
        let state = self.vehicle.state();
        self.vis.begin_scene();
        self.vis.render(&Scene::new(&state, &self.terrain));
        self.vis.end_scene();

        // 3. Capture
        if self.capture && self.counters.frame_due() {
            let number = self.counters.render_frame() + 1;
            if let Some(path) = self.layout.frame_path(number) {
                self.vis.write_image(&path)?;
                self.counters.next_frame();
                debug!(frame = number, path = %path.display(), "frame captured");
            }
        }

        // 4. Driver inputs
        self.driver.synchronize(time, &state);
        let inputs = self.driver.inputs();
        if let Some(telemetry) = self.telemetry.as_mut() {
            telemetry.record(time, &state, &inputs)?;
        }
        if let Some(recorder) = self.recorder.as_mut() {
            recorder.record(time, &inputs)?;
        }

        // 5. Synchronize
        self.terrain.synchronize(time);
        self.vehicle.synchronize(time, &inputs, &mut self.terrain);
        self.vis.synchronize(time, &inputs);

        // 6. Advance
        self.driver.advance(self.step_size);
        self.terrain.advance(self.step_size);
        self.vehicle.advance(self.step_size)?;
        self.vis.advance(self.step_size);

        self.counters.finish_step();
        Ok(())
    }

    /// Tick until the visual system stops, then flush outputs and write the
    /// run summary.
    pub fn run(&mut self) -> Result<LoopReport> {
        while self.vis.run() {
            self.step()?;
        }

        if let Some(telemetry) = self.telemetry.as_mut() {
            telemetry.flush()?;
        }
        if let Some(recorder) = self.recorder.as_mut() {
            recorder.flush()?;
        }

        let report = self.report();
        info!(
            steps = report.steps,
            frames = report.frames,
            final_time = report.final_time,
            "simulation finished"
        );
        self.layout.write_summary(&report.to_string())?;
        Ok(report)
    }

    /// Summary of the run so far.
    #[must_use]
    pub fn report(&self) -> LoopReport {
        LoopReport {
            steps: self.counters.step_number(),
            frames: self.counters.render_frame(),
            timer_elapsed: self.timer_elapsed(),
            final_time: self.vehicle.time(),
            vehicle_mass: self.vehicle_mass,
            statistics: self.statistics.clone(),
        }
    }

    /// Take back the modules.
    pub fn into_parts(self) -> (V, T, D, S) {
        (self.vehicle, self.terrain, self.driver, self.vis)
    }
}

/// What a finished run reports.
#[derive(Debug, Clone)]
pub struct LoopReport {
    /// Ticks run.
    pub steps: u64,
    /// Frames captured.
    pub frames: u64,
    /// Wall-clock time between the timer markers, if the stop marker was reached.
    pub timer_elapsed: Option<Duration>,
    /// Simulation time at the end of the run.
    pub final_time: f64,
    /// Total vehicle mass (kg).
    pub vehicle_mass: f64,
    /// Terrain statistics at the timer stop marker.
    pub statistics: Option<StepStatistics>,
}

impl fmt::Display for LoopReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Vehicle mass:  {:.1} kg", self.vehicle_mass)?;
        writeln!(f, "Steps:         {}", self.steps)?;
        writeln!(f, "Frames:        {}", self.frames)?;
        writeln!(f, "Final time:    {:.3} s", self.final_time)?;
        match self.timer_elapsed {
            Some(elapsed) => writeln!(f, "Timer:         {:.3} s", elapsed.as_secs_f64())?,
            None => writeln!(f, "Timer:         not reached")?,
        }
        if let Some(stats) = &self.statistics {
            writeln!(f, "{stats}")?;
        }
        Ok(())
    }
}
