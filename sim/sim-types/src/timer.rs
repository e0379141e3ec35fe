//! Wall-clock interval timer.

use std::time::{Duration, Instant};

/// Start/stop interval timer.
///
/// Accumulates wall-clock time across `start()`/`stop()` pairs. Used to
/// measure throughput over a window of simulation steps and to time the
/// phases of a terrain step.
#[derive(Debug, Clone, Default)]
pub struct Timer {
    started: Option<Instant>,
    accumulated: Duration,
}

impl Timer {
    /// Create a stopped timer with zero elapsed time.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start (or resume) the timer. No effect if already running.
    pub fn start(&mut self) {
        if self.started.is_none() {
            self.started = Some(Instant::now());
        }
    }

    /// Stop the timer, adding the running interval. No effect if stopped.
    pub fn stop(&mut self) {
        if let Some(started) = self.started.take() {
            self.accumulated += started.elapsed();
        }
    }

    /// Clear accumulated time and stop.
    pub fn reset(&mut self) {
        self.started = None;
        self.accumulated = Duration::ZERO;
    }

    /// Whether the timer is currently running.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.started.is_some()
    }

    /// Total elapsed time, including the running interval if any.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.accumulated + self.started.map_or(Duration::ZERO, |s| s.elapsed())
    }

    /// Total elapsed time in seconds.
    #[must_use]
    pub fn seconds(&self) -> f64 {
        self.elapsed().as_secs_f64()
    }

    /// Time a closure, accumulating its duration.
    pub fn measure<R>(&mut self, f: impl FnOnce() -> R) -> R {
        self.start();
        let out = f();
        self.stop();
        out
    }
}
