//! Step and frame counters.

/// Counts completed ticks and captured frames.
///
/// A frame is due on every tick whose step number is a multiple of the
/// render interval, so the first frame comes from tick 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameCounters {
    render_steps: u64,
    step_number: u64,
    render_frame: u64,
}

impl FrameCounters {
    /// Counters for a render interval of `render_steps` ticks (at least 1).
    #[must_use]
    pub fn new(render_steps: u64) -> Self {
        Self {
            render_steps: render_steps.max(1),
            step_number: 0,
            render_frame: 0,
        }
    }

    /// Ticks between frames.
    #[must_use]
    pub fn render_steps(&self) -> u64 {
        self.render_steps
    }

    /// Ticks completed so far.
    #[must_use]
    pub fn step_number(&self) -> u64 {
        self.step_number
    }

    /// Frames captured so far.
    #[must_use]
    pub fn render_frame(&self) -> u64 {
        self.render_frame
    }

    /// Whether the current tick captures a frame.
    #[must_use]
    pub fn frame_due(&self) -> bool {
        self.step_number % self.render_steps == 0
    }

    /// Count a captured frame and return its 1-based number.
    pub fn next_frame(&mut self) -> u64 {
        self.render_frame += 1;
        self.render_frame
    }

    /// Count a completed tick.
    pub fn finish_step(&mut self) {
        self.step_number += 1;
    }
}
