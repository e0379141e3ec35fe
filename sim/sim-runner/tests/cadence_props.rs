//! Property-based tests for render cadence and frame numbering.
//!
//! Run with: cargo test -p sim-runner -- proptest

use proptest::prelude::*;
use sim_runner::{FrameCounters, frame_file_name};
use sim_types::StepConfig;

// =============================================================================
// Strategies
// =============================================================================

fn arb_step_size() -> impl Strategy<Value = f64> {
    1e-4..0.05f64
}

fn arb_render_step_size() -> impl Strategy<Value = f64> {
    1e-3..0.2f64
}

// =============================================================================
// Properties
// =============================================================================

proptest! {
    #[test]
    fn proptest_render_steps_cover_interval(step in arb_step_size(), render in arb_render_step_size()) {
        let config = StepConfig::with_step_size(step).render_step_size(render);
        let n = config.render_steps();
        prop_assert!(n >= 1);
        // n steps span at least the render interval, one fewer falls short.
        prop_assert!(n as f64 * step >= render * (1.0 - 1e-6));
        prop_assert!(((n - 1) as f64) * step < render * (1.0 + 1e-6) || n == 1);
    }

    #[test]
    fn proptest_exact_multiples_do_not_round_up(step in arb_step_size(), k in 1u64..200) {
        let render = step * k as f64;
        let config = StepConfig::with_step_size(step).render_step_size(render);
        prop_assert_eq!(config.render_steps(), k);
    }

    #[test]
    fn proptest_frames_consecutive(render_steps in 1u64..20, ticks in 0u64..500) {
        let mut counters = FrameCounters::new(render_steps);
        let mut last_step = None;
        let mut last_frame = 0;
        for _ in 0..ticks {
            if let Some(prev) = last_step {
                prop_assert!(counters.step_number() > prev);
            }
            last_step = Some(counters.step_number());
            if counters.frame_due() {
                prop_assert_eq!(counters.step_number() % render_steps, 0);
                let frame = counters.next_frame();
                prop_assert_eq!(frame, last_frame + 1);
                last_frame = frame;
            }
            counters.finish_step();
        }
        prop_assert_eq!(counters.render_frame(), ticks.div_ceil(render_steps));
    }

    #[test]
    fn proptest_frame_names_sort_in_order(n in 1u64..999) {
        prop_assert!(frame_file_name(n) < frame_file_name(n + 1));
        prop_assert_eq!(frame_file_name(n).len(), "img_001.jpg".len());
    }
}

#[test]
fn sample_cadence() {
    assert_eq!(StepConfig::with_step_size(0.003).render_step_size(0.01).render_steps(), 4);
    assert_eq!(StepConfig::with_step_size(0.002).render_step_size(0.01).render_steps(), 5);
}
