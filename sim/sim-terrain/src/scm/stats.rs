//! Per-step statistics of the soil contact model.

use std::fmt;

use sim_types::Timer;

/// Counters and phase timers for the last SCM step.
#[derive(Debug, Clone, Default)]
pub struct StepStatistics {
    /// Grid nodes inside the active domain.
    pub active_nodes: usize,
    /// Nodes tested against a wheel footprint.
    pub ray_casts: usize,
    /// Nodes found under a wheel footprint.
    pub ray_hits: usize,
    /// Wheels in contact with the soil.
    pub contact_patches: usize,
    /// Nodes whose level changed.
    pub modified_nodes: usize,
    /// Time spent computing the active domain.
    pub timer_moving_patches: Timer,
    /// Time spent testing nodes against wheel footprints.
    pub timer_ray_casting: Timer,
    /// Time spent on pressure, sinkage and force evaluation.
    pub timer_contact_forces: Timer,
    /// Time spent in the whole step.
    pub timer_total: Timer,
}

impl StepStatistics {
    /// Clear counters and timers for a new step.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

impl fmt::Display for StepStatistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ms = |t: &Timer| 1e3 * t.seconds();
        writeln!(f, "SCM terrain statistics")?;
        writeln!(f, "  Active nodes:         {}", self.active_nodes)?;
        writeln!(f, "  Ray casts:            {}", self.ray_casts)?;
        writeln!(f, "  Ray hits:             {}", self.ray_hits)?;
        writeln!(f, "  Contact patches:      {}", self.contact_patches)?;
        writeln!(f, "  Modified nodes:       {}", self.modified_nodes)?;
        writeln!(f, "  Timers (ms)")?;
        writeln!(f, "    Moving patches:     {:.3}", ms(&self.timer_moving_patches))?;
        writeln!(f, "    Ray casting:        {:.3}", ms(&self.timer_ray_casting))?;
        writeln!(f, "    Contact forces:     {:.3}", ms(&self.timer_contact_forces))?;
        write!(f, "    Total:              {:.3}", ms(&self.timer_total))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]
mod tests {
    use super::*;

    #[test]
    fn test_report_lists_counters() {
        let stats = StepStatistics {
            active_nodes: 6000,
            ray_casts: 120,
            ray_hits: 80,
            contact_patches: 4,
            modified_nodes: 37,
            ..Default::default()
        };
        let report = stats.to_string();
        assert!(report.starts_with("SCM terrain statistics"));
        assert!(report.contains("Active nodes:         6000"));
        assert!(report.contains("Modified nodes:       37"));
        assert!(report.contains("Total:"));
    }

    #[test]
    fn test_reset() {
        let mut stats = StepStatistics {
            ray_hits: 3,
            ..Default::default()
        };
        stats.timer_total.start();
        stats.reset();
        assert_eq!(stats.ray_hits, 0);
        assert!(!stats.timer_total.is_running());
    }
}
