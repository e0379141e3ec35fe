//! Per-tick vehicle telemetry as CSV.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use sim_types::{DriverInputs, VehicleState};
use tracing::debug;

use crate::error::{Result, RunError};

/// CSV header row.
pub const TELEMETRY_HEADER: &str = "time,speed,throttle,steering,braking,x,y,z,mean_sinkage";

/// Writes one CSV row per tick.
#[derive(Debug)]
pub struct Telemetry {
    path: PathBuf,
    writer: BufWriter<File>,
    rows: usize,
}

impl Telemetry {
    /// Create (or truncate) the file at `path` and write the header.
    pub fn create(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let file = File::create(&path).map_err(|e| RunError::io(&path, e))?;
        let mut writer = BufWriter::new(file);
        writeln!(writer, "{TELEMETRY_HEADER}").map_err(|e| RunError::io(&path, e))?;
        debug!(path = %path.display(), "writing telemetry");
        Ok(Self {
            path,
            writer,
            rows: 0,
        })
    }

    /// Path of the CSV file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of data rows written.
    #[must_use]
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Append the state and inputs of one tick.
    pub fn record(&mut self, time: f64, state: &VehicleState, inputs: &DriverInputs) -> Result<()> {
        let p = state.position();
        writeln!(
            self.writer,
            "{time},{},{},{},{},{},{},{},{}",
            state.speed(),
            inputs.throttle,
            inputs.steering,
            inputs.braking,
            p.x,
            p.y,
            p.z,
            state.mean_sinkage()
        )
        .map_err(|e| RunError::io(&self.path, e))?;
        self.rows += 1;
        Ok(())
    }

    /// Flush buffered rows to disk.
    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush().map_err(|e| RunError::io(&self.path, e))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use nalgebra::{Isometry3, Vector3};

    #[test]
    fn test_rows_follow_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vehicle_output.csv");
        let mut telemetry = Telemetry::create(&path).unwrap();

        let state = VehicleState {
            pose: Isometry3::translation(1.0, 2.0, 0.6),
            linear_velocity: Vector3::new(3.0, 4.0, 0.0),
            ..VehicleState::default()
        };
        telemetry
            .record(0.5, &state, &DriverInputs::new(0.7, -0.1, 0.0))
            .unwrap();
        telemetry.record(0.503, &state, &DriverInputs::ZERO).unwrap();
        telemetry.flush().unwrap();
        assert_eq!(telemetry.rows(), 2);

        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], TELEMETRY_HEADER);
        let fields: Vec<f64> = lines[1].split(',').map(|f| f.parse().unwrap()).collect();
        assert_eq!(fields.len(), 9);
        assert_eq!(fields[0], 0.5);
        assert_eq!(fields[2], 0.7);
        assert_eq!(fields[3], -0.1);
        assert_eq!(&fields[5..8], &[1.0, 2.0, 0.6]);
    }
}
