//! Recorded driver inputs: playback from and recording to text files.
//!
//! One sample per line, whitespace separated:
//!
//! ```text
//! time steering throttle braking
//! ```
//!
//! Blank lines and lines starting with `#` are skipped.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use sim_types::{DriverInputs, VehicleState};
use tracing::{debug, info};

use crate::Driver;
use crate::error::{DriverError, Result};

/// Default name of the recorded inputs file inside an output directory.
pub const INPUTS_FILE_NAME: &str = "driver_inputs.txt";

/// Driver inputs at one instant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DriverSample {
    /// Simulation time (s).
    pub time: f64,
    /// Inputs at `time`.
    pub inputs: DriverInputs,
}

/// Driver replaying time-stamped inputs.
///
/// Inputs are interpolated linearly between samples and held at the first
/// and last sample outside the recorded range.
#[derive(Debug, Clone)]
pub struct PlaybackDriver {
    samples: Vec<DriverSample>,
    inputs: DriverInputs,
}

impl PlaybackDriver {
    /// Create a driver from samples in any order.
    ///
    /// # Errors
    ///
    /// Returns an error if there are no samples or a time is not finite.
    pub fn from_samples(mut samples: Vec<DriverSample>) -> Result<Self> {
        if samples.is_empty() {
            return Err(DriverError::Empty(PathBuf::from("<samples>")));
        }
        if samples.iter().any(|s| !s.time.is_finite()) {
            return Err(DriverError::invalid_parameters("sample times must be finite"));
        }
        samples.sort_by(|a, b| a.time.total_cmp(&b.time));
        Ok(Self {
            samples,
            inputs: DriverInputs::ZERO,
        })
    }

    /// Load samples from a data file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| DriverError::io(path, e))?;
        let samples = parse_samples(&text, path)?;
        if samples.is_empty() {
            return Err(DriverError::Empty(path.to_path_buf()));
        }
        info!(path = %path.display(), samples = samples.len(), "driver data loaded");
        Self::from_samples(samples)
    }

    /// Samples sorted by time.
    #[must_use]
    pub fn samples(&self) -> &[DriverSample] {
        &self.samples
    }

    /// Interpolated inputs at `time`.
    #[must_use]
    pub fn inputs_at(&self, time: f64) -> DriverInputs {
        let (Some(first), Some(last)) = (self.samples.first(), self.samples.last()) else {
            return DriverInputs::ZERO;
        };
        if time.is_nan() || time <= first.time {
            return first.inputs;
        }
        if time >= last.time {
            return last.inputs;
        }

        let hi = self.samples.partition_point(|s| s.time <= time);
        let (a, b) = (self.samples[hi - 1], self.samples[hi]);
        let span = b.time - a.time;
        if span <= 0.0 {
            return b.inputs;
        }
        let w = (time - a.time) / span;
        let lerp = |x: f64, y: f64| x + (y - x) * w;
        DriverInputs::new(
            lerp(a.inputs.throttle, b.inputs.throttle),
            lerp(a.inputs.steering, b.inputs.steering),
            lerp(a.inputs.braking, b.inputs.braking),
        )
    }
}

impl Driver for PlaybackDriver {
    fn initialize(&mut self) {
        self.inputs = DriverInputs::ZERO;
    }

    fn synchronize(&mut self, time: f64, _state: &VehicleState) {
        self.inputs = self.inputs_at(time);
    }

    fn inputs(&self) -> DriverInputs {
        self.inputs
    }

    fn advance(&mut self, _dt: f64) {}
}

fn parse_samples(text: &str, path: &Path) -> Result<Vec<DriverSample>> {
    let mut samples = Vec::new();
    for (index, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let parse_error = |reason: String| DriverError::Parse {
            path: path.to_path_buf(),
            line: index + 1,
            reason,
        };

        let values = line
            .split_whitespace()
            .map(|field| {
                field
                    .parse::<f64>()
                    .map_err(|e| parse_error(format!("bad number {field:?}: {e}")))
            })
            .collect::<Result<Vec<f64>>>()?;
        let [time, steering, throttle, braking] = values[..] else {
            return Err(parse_error(format!(
                "expected 4 columns (time steering throttle braking), got {}",
                values.len()
            )));
        };
        if !time.is_finite() {
            return Err(parse_error("time must be finite".to_string()));
        }
        samples.push(DriverSample {
            time,
            inputs: DriverInputs::new(throttle, steering, braking),
        });
    }
    Ok(samples)
}

/// Writes the inputs applied each tick in the playback format.
#[derive(Debug)]
pub struct InputRecorder {
    path: PathBuf,
    writer: BufWriter<File>,
    rows: usize,
}

impl InputRecorder {
    /// Create (or truncate) the file at `path`.
    pub fn create(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let file = File::create(&path).map_err(|e| DriverError::io(&path, e))?;
        debug!(path = %path.display(), "recording driver inputs");
        Ok(Self {
            path,
            writer: BufWriter::new(file),
            rows: 0,
        })
    }

    /// Path of the recording.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of rows written.
    #[must_use]
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Append one sample.
    pub fn record(&mut self, time: f64, inputs: &DriverInputs) -> Result<()> {
        writeln!(
            self.writer,
            "{time} {} {} {}",
            inputs.steering, inputs.throttle, inputs.braking
        )
        .map_err(|e| DriverError::io(&self.path, e))?;
        self.rows += 1;
        Ok(())
    }

    /// Flush buffered rows to disk.
    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush().map_err(|e| DriverError::io(&self.path, e))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn sample(time: f64, throttle: f64, steering: f64, braking: f64) -> DriverSample {
        DriverSample {
            time,
            inputs: DriverInputs::new(throttle, steering, braking),
        }
    }

    #[test]
    fn test_interpolates_and_holds() {
        let driver = PlaybackDriver::from_samples(vec![
            sample(2.0, 1.0, -0.5, 0.0),
            sample(1.0, 0.0, 0.5, 0.0),
        ])
        .unwrap();
        assert_eq!(driver.samples()[0].time, 1.0);

        assert_eq!(driver.inputs_at(0.0), driver.samples()[0].inputs);
        assert_eq!(driver.inputs_at(9.0), driver.samples()[1].inputs);
        let mid = driver.inputs_at(1.5);
        assert_relative_eq!(mid.throttle, 0.5);
        assert_relative_eq!(mid.steering, 0.0);
    }

    #[test]
    fn test_parse_data_file() {
        let text = "# time steering throttle braking\n0 0 0 0\n\n1.0 0.25 0.5 0\n2 -2 1 0.5\n";
        let samples = parse_samples(text, Path::new("inputs.txt")).unwrap();
        assert_eq!(samples.len(), 3);
        assert_eq!(samples[1].inputs.steering, 0.25);
        assert_eq!(samples[1].inputs.throttle, 0.5);
        // Out-of-range values are clamped
        assert_eq!(samples[2].inputs.steering, -1.0);
    }

    #[test]
    fn test_parse_errors_name_the_line() {
        let err = parse_samples("0 0 0 0\n1 0 0\n", Path::new("bad.txt")).unwrap_err();
        assert!(matches!(err, DriverError::Parse { line: 2, .. }));
        assert!(err.to_string().starts_with("bad.txt:2:"));

        let err = parse_samples("0 zero 0 0\n", Path::new("bad.txt")).unwrap_err();
        assert!(matches!(err, DriverError::Parse { line: 1, .. }));
    }

    #[test]
    fn test_empty_and_missing_files() {
        assert!(matches!(
            PlaybackDriver::from_samples(Vec::new()),
            Err(DriverError::Empty(_))
        ));
        assert!(matches!(
            PlaybackDriver::from_file("/nonexistent/driver_inputs.txt"),
            Err(DriverError::Io { .. })
        ));
    }

    #[test]
    fn test_recording_plays_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(INPUTS_FILE_NAME);
        let mut recorder = InputRecorder::create(&path).unwrap();
        recorder.record(0.0, &DriverInputs::ZERO).unwrap();
        recorder.record(0.5, &DriverInputs::new(0.7, 0.3, 0.0)).unwrap();
        recorder.flush().unwrap();
        assert_eq!(recorder.rows(), 2);

        let mut driver = PlaybackDriver::from_file(&path).unwrap();
        driver.synchronize(0.25, &VehicleState::default());
        assert_relative_eq!(driver.inputs().throttle, 0.35, epsilon = 1e-12);
        assert_relative_eq!(driver.inputs().steering, 0.15, epsilon = 1e-12);
    }
}
