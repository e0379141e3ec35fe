//! Output directory layout.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::config::OutputConfig;
use crate::error::{Result, RunError};

/// Subdirectory holding captured frames.
pub const IMG_DIR: &str = "IMG";

/// Telemetry file name.
pub const TELEMETRY_FILE_NAME: &str = "vehicle_output.csv";

/// Run summary file name.
pub const SUMMARY_FILE_NAME: &str = "summary.txt";

/// File name of captured frame `number` (1-based, zero-padded to 3 digits).
#[must_use]
pub fn frame_file_name(number: u64) -> String {
    format!("img_{number:03}.jpg")
}

/// Created output directories of one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputLayout {
    root: PathBuf,
    img_dir: Option<PathBuf>,
}

impl OutputLayout {
    /// Create `<out_dir>` and, if frames are captured, `<out_dir>/IMG`.
    ///
    /// Existing directories are reused.
    pub fn prepare(config: &OutputConfig) -> Result<Self> {
        let root = config.out_dir.clone();
        create_dir(&root)?;

        let img_dir = if config.img_output {
            let dir = root.join(IMG_DIR);
            create_dir(&dir)?;
            Some(dir)
        } else {
            None
        };

        info!(out_dir = %root.display(), frames = img_dir.is_some(), "output directory ready");
        Ok(Self { root, img_dir })
    }

    /// Output directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Frame directory, if frames are captured.
    #[must_use]
    pub fn img_dir(&self) -> Option<&Path> {
        self.img_dir.as_deref()
    }

    /// Path of captured frame `number`, if frames are captured.
    #[must_use]
    pub fn frame_path(&self, number: u64) -> Option<PathBuf> {
        self.img_dir.as_ref().map(|dir| dir.join(frame_file_name(number)))
    }

    /// Path of a file directly under the output directory.
    #[must_use]
    pub fn file(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    /// Write the run summary to `<out_dir>/summary.txt`.
    pub fn write_summary(&self, summary: &str) -> Result<PathBuf> {
        let path = self.file(SUMMARY_FILE_NAME);
        fs::write(&path, summary).map_err(|e| RunError::io(&path, e))?;
        Ok(path)
    }
}

fn create_dir(path: &Path) -> Result<()> {
    fs::create_dir_all(path).map_err(|source| RunError::OutputDir {
        path: path.to_path_buf(),
        source,
    })
}
