//! Per-format benchmark result.

use barlab_core::formats::FileFormat;
use std::path::PathBuf;
use std::time::Duration;

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// Outcome of encoding the dataset in one format.
#[derive(Debug, Clone, PartialEq)]
pub struct FormatResult {
    pub format: FileFormat,
    pub path: PathBuf,
    pub elapsed: Duration,
    pub size_bytes: u64,
}

impl FormatResult {
    pub fn label(&self) -> &'static str {
        self.format.label()
    }

    pub fn seconds(&self) -> f64 {
        self.elapsed.as_secs_f64()
    }

    /// Size in mebibytes (bytes / 1024 / 1024).
    pub fn size_mb(&self) -> f64 {
        self.size_bytes as f64 / BYTES_PER_MB
    }

    /// `CSV: Time = 0.01 seconds, Size = 0.07 MB`
    pub fn summary_line(&self) -> String {
        format!(
            "{}: Time = {:.2} seconds, Size = {:.2} MB",
            self.label(),
            self.seconds(),
            self.size_mb()
        )
    }
}
