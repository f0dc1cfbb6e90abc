//! Timed encoding.
//!
//! Each format is written once: the clock covers only the encoder call, and the
//! size comes from filesystem metadata afterwards. Formats run sequentially in
//! the configured order and the first failure stops the run.

use crate::result::FormatResult;
use barlab_core::domain::Dataset;
use barlab_core::formats::{Encoder, FileFormat, FormatError};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum BenchError {
    #[error("writing {}: {source}", path.display())]
    Encode {
        path: PathBuf,
        #[source]
        source: FormatError,
    },

    #[error("cannot read size of {}: {source}", path.display())]
    Metadata {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl BenchError {
    /// True when the failure came from the filesystem rather than the data.
    pub fn is_io(&self) -> bool {
        match self {
            BenchError::Encode { source, .. } => source.is_io(),
            BenchError::Metadata { .. } => true,
        }
    }

    pub fn path(&self) -> &Path {
        match self {
            BenchError::Encode { path, .. } | BenchError::Metadata { path, .. } => path,
        }
    }
}

/// Raw timing and size of one encoder call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Measurement {
    pub path: PathBuf,
    pub elapsed: Duration,
    pub size_bytes: u64,
}

/// `<stem>_<extension>`, e.g. `ethusdt_1m_parquet`.
pub fn file_name(stem: &str, extension: &str) -> String {
    format!("{stem}_{extension}")
}

/// Encode `dataset` into `output_dir/<stem>_<extension>` and measure it.
pub fn measure(
    encoder: &dyn Encoder,
    extension: &str,
    dataset: &Dataset,
    output_dir: &Path,
    stem: &str,
) -> Result<Measurement, BenchError> {
    let path = output_dir.join(file_name(stem, extension));

    let start = Instant::now();
    let encoded = encoder.encode(dataset, &path);
    let elapsed = start.elapsed();
    encoded.map_err(|source| BenchError::Encode {
        path: path.clone(),
        source,
    })?;

    let size_bytes = std::fs::metadata(&path)
        .map_err(|source| BenchError::Metadata {
            path: path.clone(),
            source,
        })?
        .len();

    debug!(path = %path.display(), ?elapsed, size_bytes, "encoded");
    Ok(Measurement {
        path,
        elapsed,
        size_bytes,
    })
}

/// Progress callbacks for a benchmark run.
pub trait BenchProgress {
    /// Called before a format is encoded.
    fn on_start(&self, format: FileFormat, index: usize, total: usize);

    /// Called after a format has been encoded and measured.
    fn on_complete(&self, result: &FormatResult);
}

/// Prints the per-format summary line to stdout as each format completes.
pub struct StdoutProgress;

impl BenchProgress for StdoutProgress {
    fn on_start(&self, _format: FileFormat, _index: usize, _total: usize) {}

    fn on_complete(&self, result: &FormatResult) {
        println!("{}", result.summary_line());
    }
}

/// Discards progress.
pub struct NoProgress;

impl BenchProgress for NoProgress {
    fn on_start(&self, _format: FileFormat, _index: usize, _total: usize) {}

    fn on_complete(&self, _result: &FormatResult) {}
}

/// Benchmark each format in order, stopping at the first failure.
pub fn run_benchmarks(
    formats: &[FileFormat],
    dataset: &Dataset,
    output_dir: &Path,
    stem: &str,
    progress: &dyn BenchProgress,
) -> Result<Vec<FormatResult>, BenchError> {
    let total = formats.len();
    let mut results = Vec::with_capacity(total);
    for (index, &format) in formats.iter().enumerate() {
        progress.on_start(format, index, total);
        let m = measure(
            format.encoder(),
            format.extension(),
            dataset,
            output_dir,
            stem,
        )?;
        let result = FormatResult {
            format,
            path: m.path,
            elapsed: m.elapsed,
            size_bytes: m.size_bytes,
        };
        progress.on_complete(&result);
        results.push(result);
    }
    Ok(results)
}
