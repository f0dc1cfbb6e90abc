//! barlab runner: benchmark orchestration on top of `barlab-core`.
//!
//! This crate provides:
//! - TOML-backed run configuration with validation
//! - Timed, sequential encoding of the fetched dataset in each format
//! - Read-back verification of every written file
//! - The comparison table printed after a run

pub mod benchmark;
pub mod config;
pub mod pipeline;
pub mod report;
pub mod result;
pub mod verify;

pub use benchmark::{
    file_name, measure, run_benchmarks, BenchError, BenchProgress, Measurement, NoProgress,
    StdoutProgress,
};
pub use config::{BenchConfig, ConfigError, DataSource, MAX_LOOKBACK_DAYS};
pub use pipeline::{build_provider, run, RunError, RunReport};
pub use report::{ComparisonTable, TableRow};
pub use result::FormatResult;
pub use verify::{verify_result, VerifyError};
