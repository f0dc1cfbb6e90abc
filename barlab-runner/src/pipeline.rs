//! End-to-end run: fetch → benchmark every format → verify.

use crate::benchmark::{run_benchmarks, BenchError, BenchProgress};
use crate::config::{BenchConfig, ConfigError, DataSource};
use crate::report::ComparisonTable;
use crate::result::FormatResult;
use crate::verify::{verify_result, VerifyError};
use barlab_core::data::{BinanceProvider, DataError, DataProvider, RateLimiter, SyntheticProvider};
use barlab_core::domain::Dataset;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("fetching bars failed: {0}")]
    Fetch(#[from] DataError),

    #[error("benchmark failed: {0}")]
    Bench(#[from] BenchError),

    #[error("{format} verification failed: {reason}")]
    Verify {
        format: &'static str,
        #[source]
        reason: VerifyError,
    },
}

/// Everything a finished run produced.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub dataset: Dataset,
    pub results: Vec<FormatResult>,
    /// True when every file was decoded and matched the dataset.
    pub verified: bool,
}

impl RunReport {
    pub fn table(&self) -> ComparisonTable {
        ComparisonTable::from_results(&self.results)
    }
}

/// Build the data provider the config asks for.
pub fn build_provider(config: &BenchConfig) -> Result<Box<dyn DataProvider>, DataError> {
    Ok(match config.source {
        DataSource::Binance => Box::new(
            BinanceProvider::new(RateLimiter::new(config.rate_limit()))?
                .with_base_url(config.api_url.clone()),
        ),
        DataSource::Synthetic => Box::new(SyntheticProvider::new()),
    })
}

/// Run the benchmark with the window ending at `now_ms`.
///
/// Nothing is retried: the first fetch, encode or verification error ends
/// the run. Files already written stay on disk.
pub fn run(
    config: &BenchConfig,
    provider: &dyn DataProvider,
    now_ms: i64,
    progress: &dyn BenchProgress,
) -> Result<RunReport, RunError> {
    config.validate()?;

    let request = config.fetch_request(now_ms);
    info!(
        provider = provider.name(),
        symbol = %request.symbol,
        timeframe = %request.timeframe,
        start_ms = request.start_ms,
        end_ms = request.end_ms,
        limit = request.limit,
        "fetching bars"
    );
    let dataset = provider.fetch(&request)?;
    info!(bars = dataset.len(), span = ?dataset.span(), "fetched");

    let stem = config.file_stem();
    let results = run_benchmarks(
        &config.formats,
        &dataset,
        &config.output_dir,
        &stem,
        progress,
    )?;
    info!(formats = results.len(), output_dir = %config.output_dir.display(), "benchmarked");

    if config.verify {
        for result in &results {
            verify_result(&dataset, result).map_err(|reason| RunError::Verify {
                format: result.label(),
                reason,
            })?;
        }
        info!("all outputs verified");
    }

    Ok(RunReport {
        dataset,
        results,
        verified: config.verify,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::benchmark::NoProgress;

    #[test]
    fn builds_each_provider_kind() {
        let mut config = BenchConfig::default();
        assert_eq!(build_provider(&config).unwrap().name(), "binance");
        config.source = DataSource::Synthetic;
        assert_eq!(build_provider(&config).unwrap().name(), "synthetic");
    }

    #[test]
    fn invalid_config_is_rejected_before_fetching() {
        let config = BenchConfig {
            limit: 0,
            ..BenchConfig::default()
        };
        let err = run(&config, &SyntheticProvider::new(), 0, &NoProgress).unwrap_err();
        assert!(matches!(err, RunError::Config(_)));
    }
}
