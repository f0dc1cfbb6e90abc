//! Serializable benchmark configuration.
//!
//! Every field has a default, so an empty TOML document (or no file at all)
//! reproduces the stock run: the last 90 days of `ETH/USDT` 1m bars from
//! Binance, one page of 1000, written in all five formats to the current
//! directory.

use barlab_core::data::{exchange_symbol, BINANCE_MAX_LIMIT, BINANCE_SPOT_BASE};
use barlab_core::domain::Timeframe;
use barlab_core::formats::FileFormat;
use barlab_core::FetchRequest;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Longest lookback the benchmark accepts, in days.
pub const MAX_LOOKBACK_DAYS: u32 = 90;

const DAY_MS: i64 = 24 * 60 * 60 * 1000;

/// Errors loading or validating a [`BenchConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Where bars come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataSource {
    #[default]
    Binance,
    Synthetic,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BenchConfig {
    /// Unified pair notation, e.g. `ETH/USDT`.
    pub symbol: String,
    pub timeframe: Timeframe,
    pub lookback_days: u32,
    /// Bars requested in the single page.
    pub limit: u32,
    /// Minimum spacing between exchange requests.
    pub rate_limit_ms: u64,
    pub api_url: String,
    pub output_dir: PathBuf,
    /// Formats to benchmark, in run order.
    pub formats: Vec<FileFormat>,
    pub source: DataSource,
    /// Decode every written file and compare it with the fetched data.
    pub verify: bool,
    /// Show the comparison chart after the table.
    pub chart: bool,
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            symbol: "ETH/USDT".into(),
            timeframe: Timeframe::OneMinute,
            lookback_days: MAX_LOOKBACK_DAYS,
            limit: BINANCE_MAX_LIMIT,
            rate_limit_ms: 1200,
            api_url: BINANCE_SPOT_BASE.into(),
            output_dir: PathBuf::from("."),
            formats: FileFormat::ALL.to_vec(),
            source: DataSource::Binance,
            verify: true,
            chart: true,
        }
    }
}

impl BenchConfig {
    /// Parse a config from a TOML string and validate it.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a config from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if exchange_symbol(&self.symbol).is_empty() {
            return Err(ConfigError::Invalid("symbol must not be empty".into()));
        }
        if self.lookback_days == 0 || self.lookback_days > MAX_LOOKBACK_DAYS {
            return Err(ConfigError::Invalid(format!(
                "lookback_days must be between 1 and {MAX_LOOKBACK_DAYS}, got {}",
                self.lookback_days
            )));
        }
        if self.limit == 0 || self.limit > BINANCE_MAX_LIMIT {
            return Err(ConfigError::Invalid(format!(
                "limit must be between 1 and {BINANCE_MAX_LIMIT}, got {}",
                self.limit
            )));
        }
        if self.formats.is_empty() {
            return Err(ConfigError::Invalid("at least one format is required".into()));
        }
        for (i, format) in self.formats.iter().enumerate() {
            if self.formats[..i].contains(format) {
                return Err(ConfigError::Invalid(format!("format {format} listed twice")));
            }
        }
        Ok(())
    }

    pub fn rate_limit(&self) -> Duration {
        Duration::from_millis(self.rate_limit_ms)
    }

    /// Output file stem: `ETH/USDT` at `1m` becomes `ethusdt_1m`.
    pub fn file_stem(&self) -> String {
        format!(
            "{}_{}",
            exchange_symbol(&self.symbol).to_lowercase(),
            self.timeframe
        )
    }

    /// The fetch window ending at `now_ms`.
    pub fn fetch_request(&self, now_ms: i64) -> FetchRequest {
        let start_ms = now_ms - i64::from(self.lookback_days) * DAY_MS;
        FetchRequest::new(&self.symbol, self.timeframe, start_ms, now_ms, self.limit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_is_default() {
        let config = BenchConfig::from_toml("").unwrap();
        assert_eq!(config, BenchConfig::default());
        assert_eq!(config.formats, FileFormat::ALL.to_vec());
        assert_eq!(config.rate_limit(), Duration::from_millis(1200));
    }

    #[test]
    fn parses_overrides() {
        let config = BenchConfig::from_toml(
            r#"
            symbol = "BTC/USDT"
            timeframe = "5m"
            lookback_days = 7
            limit = 500
            output_dir = "out"
            formats = ["parquet", "hdf5"]
            source = "synthetic"
            chart = false
            "#,
        )
        .unwrap();
        assert_eq!(config.timeframe, Timeframe::FiveMinutes);
        assert_eq!(config.formats, vec![FileFormat::Parquet, FileFormat::Hdf5]);
        assert_eq!(config.source, DataSource::Synthetic);
        assert!(config.verify);
        assert!(!config.chart);
        assert_eq!(config.file_stem(), "btcusdt_5m");
    }

    #[test]
    fn rejects_out_of_range_values() {
        assert!(matches!(
            BenchConfig::from_toml("lookback_days = 91"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            BenchConfig::from_toml("limit = 1001"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            BenchConfig::from_toml("limit = 0"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            BenchConfig::from_toml("formats = []"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            BenchConfig::from_toml(r#"formats = ["csv", "csv"]"#),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            BenchConfig::from_toml(r#"symbol = "/""#),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn rejects_unknown_keys_and_values() {
        assert!(matches!(
            BenchConfig::from_toml("colour = 1"),
            Err(ConfigError::Parse(_))
        ));
        assert!(matches!(
            BenchConfig::from_toml(r#"formats = ["xlsx"]"#),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let err = BenchConfig::from_file(Path::new("/definitely/not/here.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn default_stem_and_window() {
        let config = BenchConfig::default();
        assert_eq!(config.file_stem(), "ethusdt_1m");
        let request = config.fetch_request(100 * DAY_MS);
        assert_eq!(request.end_ms - request.start_ms, 90 * DAY_MS);
        assert_eq!(request.limit, 1000);
        assert_eq!(request.symbol, "ETH/USDT");
    }
}
