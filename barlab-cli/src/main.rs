//! barlab CLI: fetch OHLCV bars once, write them in five file formats, and
//! compare how long each write took and how large each file is.
//!
//! With no arguments: last 90 days of ETH/USDT 1m bars from Binance (one page
//! of 1000), files `ethusdt_1m_<ext>` in the current directory, the table on
//! stdout, then the interactive chart.

use anyhow::{Context, Result};
use barlab_core::formats::FileFormat;
use barlab_runner::{build_provider, run, BenchConfig, DataSource, StdoutProgress};
use clap::Parser;
use std::io::IsTerminal;
use std::path::PathBuf;
use tracing::warn;

#[derive(Parser)]
#[command(
    name = "barlab",
    version,
    about = "barlab: OHLCV file-format write benchmark (CSV, Parquet, JSON, HDF5, Feather)"
)]
struct Cli {
    /// Path to a TOML config file. Flags below override its values.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory the five output files are written to.
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Use deterministic synthetic bars instead of the exchange.
    #[arg(long, default_value_t = false)]
    synthetic: bool,

    /// Comma-separated subset of formats, in run order (e.g. csv,parquet).
    #[arg(long, value_delimiter = ',')]
    formats: Option<Vec<FileFormat>>,

    /// Skip the interactive chart.
    #[arg(long, default_value_t = false)]
    no_chart: bool,

    /// Skip decoding the written files back for verification.
    #[arg(long, default_value_t = false)]
    no_verify: bool,

    /// Also write the comparison table as CSV to this path.
    #[arg(long)]
    table_csv: Option<PathBuf>,

    /// Log filter used when BARLAB_LOG is unset (e.g. info, barlab_core=debug).
    #[arg(long, default_value = "warn")]
    log_level: String,
}

/// Install the stderr subscriber; `BARLAB_LOG` wins over `--log-level`.
fn init_tracing(log_level: &str) -> Result<()> {
    let filter = std::env::var("BARLAB_LOG").unwrap_or_else(|_| log_level.to_string());
    let env_filter = tracing_subscriber::EnvFilter::try_new(&filter)
        .with_context(|| format!("invalid log filter '{filter}'"))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();
    Ok(())
}

fn resolve_config(cli: &Cli) -> Result<BenchConfig> {
    let mut config = match &cli.config {
        Some(path) => BenchConfig::from_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => BenchConfig::default(),
    };
    if let Some(dir) = &cli.output_dir {
        config.output_dir = dir.clone();
    }
    if cli.synthetic {
        config.source = DataSource::Synthetic;
    }
    if let Some(formats) = &cli.formats {
        config.formats = formats.clone();
    }
    if cli.no_chart {
        config.chart = false;
    }
    if cli.no_verify {
        config.verify = false;
    }
    config.validate().context("invalid configuration")?;
    Ok(config)
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level)?;

    let config = resolve_config(&cli)?;
    std::fs::create_dir_all(&config.output_dir).with_context(|| {
        format!(
            "failed to create output dir: {}",
            config.output_dir.display()
        )
    })?;

    let provider = build_provider(&config).context("failed to set up data provider")?;
    let now_ms = chrono::Utc::now().timestamp_millis();
    let report = run(&config, provider.as_ref(), now_ms, &StdoutProgress)
        .context("benchmark run failed")?;

    let table = report.table();
    println!();
    print!("{table}");

    if let Some(path) = &cli.table_csv {
        let csv = table.to_csv().context("failed to render table as CSV")?;
        std::fs::write(path, csv)
            .with_context(|| format!("failed to write {}", path.display()))?;
    }

    if config.chart {
        if std::io::stdout().is_terminal() {
            barlab_tui::show_chart(&report.results).context("chart display failed")?;
        } else {
            warn!("stdout is not a terminal, skipping the chart");
        }
    }

    Ok(())
}
