//! Polars DataFrame conversion shared by the columnar formats.

use super::index::INDEX_COLUMN;
use super::FormatError;
use crate::domain::{Bar, Dataset};
use polars::prelude::*;

pub(crate) const VALUE_COLUMNS: [&str; 6] = ["timestamp", "open", "high", "low", "close", "volume"];

/// Where the datetime index column sits in the written frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum IndexPlacement {
    Leading,
    Trailing,
}

/// Build the on-disk frame: the six value columns plus the datetime index.
pub(crate) fn to_frame(
    dataset: &Dataset,
    placement: IndexPlacement,
    format: &'static str,
) -> Result<DataFrame, FormatError> {
    let bars = dataset.bars();
    let timestamps: Vec<i64> = bars.iter().map(|b| b.timestamp).collect();
    let opens: Vec<f64> = bars.iter().map(|b| b.open).collect();
    let highs: Vec<f64> = bars.iter().map(|b| b.high).collect();
    let lows: Vec<f64> = bars.iter().map(|b| b.low).collect();
    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
    let volumes: Vec<f64> = bars.iter().map(|b| b.volume).collect();

    let index = Column::new(INDEX_COLUMN.into(), timestamps.clone())
        .cast(&DataType::Datetime(TimeUnit::Milliseconds, None))
        .map_err(|e| FormatError::serialization(format, format!("datetime cast: {e}")))?;

    let mut columns = vec![
        Column::new("timestamp".into(), timestamps),
        Column::new("open".into(), opens),
        Column::new("high".into(), highs),
        Column::new("low".into(), lows),
        Column::new("close".into(), closes),
        Column::new("volume".into(), volumes),
    ];
    match placement {
        IndexPlacement::Leading => columns.insert(0, index),
        IndexPlacement::Trailing => columns.push(index),
    }

    DataFrame::new(columns)
        .map_err(|e| FormatError::serialization(format, format!("dataframe creation: {e}")))
}

/// Convert a frame read from disk back to bars.
///
/// Nulls are rejected rather than defaulted, and the datetime index must agree
/// with the timestamp column row for row.
pub(crate) fn from_frame(df: &DataFrame, format: &'static str) -> Result<Vec<Bar>, FormatError> {
    let corrupt = |what: &str, e: PolarsError| FormatError::corrupt(format, format!("{what}: {e}"));

    for name in VALUE_COLUMNS.iter().chain(std::iter::once(&INDEX_COLUMN)) {
        if df.column(name).is_err() {
            return Err(FormatError::corrupt(
                format,
                format!("missing column '{name}'"),
            ));
        }
    }

    let timestamps = df
        .column("timestamp")
        .and_then(|c| c.cast(&DataType::Int64))
        .map_err(|e| corrupt("timestamp column", e))?;
    let index = df
        .column(INDEX_COLUMN)
        .and_then(|c| c.cast(&DataType::Int64))
        .map_err(|e| corrupt("datetime column", e))?;
    let ts_ca = timestamps.i64().map_err(|e| corrupt("timestamp column type", e))?;
    let index_ca = index.i64().map_err(|e| corrupt("datetime column type", e))?;

    let float = |name: &str| -> Result<Float64Chunked, FormatError> {
        df.column(name)
            .and_then(|c| c.f64().cloned())
            .map_err(|e| corrupt(&format!("{name} column type"), e))
    };
    let open_ca = float("open")?;
    let high_ca = float("high")?;
    let low_ca = float("low")?;
    let close_ca = float("close")?;
    let vol_ca = float("volume")?;

    let n = df.height();
    let mut bars = Vec::with_capacity(n);
    for i in 0..n {
        let null = |name: &str| FormatError::corrupt(format, format!("null {name} at row {i}"));
        let timestamp = ts_ca.get(i).ok_or_else(|| null("timestamp"))?;
        let indexed = index_ca.get(i).ok_or_else(|| null(INDEX_COLUMN))?;
        if indexed != timestamp {
            return Err(FormatError::corrupt(
                format,
                format!("row {i}: datetime index {indexed} disagrees with timestamp {timestamp}"),
            ));
        }
        bars.push(Bar {
            timestamp,
            open: open_ca.get(i).ok_or_else(|| null("open"))?,
            high: high_ca.get(i).ok_or_else(|| null("high"))?,
            low: low_ca.get(i).ok_or_else(|| null("low"))?,
            close: close_ca.get(i).ok_or_else(|| null("close"))?,
            volume: vol_ca.get(i).ok_or_else(|| null("volume"))?,
        });
    }
    Ok(bars)
}
