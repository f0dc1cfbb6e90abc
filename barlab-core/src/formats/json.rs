//! JSON: one object keyed by the datetime label, each value holding the full row.
//!
//! ```json
//! {"2024-01-01 00:00:00":{"timestamp":1704067200000,"open":2280.1,...}}
//! ```
//!
//! JSON has no representation for NaN or infinity, so non-finite values are
//! rejected instead of being silently written as `null`.

use super::index;
use super::{Decoder, Encoder, FormatError};
use crate::domain::{Bar, Dataset};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

const LABEL: &str = "JSON";

#[derive(Debug, Clone, Copy, Default)]
pub struct JsonFormat;

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct JsonRow {
    timestamp: i64,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: f64,
}

impl From<&Bar> for JsonRow {
    fn from(bar: &Bar) -> Self {
        Self {
            timestamp: bar.timestamp,
            open: bar.open,
            high: bar.high,
            low: bar.low,
            close: bar.close,
            volume: bar.volume,
        }
    }
}

fn json_error(path: &Path, err: serde_json::Error, corrupt: bool) -> FormatError {
    if err.is_io() {
        FormatError::io(LABEL, path, err.into())
    } else if corrupt {
        FormatError::corrupt(LABEL, err)
    } else {
        FormatError::serialization(LABEL, err)
    }
}

impl Encoder for JsonFormat {
    fn encode(&self, dataset: &Dataset, path: &Path) -> Result<(), FormatError> {
        let mut rows = BTreeMap::new();
        for bar in dataset.bars() {
            if !bar.is_finite() {
                return Err(FormatError::serialization(
                    LABEL,
                    format!("non-finite value in bar at {}", bar.timestamp),
                ));
            }
            let key = index::label(bar.timestamp, LABEL)?;
            rows.insert(key, JsonRow::from(bar));
        }

        let file = fs::File::create(path).map_err(|e| FormatError::io(LABEL, path, e))?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer(&mut writer, &rows).map_err(|e| json_error(path, e, false))?;
        writer.flush().map_err(|e| FormatError::io(LABEL, path, e))?;
        Ok(())
    }
}

impl Decoder for JsonFormat {
    fn decode(&self, path: &Path) -> Result<Vec<Bar>, FormatError> {
        let file = fs::File::open(path).map_err(|e| FormatError::io(LABEL, path, e))?;
        let rows: BTreeMap<String, JsonRow> = serde_json::from_reader(BufReader::new(file))
            .map_err(|e| json_error(path, e, true))?;

        let mut bars = Vec::with_capacity(rows.len());
        for (key, row) in rows {
            let expected = index::label(row.timestamp, LABEL)
                .map_err(|_| FormatError::corrupt(LABEL, format!("bad timestamp {}", row.timestamp)))?;
            if key != expected {
                return Err(FormatError::corrupt(
                    LABEL,
                    format!("key '{key}' disagrees with timestamp {}", row.timestamp),
                ));
            }
            bars.push(Bar::new(
                row.timestamp,
                row.open,
                row.high,
                row.low,
                row.close,
                row.volume,
            ));
        }
        bars.sort_by_key(|b| b.timestamp);
        Ok(bars)
    }
}
