//! CSV: text table with the datetime index as the first column.
//!
//! Columns: datetime, timestamp, open, high, low, close, volume. Floats are
//! written in shortest round-trip form, so decoding reproduces the exact bits.
//! An empty dataset produces a header-only file.

use super::index::{self, INDEX_COLUMN};
use super::{Decoder, Encoder, FormatError};
use crate::domain::{Bar, Dataset};
use std::fs;
use std::path::Path;

const LABEL: &str = "CSV";

const HEADER: [&str; 7] = [
    INDEX_COLUMN,
    "timestamp",
    "open",
    "high",
    "low",
    "close",
    "volume",
];

#[derive(Debug, Clone, Copy, Default)]
pub struct CsvFormat;

/// Split csv failures into I/O errors and everything else.
fn csv_error(path: &Path, err: csv::Error) -> Result<FormatError, String> {
    let message = err.to_string();
    match err.into_kind() {
        csv::ErrorKind::Io(e) => Ok(FormatError::io(LABEL, path, e)),
        _ => Err(message),
    }
}

fn write_error(path: &Path, err: csv::Error) -> FormatError {
    csv_error(path, err).unwrap_or_else(|m| FormatError::serialization(LABEL, m))
}

fn read_error(path: &Path, err: csv::Error) -> FormatError {
    csv_error(path, err).unwrap_or_else(|m| FormatError::corrupt(LABEL, m))
}

impl Encoder for CsvFormat {
    fn encode(&self, dataset: &Dataset, path: &Path) -> Result<(), FormatError> {
        let file = fs::File::create(path).map_err(|e| FormatError::io(LABEL, path, e))?;
        let mut wtr = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);
        let fail = |e| write_error(path, e);

        wtr.write_record(HEADER).map_err(fail)?;
        for bar in dataset.bars() {
            wtr.write_record([
                index::label(bar.timestamp, LABEL)?,
                bar.timestamp.to_string(),
                bar.open.to_string(),
                bar.high.to_string(),
                bar.low.to_string(),
                bar.close.to_string(),
                bar.volume.to_string(),
            ])
            .map_err(fail)?;
        }
        wtr.flush().map_err(|e| FormatError::io(LABEL, path, e))?;
        Ok(())
    }
}

impl Decoder for CsvFormat {
    fn decode(&self, path: &Path) -> Result<Vec<Bar>, FormatError> {
        let file = fs::File::open(path).map_err(|e| FormatError::io(LABEL, path, e))?;
        let mut rdr = csv::ReaderBuilder::new().has_headers(true).from_reader(file);
        let fail = |e| read_error(path, e);

        let headers = rdr.headers().map_err(fail)?.clone();
        if headers.iter().ne(HEADER.iter().copied()) {
            return Err(FormatError::corrupt(
                LABEL,
                format!("unexpected header {:?}", headers.iter().collect::<Vec<_>>()),
            ));
        }

        let mut bars = Vec::new();
        for (row, record) in rdr.records().enumerate() {
            let record = record.map_err(fail)?;
            let field = |i: usize| record.get(i).unwrap_or_default();
            let bad = |i: usize| {
                FormatError::corrupt(LABEL, format!("row {row}: bad {} '{}'", HEADER[i], field(i)))
            };
            let float = |i: usize| field(i).parse::<f64>().map_err(|_| bad(i));

            let timestamp: i64 = field(1).parse().map_err(|_| bad(1))?;
            if field(0) != index::label(timestamp, LABEL)? {
                return Err(FormatError::corrupt(
                    LABEL,
                    format!("row {row}: datetime '{}' disagrees with timestamp {timestamp}", field(0)),
                ));
            }
            bars.push(Bar {
                timestamp,
                open: float(2)?,
                high: float(3)?,
                low: float(4)?,
                close: float(5)?,
                volume: float(6)?,
            });
        }
        Ok(bars)
    }
}
