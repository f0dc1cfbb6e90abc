//! Parquet: Snappy-compressed columnar file, datetime index as the last column.

use super::frame::{from_frame, to_frame, IndexPlacement};
use super::{Decoder, Encoder, FormatError};
use crate::domain::{Bar, Dataset};
use polars::prelude::*;
use std::fs;
use std::path::Path;

const LABEL: &str = "Parquet";

#[derive(Debug, Clone, Copy, Default)]
pub struct ParquetFormat;

impl Encoder for ParquetFormat {
    fn encode(&self, dataset: &Dataset, path: &Path) -> Result<(), FormatError> {
        let mut df = to_frame(dataset, IndexPlacement::Trailing, LABEL)?;
        let mut buf = Vec::new();
        ParquetWriter::new(&mut buf)
            .with_compression(ParquetCompression::Snappy)
            .finish(&mut df)
            .map_err(|e| FormatError::serialization(LABEL, format!("write parquet: {e}")))?;
        fs::write(path, buf).map_err(|e| FormatError::io(LABEL, path, e))
    }
}

impl Decoder for ParquetFormat {
    fn decode(&self, path: &Path) -> Result<Vec<Bar>, FormatError> {
        let file = fs::File::open(path).map_err(|e| FormatError::io(LABEL, path, e))?;
        let df = ParquetReader::new(file)
            .finish()
            .map_err(|e| FormatError::corrupt(LABEL, format!("read parquet: {e}")))?;
        from_frame(&df, LABEL)
    }
}
