//! Feather: uncompressed Arrow IPC file with the datetime index materialized
//! as the leading column.

use super::frame::{from_frame, to_frame, IndexPlacement};
use super::{Decoder, Encoder, FormatError};
use crate::domain::{Bar, Dataset};
use polars::prelude::*;
use std::fs;
use std::path::Path;

const LABEL: &str = "Feather";

#[derive(Debug, Clone, Copy, Default)]
pub struct FeatherFormat;

impl Encoder for FeatherFormat {
    fn encode(&self, dataset: &Dataset, path: &Path) -> Result<(), FormatError> {
        let mut df = to_frame(dataset, IndexPlacement::Leading, LABEL)?;
        let mut buf = Vec::new();
        IpcWriter::new(&mut buf)
            .with_compression(None)
            .finish(&mut df)
            .map_err(|e| FormatError::serialization(LABEL, format!("write ipc: {e}")))?;
        fs::write(path, buf).map_err(|e| FormatError::io(LABEL, path, e))
    }
}

impl Decoder for FeatherFormat {
    fn decode(&self, path: &Path) -> Result<Vec<Bar>, FormatError> {
        let file = fs::File::open(path).map_err(|e| FormatError::io(LABEL, path, e))?;
        let df = IpcReader::new(file)
            .finish()
            .map_err(|e| FormatError::corrupt(LABEL, format!("read ipc: {e}")))?;
        from_frame(&df, LABEL)
    }
}
