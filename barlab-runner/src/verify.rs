//! Read-back verification of written files.
//!
//! Runs after all timing is done: each file is decoded with its format's
//! decoder and compared with the source dataset by row count and fingerprint.

use crate::result::FormatResult;
use barlab_core::domain::{fingerprint, Dataset};
use barlab_core::formats::FormatError;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum VerifyError {
    #[error("cannot decode: {0}")]
    Decode(#[from] FormatError),

    #[error("expected {expected} rows, decoded {actual}")]
    RowCount { expected: usize, actual: usize },

    #[error("fingerprint mismatch (expected {expected}, got {actual})")]
    Fingerprint { expected: String, actual: String },
}

/// Check one written file against the dataset it was written from.
pub fn verify_result(dataset: &Dataset, result: &FormatResult) -> Result<(), VerifyError> {
    let bars = result.format.decoder().decode(&result.path)?;
    if bars.len() != dataset.len() {
        return Err(VerifyError::RowCount {
            expected: dataset.len(),
            actual: bars.len(),
        });
    }
    let expected = dataset.fingerprint();
    let actual = fingerprint(&bars);
    if actual != expected {
        return Err(VerifyError::Fingerprint { expected, actual });
    }
    debug!(format = result.label(), rows = bars.len(), "verified");
    Ok(())
}
