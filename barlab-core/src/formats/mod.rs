//! File-format codecs.
//!
//! Each format is a unit struct implementing [`Encoder`] (the benchmarked
//! operation) and [`Decoder`] (used to verify what was written). [`FileFormat`]
//! is the registry the runner iterates over.
//!
//! All encoders derive the same datetime index from the millisecond timestamp
//! (see [`index`]) and truncate-and-write their destination.

pub mod delimited;
pub mod feather;
mod frame;
pub mod hdf5;
pub mod index;
pub mod json;
pub mod parquet;

use crate::domain::{Bar, Dataset};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

pub use delimited::CsvFormat;
pub use feather::FeatherFormat;
pub use hdf5::Hdf5Format;
pub use json::JsonFormat;
pub use parquet::ParquetFormat;

/// Errors raised while writing or reading a format.
#[derive(Debug, Error)]
pub enum FormatError {
    #[error("{format}: I/O error on {}: {source}", path.display())]
    Io {
        format: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{format}: cannot serialize dataset: {reason}")]
    Serialization { format: &'static str, reason: String },

    #[error("{format}: unreadable file: {reason}")]
    Corrupt { format: &'static str, reason: String },
}

impl FormatError {
    pub fn io(format: &'static str, path: &Path, source: std::io::Error) -> Self {
        FormatError::Io {
            format,
            path: path.to_path_buf(),
            source,
        }
    }

    pub fn serialization(format: &'static str, reason: impl fmt::Display) -> Self {
        FormatError::Serialization {
            format,
            reason: reason.to_string(),
        }
    }

    pub fn corrupt(format: &'static str, reason: impl fmt::Display) -> Self {
        FormatError::Corrupt {
            format,
            reason: reason.to_string(),
        }
    }

    pub fn is_io(&self) -> bool {
        matches!(self, FormatError::Io { .. })
    }
}

/// Writes a dataset to a file. This is the operation being timed.
pub trait Encoder: Send + Sync {
    fn encode(&self, dataset: &Dataset, path: &Path) -> Result<(), FormatError>;
}

/// Reads back the bars an [`Encoder`] wrote.
pub trait Decoder: Send + Sync {
    fn decode(&self, path: &Path) -> Result<Vec<Bar>, FormatError>;
}

/// The five benchmarked formats, in canonical report order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileFormat {
    Csv,
    Parquet,
    Json,
    Hdf5,
    Feather,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown file format '{0}' (expected csv, parquet, json, hdf5/h5 or feather)")]
pub struct ParseFormatError(pub String);

impl FileFormat {
    pub const ALL: [FileFormat; 5] = [
        FileFormat::Csv,
        FileFormat::Parquet,
        FileFormat::Json,
        FileFormat::Hdf5,
        FileFormat::Feather,
    ];

    /// Display name used in reports.
    pub fn label(self) -> &'static str {
        match self {
            FileFormat::Csv => "CSV",
            FileFormat::Parquet => "Parquet",
            FileFormat::Json => "JSON",
            FileFormat::Hdf5 => "HDF5",
            FileFormat::Feather => "Feather",
        }
    }

    /// Suffix used in output file names.
    pub fn extension(self) -> &'static str {
        match self {
            FileFormat::Csv => "csv",
            FileFormat::Parquet => "parquet",
            FileFormat::Json => "json",
            FileFormat::Hdf5 => "h5",
            FileFormat::Feather => "feather",
        }
    }

    pub fn encoder(self) -> &'static dyn Encoder {
        match self {
            FileFormat::Csv => &CsvFormat,
            FileFormat::Parquet => &ParquetFormat,
            FileFormat::Json => &JsonFormat,
            FileFormat::Hdf5 => &Hdf5Format,
            FileFormat::Feather => &FeatherFormat,
        }
    }

    pub fn decoder(self) -> &'static dyn Decoder {
        match self {
            FileFormat::Csv => &CsvFormat,
            FileFormat::Parquet => &ParquetFormat,
            FileFormat::Json => &JsonFormat,
            FileFormat::Hdf5 => &Hdf5Format,
            FileFormat::Feather => &FeatherFormat,
        }
    }
}

impl fmt::Display for FileFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for FileFormat {
    type Err = ParseFormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_ascii_lowercase();
        FileFormat::ALL
            .into_iter()
            .find(|f| f.label().to_ascii_lowercase() == needle || f.extension() == needle)
            .ok_or_else(|| ParseFormatError(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_order_and_extensions() {
        let exts: Vec<&str> = FileFormat::ALL.iter().map(|f| f.extension()).collect();
        assert_eq!(exts, vec!["csv", "parquet", "json", "h5", "feather"]);
    }

    #[test]
    fn parse_by_label_or_extension() {
        assert_eq!("HDF5".parse::<FileFormat>().unwrap(), FileFormat::Hdf5);
        assert_eq!("h5".parse::<FileFormat>().unwrap(), FileFormat::Hdf5);
        assert_eq!("Feather".parse::<FileFormat>().unwrap(), FileFormat::Feather);
        assert!("xlsx".parse::<FileFormat>().is_err());
    }

    #[test]
    fn display_is_label() {
        assert_eq!(FileFormat::Parquet.to_string(), "Parquet");
    }

    #[test]
    fn io_errors_are_flagged() {
        let err = FormatError::io(
            "CSV",
            Path::new("/nope/x.csv"),
            std::io::Error::from(std::io::ErrorKind::PermissionDenied),
        );
        assert!(err.is_io());
        assert!(err.to_string().contains("/nope/x.csv"));
        assert!(!FormatError::serialization("JSON", "NaN").is_io());
    }
}
