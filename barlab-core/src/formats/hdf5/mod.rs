//! HDF5: a self-contained writer and reader for the subset of the container
//! the benchmark needs.
//!
//! The file holds a single one-dimensional dataset `data` under the root
//! group. Its element type is a compound of seven little-endian 8-byte fields:
//!
//! | member      | type | offset |
//! |-------------|------|--------|
//! | `datetime`  | i64  | 0      |
//! | `timestamp` | i64  | 8      |
//! | `open`      | f64  | 16     |
//! | `high`      | f64  | 24     |
//! | `low`       | f64  | 32     |
//! | `close`     | f64  | 40     |
//! | `volume`    | f64  | 48     |
//!
//! `datetime` is the index in epoch nanoseconds. Layout on disk: version 2
//! superblock, root group object header (compact links), dataset object
//! header, then the contiguous raw rows.

pub mod checksum;
mod reader;
mod writer;

use super::{Decoder, Encoder, FormatError};
use crate::domain::{Bar, Dataset};
use std::fs;
use std::path::Path;

pub(crate) const LABEL: &str = "HDF5";

/// Name of the dataset under the root group.
pub const DATASET_NAME: &str = "data";

pub(crate) const SIGNATURE: [u8; 8] = [0x89, b'H', b'D', b'F', b'\r', b'\n', 0x1a, b'\n'];
pub(crate) const UNDEFINED_ADDRESS: u64 = u64::MAX;
pub(crate) const SUPERBLOCK_SIZE: usize = 48;

/// Bytes per stored row.
pub(crate) const ROW_SIZE: usize = 56;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum MemberKind {
    Int,
    Float,
}

/// Compound members in storage order; offsets are `index * 8`.
pub(crate) const MEMBERS: [(&str, MemberKind); 7] = [
    ("datetime", MemberKind::Int),
    ("timestamp", MemberKind::Int),
    ("open", MemberKind::Float),
    ("high", MemberKind::Float),
    ("low", MemberKind::Float),
    ("close", MemberKind::Float),
    ("volume", MemberKind::Float),
];

/// Object header message types used by the codec.
pub(crate) mod message {
    pub const DATASPACE: u8 = 0x01;
    pub const LINK_INFO: u8 = 0x02;
    pub const DATATYPE: u8 = 0x03;
    pub const FILL_VALUE: u8 = 0x05;
    pub const LINK: u8 = 0x06;
    pub const LAYOUT: u8 = 0x08;
    pub const GROUP_INFO: u8 = 0x0A;
    pub const CONTINUATION: u8 = 0x10;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Hdf5Format;

impl Encoder for Hdf5Format {
    fn encode(&self, dataset: &Dataset, path: &Path) -> Result<(), FormatError> {
        let bytes = writer::build_file(dataset.bars())?;
        fs::write(path, bytes).map_err(|e| FormatError::io(LABEL, path, e))
    }
}

impl Decoder for Hdf5Format {
    fn decode(&self, path: &Path) -> Result<Vec<Bar>, FormatError> {
        let bytes = fs::read(path).map_err(|e| FormatError::io(LABEL, path, e))?;
        reader::parse_file(&bytes)
    }
}
