//! Bar: one OHLCV record.

use serde::{Deserialize, Serialize};

/// OHLCV bar for a single symbol over one timeframe bucket.
///
/// `timestamp` is the bucket open time in epoch milliseconds (UTC).
/// Bars are plain values: once fetched they are never mutated.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub timestamp: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Bar {
    pub fn new(timestamp: i64, open: f64, high: f64, low: f64, close: f64, volume: f64) -> Self {
        Self {
            timestamp,
            open,
            high,
            low,
            close,
            volume,
        }
    }

    /// True when every price and the volume is a finite number.
    pub fn is_finite(&self) -> bool {
        self.open.is_finite()
            && self.high.is_finite()
            && self.low.is_finite()
            && self.close.is_finite()
            && self.volume.is_finite()
    }

    /// Bit-exact equality, treating two NaNs with the same payload as equal.
    pub fn bitwise_eq(&self, other: &Bar) -> bool {
        self.timestamp == other.timestamp
            && self.open.to_bits() == other.open.to_bits()
            && self.high.to_bits() == other.high.to_bits()
            && self.low.to_bits() == other.low.to_bits()
            && self.close.to_bits() == other.close.to_bits()
            && self.volume.to_bits() == other.volume.to_bits()
    }
}
