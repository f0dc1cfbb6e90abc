//! Dataset: the ordered bar series shared by every encoder in a run.

use super::bar::Bar;
use super::timeframe::Timeframe;

/// Chronologically ascending bars for one symbol and timeframe.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    symbol: String,
    timeframe: Timeframe,
    bars: Vec<Bar>,
}

impl Dataset {
    /// Build a dataset, sorting bars by timestamp (stable) if needed.
    ///
    /// Repeated timestamps keep the first bar supplied for them.
    pub fn new(symbol: impl Into<String>, timeframe: Timeframe, mut bars: Vec<Bar>) -> Self {
        if !bars.windows(2).all(|w| w[0].timestamp < w[1].timestamp) {
            bars.sort_by_key(|b| b.timestamp);
            bars.dedup_by_key(|b| b.timestamp);
        }
        Self {
            symbol: symbol.into(),
            timeframe,
            bars,
        }
    }

    pub fn empty(symbol: impl Into<String>, timeframe: Timeframe) -> Self {
        Self::new(symbol, timeframe, Vec::new())
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn timeframe(&self) -> Timeframe {
        self.timeframe
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    /// Timestamp range `(first, last)` of the series, if any.
    pub fn span(&self) -> Option<(i64, i64)> {
        match (self.bars.first(), self.bars.last()) {
            (Some(first), Some(last)) => Some((first.timestamp, last.timestamp)),
            _ => None,
        }
    }

    /// BLAKE3 digest over the row content. See [`fingerprint`].
    pub fn fingerprint(&self) -> String {
        fingerprint(&self.bars)
    }
}

/// Deterministic BLAKE3 hash over timestamps and the raw bit patterns of every value.
///
/// Two bar slices hash equal exactly when they hold the same rows in the same order,
/// which is how decoded files are checked against the dataset they were written from.
pub fn fingerprint(bars: &[Bar]) -> String {
    let mut hasher = blake3::Hasher::new();
    hasher.update(&(bars.len() as u64).to_le_bytes());
    for bar in bars {
        hasher.update(&bar.timestamp.to_le_bytes());
        hasher.update(&bar.open.to_bits().to_le_bytes());
        hasher.update(&bar.high.to_bits().to_le_bytes());
        hasher.update(&bar.low.to_bits().to_le_bytes());
        hasher.update(&bar.close.to_bits().to_le_bytes());
        hasher.update(&bar.volume.to_bits().to_le_bytes());
    }
    hasher.finalize().to_hex().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bar(ts: i64, close: f64) -> Bar {
        Bar::new(ts, close, close + 1.0, close - 1.0, close, 10.0)
    }

    #[test]
    fn new_sorts_out_of_order_bars() {
        let ds = Dataset::new(
            "ETH/USDT",
            Timeframe::OneMinute,
            vec![bar(120_000, 3.0), bar(0, 1.0), bar(60_000, 2.0)],
        );
        let ts: Vec<i64> = ds.bars().iter().map(|b| b.timestamp).collect();
        assert_eq!(ts, vec![0, 60_000, 120_000]);
        assert_eq!(ds.span(), Some((0, 120_000)));
    }

    #[test]
    fn new_drops_repeated_timestamps() {
        let ds = Dataset::new(
            "ETH/USDT",
            Timeframe::OneMinute,
            vec![bar(60_000, 2.0), bar(0, 1.0), bar(60_000, 9.0), bar(0, 8.0)],
        );
        let closes: Vec<f64> = ds.bars().iter().map(|b| b.close).collect();
        assert_eq!(closes, vec![1.0, 2.0]);
    }

    #[test]
    fn empty_dataset() {
        let ds = Dataset::empty("ETH/USDT", Timeframe::OneMinute);
        assert!(ds.is_empty());
        assert_eq!(ds.len(), 0);
        assert_eq!(ds.span(), None);
        assert_eq!(ds.symbol(), "ETH/USDT");
        assert_eq!(ds.timeframe(), Timeframe::OneMinute);
    }

    #[test]
    fn fingerprint_is_deterministic() {
        let bars = vec![bar(0, 1.0), bar(60_000, 2.0)];
        assert_eq!(fingerprint(&bars), fingerprint(&bars.clone()));
    }

    #[test]
    fn fingerprint_changes_with_any_value() {
        let bars = vec![bar(0, 1.0), bar(60_000, 2.0)];
        let mut tweaked = bars.clone();
        tweaked[1].volume = 10.000_000_000_000_002;
        assert_ne!(fingerprint(&bars), fingerprint(&tweaked));
    }

    #[test]
    fn fingerprint_distinguishes_empty_from_missing_rows() {
        assert_ne!(fingerprint(&[]), fingerprint(&[bar(0, 1.0)]));
    }
}
