//! Deterministic synthetic bars for offline runs and tests.
//!
//! Produces a bucket-aligned random walk over the request window, seeded from
//! the symbol so repeated runs write byte-identical files. It honours the same
//! single-page `limit` as the exchange provider.

use super::provider::{DataError, DataProvider, FetchRequest};
use crate::domain::{Bar, Dataset};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Offline bar source.
#[derive(Debug, Clone)]
pub struct SyntheticProvider {
    start_price: f64,
}

impl SyntheticProvider {
    pub fn new() -> Self {
        Self {
            start_price: 2_000.0,
        }
    }

    /// Generate bars for a request without going through the trait.
    pub fn generate(&self, request: &FetchRequest) -> Vec<Bar> {
        if request.is_empty_window() || request.limit == 0 {
            return Vec::new();
        }

        let step = request.timeframe.duration_ms();
        // First bucket boundary at or after the window start.
        let first = request.start_ms.div_euclid(step) * step
            + if request.start_ms.rem_euclid(step) == 0 { 0 } else { step };
        if first >= request.end_ms {
            return Vec::new();
        }
        let available = ((request.end_ms - 1 - first) / step + 1) as u64;
        let count = available.min(u64::from(request.limit)) as usize;

        let seed: [u8; 32] = *blake3::hash(request.symbol.as_bytes()).as_bytes();
        let mut rng = StdRng::from_seed(seed);

        let mut bars = Vec::with_capacity(count);
        let mut price = self.start_price;
        for i in 0..count {
            let ret: f64 = rng.gen_range(-0.001..0.001);
            let open = price;
            let close = open * (1.0 + ret);
            let high = open.max(close) * (1.0 + rng.gen_range(0.0..0.0005));
            let low = open.min(close) * (1.0 - rng.gen_range(0.0..0.0005));
            let volume: f64 = rng.gen_range(1.0..500.0);

            bars.push(Bar {
                timestamp: first + i as i64 * step,
                open: round_to(open, 2),
                high: round_to(high, 2),
                low: round_to(low, 2),
                close: round_to(close, 2),
                volume: round_to(volume, 4),
            });
            price = close;
        }
        bars
    }
}

impl Default for SyntheticProvider {
    fn default() -> Self {
        Self::new()
    }
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let scale = 10f64.powi(decimals);
    (value * scale).round() / scale
}

impl DataProvider for SyntheticProvider {
    fn name(&self) -> &str {
        "synthetic"
    }

    fn fetch(&self, request: &FetchRequest) -> Result<Dataset, DataError> {
        let bars = self.generate(request);
        tracing::info!(symbol = %request.symbol, bars = bars.len(), "generated synthetic bars");
        Ok(Dataset::new(&request.symbol, request.timeframe, bars))
    }
}
