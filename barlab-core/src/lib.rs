//! barlab core: bar data, the exchange fetcher, and the five file-format codecs.
//!
//! This crate contains everything the benchmark touches below the runner:
//! - Domain types (bars, datasets, timeframes)
//! - Data providers (Binance klines over HTTP, deterministic synthetic bars)
//! - Minimum-interval rate limiter shared by network providers
//! - Encoders and decoders for CSV, Parquet, JSON, HDF5 and Feather

pub mod data;
pub mod domain;
pub mod formats;

pub use data::{BinanceProvider, DataError, DataProvider, FetchRequest, SyntheticProvider};
pub use domain::{Bar, Dataset, Timeframe};
pub use formats::{Decoder, Encoder, FileFormat, FormatError};

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time check: types handed across the runner and TUI crates are Send + Sync.
    #[allow(dead_code)]
    fn assert_send_sync() {
        fn require_send<T: Send>() {}
        fn require_sync<T: Sync>() {}

        require_send::<Bar>();
        require_sync::<Bar>();
        require_send::<Dataset>();
        require_sync::<Dataset>();
        require_send::<Timeframe>();
        require_sync::<Timeframe>();
        require_send::<FileFormat>();
        require_sync::<FileFormat>();
        require_send::<BinanceProvider>();
        require_sync::<BinanceProvider>();
        require_send::<SyntheticProvider>();
        require_sync::<SyntheticProvider>();
    }

    #[test]
    fn every_format_is_usable_as_a_trait_object() {
        fn _encode_through_trait(
            encoder: &dyn Encoder,
            dataset: &Dataset,
            path: &std::path::Path,
        ) -> Result<(), FormatError> {
            encoder.encode(dataset, path)
        }

        for format in FileFormat::ALL {
            let _: &dyn Encoder = format.encoder();
            let _: &dyn Decoder = format.decoder();
        }
    }
}
