//! Bar fetching: exchange and synthetic providers behind one trait.

pub mod binance;
pub mod provider;
pub mod rate_limit;
pub mod synthetic;

pub use binance::{parse_klines, BinanceProvider, BINANCE_MAX_LIMIT, BINANCE_SPOT_BASE};
pub use provider::{exchange_symbol, DataError, DataProvider, FetchRequest};
pub use rate_limit::RateLimiter;
pub use synthetic::SyntheticProvider;
