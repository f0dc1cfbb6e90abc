//! Data provider trait, fetch request, and structured error types.
//!
//! The DataProvider trait abstracts over bar sources (the Binance klines endpoint,
//! the deterministic synthetic generator) so the runner can swap them and tests
//! never need the network.

use crate::domain::{Dataset, Timeframe};
use thiserror::Error;

/// Structured error types for fetch operations.
///
/// None of these are retried: the first failure aborts the run.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("network unreachable: {0}")]
    Network(String),

    #[error("rate limited by exchange (retry after {retry_after_secs}s)")]
    RateLimited { retry_after_secs: u64 },

    #[error("HTTP {status} from exchange: {body}")]
    Http { status: u16, body: String },

    #[error("response format changed: {0}")]
    ResponseFormat(String),

    #[error("symbol not found: {symbol}")]
    SymbolNotFound { symbol: String },

    #[error("invalid fetch request: {0}")]
    InvalidRequest(String),
}

/// One bounded request: a symbol, a bucket size, a window, and a page limit.
///
/// The window is half-open, `[start_ms, end_ms)`, in epoch milliseconds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub symbol: String,
    pub timeframe: Timeframe,
    pub start_ms: i64,
    pub end_ms: i64,
    pub limit: u32,
}

impl FetchRequest {
    pub fn new(
        symbol: impl Into<String>,
        timeframe: Timeframe,
        start_ms: i64,
        end_ms: i64,
        limit: u32,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            timeframe,
            start_ms,
            end_ms,
            limit,
        }
    }

    /// A window with no width yields no bars and needs no request.
    pub fn is_empty_window(&self) -> bool {
        self.start_ms >= self.end_ms
    }

    /// True when the window holds more buckets than a single page returns.
    pub fn exceeds_limit(&self) -> bool {
        self.timeframe.buckets_between(self.start_ms, self.end_ms) > u64::from(self.limit)
    }

    /// Exchange spelling of the symbol: `ETH/USDT` becomes `ETHUSDT`.
    pub fn exchange_symbol(&self) -> String {
        exchange_symbol(&self.symbol)
    }
}

/// Strip pair separators and upper-case a symbol for the exchange API.
pub fn exchange_symbol(symbol: &str) -> String {
    symbol
        .chars()
        .filter(|c| !matches!(c, '/' | '-' | '_' | ' '))
        .map(|c| c.to_ascii_uppercase())
        .collect()
}

/// Trait for bar sources.
pub trait DataProvider: Send + Sync {
    /// Human-readable name of this provider.
    fn name(&self) -> &str;

    /// Fetch at most `request.limit` bars inside the request window.
    fn fetch(&self, request: &FetchRequest) -> Result<Dataset, DataError>;
}
