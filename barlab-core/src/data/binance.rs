//! Binance spot klines provider.
//!
//! Issues one rate-limited `GET /api/v3/klines` per fetch and parses the
//! array-of-arrays payload into bars. There is no retry and no pagination: a
//! window wider than one page comes back truncated to the earliest `limit` bars.

use super::provider::{DataError, DataProvider, FetchRequest};
use super::rate_limit::RateLimiter;
use crate::domain::{Bar, Dataset};
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;

pub const BINANCE_SPOT_BASE: &str = "https://api.binance.com";

/// Largest page the klines endpoint serves.
pub const BINANCE_MAX_LIMIT: u32 = 1000;

/// Binance error code for an unknown symbol.
const INVALID_SYMBOL_CODE: i64 = -1121;

#[derive(Debug, Deserialize)]
struct ApiError {
    code: i64,
    msg: String,
}

/// Binance spot market data provider.
pub struct BinanceProvider {
    client: reqwest::blocking::Client,
    base_url: String,
    rate_limiter: RateLimiter,
}

impl BinanceProvider {
    pub fn new(rate_limiter: RateLimiter) -> Result<Self, DataError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| DataError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: BINANCE_SPOT_BASE.to_string(),
            rate_limiter,
        })
    }

    /// Point the provider at another host (testnet, local mock).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Build the klines URL. Binance treats `endTime` as inclusive, so the
    /// half-open window end is pulled back by one millisecond.
    fn klines_url(&self, request: &FetchRequest) -> String {
        format!(
            "{}/api/v3/klines?symbol={}&interval={}&startTime={}&endTime={}&limit={}",
            self.base_url,
            request.exchange_symbol(),
            request.timeframe.as_str(),
            request.start_ms,
            request.end_ms - 1,
            request.limit,
        )
    }

    fn validate(request: &FetchRequest) -> Result<(), DataError> {
        if request.limit == 0 || request.limit > BINANCE_MAX_LIMIT {
            return Err(DataError::InvalidRequest(format!(
                "limit must be in 1..={BINANCE_MAX_LIMIT}, got {}",
                request.limit
            )));
        }
        if request.exchange_symbol().is_empty() {
            return Err(DataError::InvalidRequest("empty symbol".into()));
        }
        Ok(())
    }

    fn send(&self, request: &FetchRequest) -> Result<String, DataError> {
        let url = self.klines_url(request);
        let waited = self.rate_limiter.acquire();
        tracing::debug!(%url, waited_ms = waited.as_millis() as u64, "requesting klines");

        let resp = self
            .client
            .get(&url)
            .send()
            .map_err(|e| DataError::Network(e.to_string()))?;

        let status = resp.status();
        let retry_after = resp
            .headers()
            .get("retry-after")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<u64>().ok());
        let body = resp
            .text()
            .map_err(|e| DataError::Network(format!("failed to read response body: {e}")))?;

        if status.is_success() {
            return Ok(body);
        }
        Err(classify_failure(
            status,
            retry_after,
            &body,
            &request.symbol,
        ))
    }
}

/// Map a non-success HTTP response onto the error taxonomy.
fn classify_failure(
    status: StatusCode,
    retry_after: Option<u64>,
    body: &str,
    symbol: &str,
) -> DataError {
    // 418 is Binance's escalation of ignored 429s (temporary IP ban).
    if status == StatusCode::TOO_MANY_REQUESTS || status == StatusCode::IM_A_TEAPOT {
        return DataError::RateLimited {
            retry_after_secs: retry_after.unwrap_or(60),
        };
    }

    if let Ok(api_error) = serde_json::from_str::<ApiError>(body) {
        if api_error.code == INVALID_SYMBOL_CODE {
            return DataError::SymbolNotFound {
                symbol: symbol.to_string(),
            };
        }
        return DataError::Http {
            status: status.as_u16(),
            body: format!("{} ({})", api_error.msg, api_error.code),
        };
    }

    DataError::Http {
        status: status.as_u16(),
        body: body.chars().take(200).collect(),
    }
}

/// Parse a klines payload: `[[openTime, "open", "high", "low", "close", "volume", ...], ...]`.
///
/// Fields past the volume are ignored.
pub fn parse_klines(body: &str) -> Result<Vec<Bar>, DataError> {
    let rows: Vec<Vec<Value>> = serde_json::from_str(body)
        .map_err(|e| DataError::ResponseFormat(format!("klines payload is not an array: {e}")))?;

    rows.iter()
        .enumerate()
        .map(|(i, row)| {
            if row.len() < 6 {
                return Err(DataError::ResponseFormat(format!(
                    "kline {i} has {} fields, expected at least 6",
                    row.len()
                )));
            }
            let timestamp = row[0].as_i64().ok_or_else(|| {
                DataError::ResponseFormat(format!("kline {i}: open time is not an integer"))
            })?;
            Ok(Bar {
                timestamp,
                open: decimal_field(&row[1], i, "open")?,
                high: decimal_field(&row[2], i, "high")?,
                low: decimal_field(&row[3], i, "low")?,
                close: decimal_field(&row[4], i, "close")?,
                volume: decimal_field(&row[5], i, "volume")?,
            })
        })
        .collect()
}

/// Binance sends decimals as strings; accept bare numbers too.
fn decimal_field(value: &Value, row: usize, name: &str) -> Result<f64, DataError> {
    match value {
        Value::String(s) => s.parse::<f64>().map_err(|e| {
            DataError::ResponseFormat(format!("kline {row}: bad {name} '{s}': {e}"))
        }),
        Value::Number(n) => n.as_f64().ok_or_else(|| {
            DataError::ResponseFormat(format!("kline {row}: {name} out of range"))
        }),
        other => Err(DataError::ResponseFormat(format!(
            "kline {row}: {name} has unexpected type: {other}"
        ))),
    }
}

impl DataProvider for BinanceProvider {
    fn name(&self) -> &str {
        "binance"
    }

    fn fetch(&self, request: &FetchRequest) -> Result<Dataset, DataError> {
        Self::validate(request)?;

        if request.is_empty_window() {
            tracing::debug!(symbol = %request.symbol, "zero-width window, skipping request");
            return Ok(Dataset::empty(&request.symbol, request.timeframe));
        }

        let body = self.send(request)?;
        let bars = parse_klines(&body)?;

        if bars.len() >= request.limit as usize && request.exceeds_limit() {
            tracing::warn!(
                symbol = %request.symbol,
                limit = request.limit,
                requested = request.timeframe.buckets_between(request.start_ms, request.end_ms),
                "window wider than one page; keeping the earliest bars only"
            );
        }

        tracing::info!(symbol = %request.symbol, bars = bars.len(), "fetched klines");
        Ok(Dataset::new(&request.symbol, request.timeframe, bars))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Timeframe;

    const SAMPLE: &str = r#"[
        [1704067200000,"2281.50000000","2283.90000000","2280.01000000","2283.20000000","512.44710000",1704067259999,"1169473.93",1050,"262.1","598216.7","0"],
        [1704067260000,"2283.21000000","2284.00000000","2282.10000000","2282.55000000","301.00000000",1704067319999,"687000.00",880,"150.0","342000.0","0"]
    ]"#;

    fn provider() -> BinanceProvider {
        BinanceProvider::new(RateLimiter::new(Duration::ZERO)).unwrap()
    }

    #[test]
    fn parses_kline_rows() {
        let bars = parse_klines(SAMPLE).unwrap();
        assert_eq!(bars.len(), 2);
        assert_eq!(bars[0].timestamp, 1_704_067_200_000);
        assert_eq!(bars[0].open, 2281.5);
        assert_eq!(bars[0].low, 2280.01);
        assert_eq!(bars[1].close, 2282.55);
        assert_eq!(bars[1].volume, 301.0);
    }

    #[test]
    fn parses_empty_payload() {
        assert!(parse_klines("[]").unwrap().is_empty());
    }

    #[test]
    fn rejects_short_rows() {
        let err = parse_klines(r#"[[1704067200000,"1.0","2.0"]]"#).unwrap_err();
        assert!(matches!(err, DataError::ResponseFormat(_)));
    }

    #[test]
    fn rejects_non_numeric_price() {
        let err =
            parse_klines(r#"[[1704067200000,"abc","2.0","0.5","1.5","10",0]]"#).unwrap_err();
        assert!(err.to_string().contains("bad open"));
    }

    #[test]
    fn rejects_object_payload() {
        let err = parse_klines(r#"{"code":-1121,"msg":"Invalid symbol."}"#).unwrap_err();
        assert!(matches!(err, DataError::ResponseFormat(_)));
    }

    #[test]
    fn url_uses_exchange_symbol_and_inclusive_end() {
        let req = FetchRequest::new("ETH/USDT", Timeframe::OneMinute, 1_000, 61_000, 1000);
        let url = provider().with_base_url("http://localhost:9/").klines_url(&req);
        assert_eq!(
            url,
            "http://localhost:9/api/v3/klines?symbol=ETHUSDT&interval=1m&startTime=1000&endTime=60999&limit=1000"
        );
    }

    #[test]
    fn rate_limit_statuses() {
        let err = classify_failure(StatusCode::TOO_MANY_REQUESTS, Some(7), "", "ETH/USDT");
        assert!(matches!(err, DataError::RateLimited { retry_after_secs: 7 }));
        let err = classify_failure(StatusCode::IM_A_TEAPOT, None, "", "ETH/USDT");
        assert!(matches!(err, DataError::RateLimited { retry_after_secs: 60 }));
    }

    #[test]
    fn invalid_symbol_maps_to_not_found() {
        let err = classify_failure(
            StatusCode::BAD_REQUEST,
            None,
            r#"{"code":-1121,"msg":"Invalid symbol."}"#,
            "FOO/BAR",
        );
        assert!(matches!(err, DataError::SymbolNotFound { symbol } if symbol == "FOO/BAR"));
    }

    #[test]
    fn other_statuses_keep_body() {
        let err = classify_failure(StatusCode::BAD_GATEWAY, None, "upstream down", "ETH/USDT");
        match err {
            DataError::Http { status, body } => {
                assert_eq!(status, 502);
                assert_eq!(body, "upstream down");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn zero_width_window_needs_no_network() {
        // Unroutable base URL: any request would fail.
        let provider = provider().with_base_url("http://127.0.0.1:9");
        let req = FetchRequest::new("ETH/USDT", Timeframe::OneMinute, 5_000, 5_000, 1000);
        let ds = provider.fetch(&req).unwrap();
        assert!(ds.is_empty());
    }

    #[test]
    fn limit_above_page_size_is_rejected() {
        let req = FetchRequest::new("ETH/USDT", Timeframe::OneMinute, 0, 60_000, 1001);
        let err = provider().fetch(&req).unwrap_err();
        assert!(matches!(err, DataError::InvalidRequest(_)));
    }
}
