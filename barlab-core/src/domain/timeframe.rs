//! Timeframe: bucket granularity of a bar series.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

const MINUTE_MS: i64 = 60_000;

/// Kline interval as spelled by the exchange API (`1m`, `4h`, `1d`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Timeframe {
    #[serde(rename = "1m")]
    OneMinute,
    #[serde(rename = "3m")]
    ThreeMinutes,
    #[serde(rename = "5m")]
    FiveMinutes,
    #[serde(rename = "15m")]
    FifteenMinutes,
    #[serde(rename = "30m")]
    ThirtyMinutes,
    #[serde(rename = "1h")]
    OneHour,
    #[serde(rename = "2h")]
    TwoHours,
    #[serde(rename = "4h")]
    FourHours,
    #[serde(rename = "6h")]
    SixHours,
    #[serde(rename = "8h")]
    EightHours,
    #[serde(rename = "12h")]
    TwelveHours,
    #[serde(rename = "1d")]
    OneDay,
    #[serde(rename = "3d")]
    ThreeDays,
    #[serde(rename = "1w")]
    OneWeek,
    #[serde(rename = "1M")]
    OneMonth,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unsupported timeframe '{0}'")]
pub struct ParseTimeframeError(pub String);

impl Timeframe {
    pub const ALL: [Timeframe; 15] = [
        Timeframe::OneMinute,
        Timeframe::ThreeMinutes,
        Timeframe::FiveMinutes,
        Timeframe::FifteenMinutes,
        Timeframe::ThirtyMinutes,
        Timeframe::OneHour,
        Timeframe::TwoHours,
        Timeframe::FourHours,
        Timeframe::SixHours,
        Timeframe::EightHours,
        Timeframe::TwelveHours,
        Timeframe::OneDay,
        Timeframe::ThreeDays,
        Timeframe::OneWeek,
        Timeframe::OneMonth,
    ];

    /// Wire spelling, also used in output file names.
    pub fn as_str(self) -> &'static str {
        match self {
            Timeframe::OneMinute => "1m",
            Timeframe::ThreeMinutes => "3m",
            Timeframe::FiveMinutes => "5m",
            Timeframe::FifteenMinutes => "15m",
            Timeframe::ThirtyMinutes => "30m",
            Timeframe::OneHour => "1h",
            Timeframe::TwoHours => "2h",
            Timeframe::FourHours => "4h",
            Timeframe::SixHours => "6h",
            Timeframe::EightHours => "8h",
            Timeframe::TwelveHours => "12h",
            Timeframe::OneDay => "1d",
            Timeframe::ThreeDays => "3d",
            Timeframe::OneWeek => "1w",
            Timeframe::OneMonth => "1M",
        }
    }

    /// Nominal bucket length in milliseconds. A month counts as 30 days.
    pub fn duration_ms(self) -> i64 {
        let minutes = match self {
            Timeframe::OneMinute => 1,
            Timeframe::ThreeMinutes => 3,
            Timeframe::FiveMinutes => 5,
            Timeframe::FifteenMinutes => 15,
            Timeframe::ThirtyMinutes => 30,
            Timeframe::OneHour => 60,
            Timeframe::TwoHours => 120,
            Timeframe::FourHours => 240,
            Timeframe::SixHours => 360,
            Timeframe::EightHours => 480,
            Timeframe::TwelveHours => 720,
            Timeframe::OneDay => 1_440,
            Timeframe::ThreeDays => 4_320,
            Timeframe::OneWeek => 10_080,
            Timeframe::OneMonth => 43_200,
        };
        minutes * MINUTE_MS
    }

    /// Number of whole buckets in `[start_ms, end_ms)`.
    pub fn buckets_between(self, start_ms: i64, end_ms: i64) -> u64 {
        if end_ms <= start_ms {
            return 0;
        }
        ((end_ms - start_ms) / self.duration_ms()) as u64
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Timeframe {
    type Err = ParseTimeframeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Timeframe::ALL
            .into_iter()
            .find(|tf| tf.as_str() == trimmed)
            .ok_or_else(|| ParseTimeframeError(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_wire_spelling() {
        assert_eq!("1m".parse::<Timeframe>().unwrap(), Timeframe::OneMinute);
        assert_eq!(" 4h ".parse::<Timeframe>().unwrap(), Timeframe::FourHours);
        assert_eq!("1M".parse::<Timeframe>().unwrap(), Timeframe::OneMonth);
    }

    #[test]
    fn minute_and_month_are_distinct() {
        assert_ne!("1m".parse::<Timeframe>(), "1M".parse::<Timeframe>());
    }

    #[test]
    fn rejects_unknown() {
        assert_eq!(
            "7m".parse::<Timeframe>(),
            Err(ParseTimeframeError("7m".into()))
        );
    }

    #[test]
    fn display_round_trips_through_from_str() {
        for tf in Timeframe::ALL {
            assert_eq!(tf.to_string().parse::<Timeframe>().unwrap(), tf);
        }
    }

    #[test]
    fn durations() {
        assert_eq!(Timeframe::OneMinute.duration_ms(), 60_000);
        assert_eq!(Timeframe::OneHour.duration_ms(), 3_600_000);
        assert_eq!(Timeframe::OneDay.duration_ms(), 86_400_000);
    }

    #[test]
    fn bucket_count() {
        let tf = Timeframe::OneMinute;
        assert_eq!(tf.buckets_between(0, 0), 0);
        assert_eq!(tf.buckets_between(10, 0), 0);
        assert_eq!(tf.buckets_between(0, 60_000 * 1_000), 1_000);
    }

    #[test]
    fn serde_uses_wire_spelling() {
        #[derive(Serialize, Deserialize)]
        struct Wrapper {
            tf: Timeframe,
        }
        let json = serde_json::to_string(&Wrapper {
            tf: Timeframe::FifteenMinutes,
        })
        .unwrap();
        assert_eq!(json, r#"{"tf":"15m"}"#);
        let back: Wrapper = serde_json::from_str(&json).unwrap();
        assert_eq!(back.tf, Timeframe::FifteenMinutes);
    }
}
