//! Shared type definitions.
//!
//! Types used by both the REST payloads and the external market-data client.

use serde::{Deserialize, Serialize};

// ============================================================================
// Resolution Enum (shared between server and market-data client)
// ============================================================================

/// Candle resolution, expressed on the wire as a window length in seconds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum Resolution {
    /// 15 second candles
    FifteenSeconds,
    /// 1 minute candles
    #[default]
    OneMinute,
    /// 5 minute candles
    FiveMinutes,
    /// 15 minute candles
    FifteenMinutes,
    /// 1 hour candles
    OneHour,
    /// 4 hour candles
    FourHours,
    /// 1 day candles
    OneDay,
}

impl Resolution {
    /// Window length in seconds.
    pub fn as_secs(&self) -> u32 {
        match self {
            Self::FifteenSeconds => 15,
            Self::OneMinute => 60,
            Self::FiveMinutes => 300,
            Self::FifteenMinutes => 900,
            Self::OneHour => 3_600,
            Self::FourHours => 14_400,
            Self::OneDay => 86_400,
        }
    }
}

impl TryFrom<u32> for Resolution {
    type Error = String;

    fn try_from(secs: u32) -> Result<Self, Self::Error> {
        match secs {
            15 => Ok(Self::FifteenSeconds),
            60 => Ok(Self::OneMinute),
            300 => Ok(Self::FiveMinutes),
            900 => Ok(Self::FifteenMinutes),
            3_600 => Ok(Self::OneHour),
            14_400 => Ok(Self::FourHours),
            86_400 => Ok(Self::OneDay),
            other => Err(format!(
                "unsupported resolution {other}, expected one of 15, 60, 300, 900, 3600, 14400, 86400"
            )),
        }
    }
}

impl From<Resolution> for u32 {
    fn from(resolution: Resolution) -> Self {
        resolution.as_secs()
    }
}

impl std::fmt::Display for Resolution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_secs())
    }
}

/// Unix-seconds time window shared by history queries
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<i64>,
}

impl TimeRange {
    /// Reject windows that end before they start.
    pub fn validate(&self) -> Result<(), String> {
        match (self.start_time, self.end_time) {
            (Some(start), Some(end)) if end < start => Err(format!(
                "end_time {end} is before start_time {start}"
            )),
            _ => Ok(()),
        }
    }
}
