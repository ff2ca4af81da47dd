//! Account history payloads and query parameters.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::program::types::Side;
use crate::shared::Resolution;

/// Own fill.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Fill {
    pub id: u64,
    pub market: String,
    pub future: String,
    pub order_id: Option<String>,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    pub side: Side,
    #[serde(with = "rust_decimal::serde::float")]
    pub size: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub fee: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub fee_rate: Decimal,
    /// "maker" or "taker"
    pub liquidity: String,
    pub time: DateTime<Utc>,
    pub txid: Option<String>,
}

/// Funding paid (positive) or received (negative).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FundingPayment {
    pub id: u64,
    pub future: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub payment: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub rate: Decimal,
    pub time: DateTime<Utc>,
}

/// `start_time`/`end_time` query in Unix seconds, plus optional filters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryQuery {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub market: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub future: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
}

impl HistoryQuery {
    pub fn with_market(mut self, market: impl Into<String>) -> Self {
        self.market = Some(market.into());
        self
    }

    pub fn with_time_range(mut self, start: i64, end: i64) -> Self {
        self.start_time = Some(start);
        self.end_time = Some(end);
        self
    }

    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Market filter under either of its names.
    pub fn market_filter(&self) -> Option<&str> {
        self.market.as_deref().or(self.future.as_deref())
    }
}

/// Query of GET /markets/{name}/candles.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandleQuery {
    #[serde(default)]
    pub resolution: Resolution,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<i64>,
}
