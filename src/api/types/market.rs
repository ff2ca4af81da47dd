//! Market-data payloads: markets, order books, trades, candles, funding rates.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::program::types::Side;

/// Entry of GET /markets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketInfo {
    pub name: String,
    pub base_currency: Option<String>,
    pub quote_currency: Option<String>,
    /// Always "future"
    #[serde(rename = "type")]
    pub market_type: String,
    pub underlying: String,
    pub enabled: bool,
    #[serde(with = "rust_decimal::serde::float_option")]
    pub ask: Option<Decimal>,
    #[serde(with = "rust_decimal::serde::float_option")]
    pub bid: Option<Decimal>,
    /// Mark price
    #[serde(with = "rust_decimal::serde::float")]
    pub last: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub mark: Decimal,
    #[serde(with = "rust_decimal::serde::float_option")]
    pub index: Option<Decimal>,
    pub post_only: bool,
    #[serde(with = "rust_decimal::serde::float")]
    pub price_increment: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub size_increment: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub min_provide_size: Decimal,
    pub restricted: bool,
}

/// `[price, size]` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookEntry(
    #[serde(with = "rust_decimal::serde::float")] pub Decimal,
    #[serde(with = "rust_decimal::serde::float")] pub Decimal,
);

/// Response for GET /markets/{name}/orderbook.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderbookInfo {
    pub asks: Vec<BookEntry>,
    pub bids: Vec<BookEntry>,
}

/// Public trade.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Trade {
    pub id: u64,
    pub liquidation: bool,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    pub side: Side,
    #[serde(with = "rust_decimal::serde::float")]
    pub size: Decimal,
    pub time: DateTime<Utc>,
}

/// OHLCV candle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candle {
    #[serde(with = "rust_decimal::serde::float")]
    pub close: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub high: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub low: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub open: Decimal,
    pub start_time: DateTime<Utc>,
    #[serde(with = "rust_decimal::serde::float")]
    pub volume: Decimal,
}

/// Entry of GET /funding_rates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FundingRate {
    pub future: String,
    /// Hourly rate
    #[serde(with = "rust_decimal::serde::float")]
    pub rate: Decimal,
    pub time: DateTime<Utc>,
}
