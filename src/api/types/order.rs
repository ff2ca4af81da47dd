//! Order payloads.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::orders::OrderKind;
use crate::program::types::Side;

/// Body of POST /orders.
///
/// Everything is optional at the serde level so that missing fields reach
/// validation and come back as a 400 with the field name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceOrderRequest {
    pub market: Option<String>,
    pub side: Option<Side>,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub price: Option<Decimal>,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub trigger_price: Option<Decimal>,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub size: Option<Decimal>,
    #[serde(rename = "type", default)]
    pub kind: Option<OrderKind>,
    #[serde(default)]
    pub reduce_only: bool,
    #[serde(default)]
    pub ioc: bool,
    #[serde(default)]
    pub post_only: bool,
    #[serde(default)]
    pub client_id: Option<u64>,
}

/// Body of POST /orders/{id}/modify.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModifyOrderRequest {
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub price: Option<Decimal>,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub size: Option<Decimal>,
    #[serde(default)]
    pub client_id: Option<u64>,
}

/// Query of GET/DELETE /orders.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketFilter {
    pub market: Option<String>,
}

/// Order as returned by the order endpoints.
///
/// `id` is the ledger-assigned order id as a decimal string; it is `null`
/// on placement since the program does not report it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderInfo {
    pub id: Option<String>,
    pub client_id: Option<u64>,
    pub market: String,
    pub future: String,
    pub side: Side,
    #[serde(rename = "type")]
    pub kind: OrderKind,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub size: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub filled_size: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub remaining_size: Decimal,
    #[serde(with = "rust_decimal::serde::float_option")]
    pub avg_fill_price: Option<Decimal>,
    /// "open" or "closed"
    pub status: String,
    pub reduce_only: bool,
    pub ioc: bool,
    pub post_only: bool,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub txid: Option<String>,
}

/// Confirmed cancel inside a cancel-all breakdown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelledInfo {
    pub id: Option<String>,
    pub client_id: Option<u64>,
    pub market: String,
    pub txid: String,
}

/// Failed cancel inside a cancel-all breakdown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelFailureInfo {
    pub id: Option<String>,
    pub client_id: Option<u64>,
    pub market: String,
    pub error: String,
    pub retryable: bool,
}

/// Response of DELETE /orders.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelAllInfo {
    pub succeeded: Vec<CancelledInfo>,
    pub failed: Vec<CancelFailureInfo>,
}
