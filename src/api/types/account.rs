//! Account and position payloads.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::program::types::Side;

/// Position row, shared by GET /account and GET /positions.
///
/// Ratios that are unbounded (no notional) serialize as `null`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionInfo {
    pub future: String,
    /// Signed quote cost of the open size
    #[serde(with = "rust_decimal::serde::float")]
    pub cost: Decimal,
    #[serde(with = "rust_decimal::serde::float_option")]
    pub entry_price: Option<Decimal>,
    #[serde(with = "rust_decimal::serde::float")]
    pub initial_margin_requirement: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub maintenance_margin_requirement: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub long_order_size: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub short_order_size: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub net_size: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub open_size: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub realized_pnl: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub unrealized_pnl: Decimal,
    pub side: Side,
    #[serde(with = "rust_decimal::serde::float")]
    pub size: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub collateral_used: Decimal,
}

/// Response for GET /account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountInfo {
    /// Wallet address
    pub username: String,
    /// Margin account address
    pub margin_account: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub collateral: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub free_collateral: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_account_value: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_position_size: Decimal,
    #[serde(with = "rust_decimal::serde::float_option")]
    pub margin_fraction: Option<Decimal>,
    #[serde(with = "rust_decimal::serde::float_option")]
    pub open_margin_fraction: Option<Decimal>,
    #[serde(with = "rust_decimal::serde::float_option")]
    pub initial_margin_requirement: Option<Decimal>,
    #[serde(with = "rust_decimal::serde::float_option")]
    pub maintenance_margin_requirement: Option<Decimal>,
    #[serde(with = "rust_decimal::serde::float_option")]
    pub leverage: Option<Decimal>,
    pub liquidating: bool,
    pub positions: Vec<PositionInfo>,
}
