//! Wallet payloads: coins, balances, deposits and withdrawals.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Entry of GET /wallet/coins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoinInfo {
    pub id: String,
    pub name: String,
    pub collateral: bool,
    #[serde(with = "rust_decimal::serde::float")]
    pub collateral_weight: Decimal,
    pub can_deposit: bool,
    pub can_withdraw: bool,
    pub can_convert: bool,
    pub spl_mint: String,
    pub decimals: u8,
    pub usd_fungible: bool,
}

/// Entry of GET /wallet/balances.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletBalance {
    pub coin: String,
    /// Withdrawable without opening a borrow
    #[serde(with = "rust_decimal::serde::float")]
    pub free: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub spot_borrow: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub total: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub usd_value: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub available_without_borrow: Decimal,
}

/// Body of POST /wallet/deposits and POST /wallet/withdrawals.
///
/// Exchange-style fields such as `address` or `password` are accepted and
/// ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransferRequest {
    pub coin: Option<String>,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub size: Option<Decimal>,
}

/// Confirmed deposit or withdrawal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferInfo {
    pub coin: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub size: Decimal,
    /// "processed" once confirmed
    pub status: String,
    pub time: DateTime<Utc>,
    pub txid: String,
}

/// Historical transfer, as returned by the market-data provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferRecord {
    pub id: u64,
    pub coin: String,
    /// "deposit" or "withdrawal"
    pub kind: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub size: Decimal,
    pub status: String,
    pub time: DateTime<Utc>,
    pub txid: String,
}
