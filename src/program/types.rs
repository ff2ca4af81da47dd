//! Type definitions for the zo margin program.
//!
//! Enums and instruction parameter structs used when building transactions.

use serde::{Deserialize, Serialize};
use solana_pubkey::Pubkey;

use crate::program::error::SdkError;

// ============================================================================
// Enums
// ============================================================================

/// Order type variants understood by `place_perp_order`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[repr(u8)]
pub enum OrderType {
    /// Resting limit order
    Limit = 0,
    /// Match what crosses, cancel the rest
    ImmediateOrCancel = 1,
    /// Rejected if it would cross
    PostOnly = 2,
    /// Immediate-or-cancel that may only shrink the position
    ReduceOnlyIoc = 3,
    /// Limit order that may only shrink the position
    ReduceOnlyLimit = 4,
    /// Fill completely or not at all
    FillOrKill = 5,
}

impl OrderType {
    /// Whether the order is flagged reduce-only.
    pub fn is_reduce_only(&self) -> bool {
        matches!(self, OrderType::ReduceOnlyIoc | OrderType::ReduceOnlyLimit)
    }

    /// Whether unmatched size is cancelled instead of resting.
    pub fn is_ioc(&self) -> bool {
        matches!(
            self,
            OrderType::ImmediateOrCancel | OrderType::ReduceOnlyIoc | OrderType::FillOrKill
        )
    }

    /// Whether the order must not take liquidity.
    pub fn is_post_only(&self) -> bool {
        matches!(self, OrderType::PostOnly)
    }
}

impl TryFrom<u8> for OrderType {
    type Error = SdkError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(OrderType::Limit),
            1 => Ok(OrderType::ImmediateOrCancel),
            2 => Ok(OrderType::PostOnly),
            3 => Ok(OrderType::ReduceOnlyIoc),
            4 => Ok(OrderType::ReduceOnlyLimit),
            5 => Ok(OrderType::FillOrKill),
            _ => Err(SdkError::InvalidOrderType(value)),
        }
    }
}

/// Order side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum Side {
    /// Bid/Buy - goes long
    Buy = 0,
    /// Ask/Sell - goes short
    Sell = 1,
}

impl Side {
    /// True for the long (bid) side.
    pub fn is_long(&self) -> bool {
        matches!(self, Side::Buy)
    }

    /// Side from the program's `is_long` flag.
    pub fn from_is_long(is_long: bool) -> Self {
        if is_long {
            Side::Buy
        } else {
            Side::Sell
        }
    }

    /// Lowercase name used in REST payloads.
    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Buy => "buy",
            Side::Sell => "sell",
        }
    }
}

impl TryFrom<u8> for Side {
    type Error = SdkError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Side::Buy),
            1 => Ok(Side::Sell),
            _ => Err(SdkError::InvalidSide(value)),
        }
    }
}

// ============================================================================
// Parameter Structs
// ============================================================================

/// Accounts shared by every margin instruction
#[derive(Debug, Clone, Copy)]
pub struct MarginAccounts {
    /// Wallet that owns the margin account (signer)
    pub authority: Pubkey,
    /// zo global state
    pub state: Pubkey,
    /// State signer PDA
    pub state_signer: Pubkey,
    /// zo cache account
    pub cache: Pubkey,
    /// Margin PDA of the authority
    pub margin: Pubkey,
    /// Control account referenced by the margin account
    pub control: Pubkey,
}

/// Parameters for a collateral deposit
#[derive(Debug, Clone)]
pub struct DepositParams {
    /// Authority's token account for the collateral mint
    pub token_account: Pubkey,
    /// Program vault for the collateral mint
    pub vault: Pubkey,
    /// Only repay an existing borrow, never add collateral
    pub repay_only: bool,
    /// Amount in native units
    pub amount: u64,
}

/// Parameters for a collateral withdrawal
#[derive(Debug, Clone)]
pub struct WithdrawParams {
    /// Authority's token account for the collateral mint
    pub token_account: Pubkey,
    /// Program vault for the collateral mint
    pub vault: Pubkey,
    /// Allow the withdrawal to open a borrow
    pub allow_borrow: bool,
    /// Amount in native units
    pub amount: u64,
}

/// Dex accounts of one perp market
#[derive(Debug, Clone, Copy)]
pub struct DexMarketAccounts {
    /// Dex market account
    pub market: Pubkey,
    /// Bids book side
    pub bids: Pubkey,
    /// Asks book side
    pub asks: Pubkey,
    /// Dex program id
    pub dex_program: Pubkey,
}

/// Parameters for placing a perp order
#[derive(Debug, Clone)]
pub struct PlacePerpOrderParams {
    /// Buy (long) or sell (short)
    pub is_long: bool,
    /// Limit price in price ticks
    pub limit_price: u64,
    /// Maximum base quantity in native units
    pub max_base_quantity: u64,
    /// Maximum quote quantity in native units
    pub max_quote_quantity: u64,
    /// Order type variant
    pub order_type: OrderType,
    /// Maximum resting orders matched
    pub limit: u16,
    /// Caller-assigned client id (0 = none)
    pub client_id: u64,
}

/// Which order a cancel targets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelTarget {
    /// Ledger-assigned order id plus its side
    OrderId { order_id: u128, is_long: bool },
    /// Caller-assigned client id
    ClientId(u64),
}
