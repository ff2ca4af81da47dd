//! Constants for the zo margin program.
//!
//! Program ids, seeds, discriminators and account layout sizes matching the
//! on-chain program and its dex.

use std::str::FromStr;

use solana_pubkey::Pubkey;

// ============================================================================
// Program IDs
// ============================================================================

lazy_static::lazy_static! {
    /// zo margin program on mainnet-beta
    pub static ref ZO_PROGRAM_ID_MAINNET: Pubkey = Pubkey::from_str("Zo1ggzTUKMY5bYnDvT5mtVeZxzf2FaLTbKkmvGUhUQk").unwrap();

    /// zo margin program on devnet
    pub static ref ZO_PROGRAM_ID_DEVNET: Pubkey = Pubkey::from_str("Zo1ThtSHMh9tZGECwBDL81WJRL6s3QTHf733Tyko7KQ").unwrap();

    /// zo dex (order book) program on mainnet-beta
    pub static ref ZO_DEX_PROGRAM_ID_MAINNET: Pubkey = Pubkey::from_str("ZDx8a8jBqGmJyxi1whFxxCo5vG6Q9t4hTzW2GSixMKK").unwrap();

    /// zo dex (order book) program on devnet
    pub static ref ZO_DEX_PROGRAM_ID_DEVNET: Pubkey = Pubkey::from_str("ZDxUi178LkcuwdxcEqsSo2E7KATH99LAAXN5LcSVMBC").unwrap();

    /// Global zo state account on mainnet-beta
    pub static ref ZO_STATE_MAINNET: Pubkey = Pubkey::from_str("71yykwxq1zQqy99PgRsgZJXi2HHK2UDx9G4va7pH6qRv").unwrap();

    /// Global zo state account on devnet
    pub static ref ZO_STATE_DEVNET: Pubkey = Pubkey::from_str("KwcWW7WvgSXLJcyjKZJBHLbfriErggzYHpjS9qjVD5F").unwrap();

    /// SPL Token Program ID
    pub static ref TOKEN_PROGRAM_ID: Pubkey = Pubkey::from_str("TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA").unwrap();

    /// Associated Token Account Program ID
    pub static ref ASSOCIATED_TOKEN_PROGRAM_ID: Pubkey = Pubkey::from_str("ATokenGPvbdGVxr1b2hvZbsiqW5xWH25efTNsLJA8knL").unwrap();
}

// ============================================================================
// Instruction Discriminators (anchor: sha256("global:<name>")[..8])
// ============================================================================

/// Instruction discriminators
pub mod instruction {
    pub const DEPOSIT: [u8; 8] = [242, 35, 198, 137, 82, 225, 242, 182];
    pub const WITHDRAW: [u8; 8] = [183, 18, 70, 156, 148, 109, 161, 34];
    pub const PLACE_PERP_ORDER: [u8; 8] = [69, 161, 93, 202, 120, 126, 76, 185];
    pub const CANCEL_PERP_ORDER: [u8; 8] = [172, 79, 207, 17, 243, 214, 242, 198];
}

// ============================================================================
// Event Discriminators (anchor: sha256("event:<Name>")[..8])
// ============================================================================

/// Event discriminators
pub mod event {
    pub const DEPOSIT_LOG: [u8; 8] = [141, 186, 168, 252, 108, 141, 72, 94];
    pub const WITHDRAW_LOG: [u8; 8] = [235, 69, 115, 62, 185, 172, 126, 223];
    pub const REALIZED_PNL_LOG: [u8; 8] = [145, 209, 61, 150, 20, 221, 184, 190];
}

// ============================================================================
// Account Discriminators
// ============================================================================

/// State account discriminator
pub const STATE_DISCRIMINATOR: [u8; 8] = [216, 146, 107, 94, 104, 75, 182, 177];
/// Cache account discriminator
pub const CACHE_DISCRIMINATOR: [u8; 8] = [74, 229, 214, 188, 203, 220, 22, 153];
/// Margin account discriminator
pub const MARGIN_DISCRIMINATOR: [u8; 8] = [152, 17, 142, 195, 80, 196, 161, 48];
/// Control account discriminator
pub const CONTROL_DISCRIMINATOR: [u8; 8] = [61, 10, 66, 246, 42, 240, 127, 40];
/// Dex book side discriminator
pub const BOOKSIDE_DISCRIMINATOR: [u8; 8] = *b"bookside";

// ============================================================================
// PDA Seeds
// ============================================================================

/// Margin PDA seed suffix
pub const MARGIN_SEED: &[u8] = b"marginv1";

// ============================================================================
// Account Layout Sizes
// ============================================================================

/// State header size in bytes (entries follow)
pub const STATE_HEADER_SIZE: usize = 80;
/// Collateral entry size in the State account
pub const COLLATERAL_INFO_SIZE: usize = 88;
/// Perp market entry size in the State account
pub const PERP_MARKET_INFO_SIZE: usize = 128;

/// Cache header size in bytes
pub const CACHE_HEADER_SIZE: usize = 16;
/// Oracle entry size in the Cache account
pub const ORACLE_ENTRY_SIZE: usize = 32;
/// Mark entry size in the Cache account
pub const MARK_ENTRY_SIZE: usize = 40;

/// Margin header size in bytes
pub const MARGIN_HEADER_SIZE: usize = 88;

/// Control header size in bytes
pub const CONTROL_HEADER_SIZE: usize = 48;
/// Per-market open orders entry size in the Control account
pub const OPEN_ORDERS_INFO_SIZE: usize = 48;

/// Book side header size in bytes
pub const BOOKSIDE_HEADER_SIZE: usize = 16;
/// Book side leaf size in bytes
pub const LEAF_SIZE: usize = 64;

/// Fixed-width symbol field length
pub const SYMBOL_LEN: usize = 16;

// ============================================================================
// Numeric conventions
// ============================================================================

/// Decimals of the USD quote currency (all pnl and cost fields).
pub const QUOTE_DECIMALS: u32 = 6;
/// Decimals of oracle, mark and funding values in the Cache account.
pub const CACHE_PRICE_DECIMALS: u32 = 9;
/// Collateral weights and margin fractions are stored per mille.
pub const PER_MILLE_DECIMALS: u32 = 3;

/// Maximum orders matched by a single placement
pub const DEFAULT_MATCH_LIMIT: u16 = 10;
