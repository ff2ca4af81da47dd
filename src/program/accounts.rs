//! Account structures and deserialization for the zo margin program.
//!
//! This module contains the on-chain account structures with their exact
//! byte layouts. Every account starts with an 8-byte discriminator and the
//! variable-length tables are sized by counts stored in the header.

use solana_pubkey::Pubkey;

use crate::program::constants::{
    BOOKSIDE_DISCRIMINATOR, BOOKSIDE_HEADER_SIZE, CACHE_DISCRIMINATOR, CACHE_HEADER_SIZE,
    COLLATERAL_INFO_SIZE, CONTROL_DISCRIMINATOR, CONTROL_HEADER_SIZE, LEAF_SIZE,
    MARGIN_DISCRIMINATOR, MARGIN_HEADER_SIZE, MARK_ENTRY_SIZE, OPEN_ORDERS_INFO_SIZE,
    ORACLE_ENTRY_SIZE, PERP_MARKET_INFO_SIZE, STATE_DISCRIMINATOR, STATE_HEADER_SIZE, SYMBOL_LEN,
};
use crate::program::error::{SdkError, SdkResult};
use crate::program::types::Side;

/// Helper to extract a fixed-size array from a slice
#[inline]
fn read_bytes<const N: usize>(data: &[u8], offset: usize) -> [u8; N] {
    let mut arr = [0u8; N];
    arr.copy_from_slice(&data[offset..offset + N]);
    arr
}

/// Helper to read a Pubkey from data
#[inline]
fn read_pubkey(data: &[u8], offset: usize) -> Pubkey {
    Pubkey::new_from_array(read_bytes::<32>(data, offset))
}

#[inline]
fn read_u16(data: &[u8], offset: usize) -> u16 {
    u16::from_le_bytes(read_bytes::<2>(data, offset))
}

#[inline]
fn read_u32(data: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes(read_bytes::<4>(data, offset))
}

/// Helper to read a u64 from data (little-endian)
#[inline]
fn read_u64(data: &[u8], offset: usize) -> u64 {
    u64::from_le_bytes(read_bytes::<8>(data, offset))
}

#[inline]
fn read_i64(data: &[u8], offset: usize) -> i64 {
    i64::from_le_bytes(read_bytes::<8>(data, offset))
}

#[inline]
fn read_u128(data: &[u8], offset: usize) -> u128 {
    u128::from_le_bytes(read_bytes::<16>(data, offset))
}

/// Read a null-padded ascii symbol
fn read_symbol(data: &[u8], offset: usize) -> String {
    let raw = &data[offset..offset + SYMBOL_LEN];
    let end = raw.iter().position(|b| *b == 0).unwrap_or(SYMBOL_LEN);
    String::from_utf8_lossy(&raw[..end]).into_owned()
}

fn check_len(data: &[u8], expected: usize) -> SdkResult<()> {
    if data.len() < expected {
        return Err(SdkError::InvalidDataLength {
            expected,
            actual: data.len(),
        });
    }
    Ok(())
}

fn check_discriminator(data: &[u8], expected: [u8; 8]) -> SdkResult<()> {
    let discriminator = read_bytes::<8>(data, 0);
    if discriminator != expected {
        return Err(SdkError::InvalidDiscriminator {
            expected: hex::encode(expected),
            actual: hex::encode(discriminator),
        });
    }
    Ok(())
}

// ============================================================================
// State Account
// ============================================================================

/// Collateral entry in the State account (88 bytes)
///
/// Layout:
/// - [0..32]  mint
/// - [32..48] symbol (null padded)
/// - [48]     decimals
/// - [49]     is_swappable
/// - [50..52] weight (per mille)
/// - [52..56] _padding
/// - [56..88] vault
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollateralInfo {
    pub mint: Pubkey,
    pub symbol: String,
    pub decimals: u8,
    pub is_swappable: bool,
    /// Collateral weight, 1000 = full value
    pub weight: u16,
    pub vault: Pubkey,
}

impl CollateralInfo {
    fn read(data: &[u8], offset: usize) -> Self {
        Self {
            mint: read_pubkey(data, offset),
            symbol: read_symbol(data, offset + 32),
            decimals: data[offset + 48],
            is_swappable: data[offset + 49] != 0,
            weight: read_u16(data, offset + 50),
            vault: read_pubkey(data, offset + 56),
        }
    }
}

/// Perp market entry in the State account (128 bytes)
///
/// Layout:
/// - [0..16]    symbol (null padded)
/// - [16..48]   dex market
/// - [48..80]   bids
/// - [80..112]  asks
/// - [112]      price_decimals
/// - [113]      size_decimals
/// - [114..116] imf (per mille)
/// - [116..118] mmf (per mille)
/// - [118..120] cmf (per mille)
/// - [120]      perp_type
/// - [121..128] _padding
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PerpMarketInfo {
    pub symbol: String,
    pub dex_market: Pubkey,
    pub bids: Pubkey,
    pub asks: Pubkey,
    pub price_decimals: u8,
    pub size_decimals: u8,
    /// Initial margin fraction, per mille
    pub imf: u16,
    /// Maintenance margin fraction, per mille
    pub mmf: u16,
    /// Cancel margin fraction, per mille
    pub cmf: u16,
    pub perp_type: u8,
}

impl PerpMarketInfo {
    fn read(data: &[u8], offset: usize) -> Self {
        Self {
            symbol: read_symbol(data, offset),
            dex_market: read_pubkey(data, offset + 16),
            bids: read_pubkey(data, offset + 48),
            asks: read_pubkey(data, offset + 80),
            price_decimals: data[offset + 112],
            size_decimals: data[offset + 113],
            imf: read_u16(data, offset + 114),
            mmf: read_u16(data, offset + 116),
            cmf: read_u16(data, offset + 118),
            perp_type: data[offset + 120],
        }
    }
}

/// State account - exchange-wide collateral and market tables
///
/// Layout:
/// - [0..8]   discriminator
/// - [8..40]  admin
/// - [40..42] collateral count
/// - [42..44] perp market count
/// - [44..48] _padding
/// - [48..80] cache
/// - [80..]   collateral entries, then perp market entries
#[derive(Debug, Clone)]
pub struct State {
    pub admin: Pubkey,
    pub cache: Pubkey,
    pub collaterals: Vec<CollateralInfo>,
    pub perp_markets: Vec<PerpMarketInfo>,
}

impl State {
    /// Deserialize from account data
    pub fn deserialize(data: &[u8]) -> SdkResult<Self> {
        check_len(data, STATE_HEADER_SIZE)?;
        check_discriminator(data, STATE_DISCRIMINATOR)?;

        let collateral_count = read_u16(data, 40) as usize;
        let market_count = read_u16(data, 42) as usize;
        let markets_offset = STATE_HEADER_SIZE + collateral_count * COLLATERAL_INFO_SIZE;
        check_len(data, markets_offset + market_count * PERP_MARKET_INFO_SIZE)?;

        let collaterals = (0..collateral_count)
            .map(|i| CollateralInfo::read(data, STATE_HEADER_SIZE + i * COLLATERAL_INFO_SIZE))
            .collect();
        let perp_markets = (0..market_count)
            .map(|i| PerpMarketInfo::read(data, markets_offset + i * PERP_MARKET_INFO_SIZE))
            .collect();

        Ok(Self {
            admin: read_pubkey(data, 8),
            cache: read_pubkey(data, 48),
            collaterals,
            perp_markets,
        })
    }

    /// Find a perp market by symbol, returning its index.
    pub fn market_index(&self, symbol: &str) -> Option<usize> {
        self.perp_markets.iter().position(|m| m.symbol == symbol)
    }

    /// Find a collateral by symbol, returning its index.
    pub fn collateral_index(&self, symbol: &str) -> Option<usize> {
        self.collaterals.iter().position(|c| c.symbol == symbol)
    }
}

// ============================================================================
// Cache Account
// ============================================================================

/// Oracle price entry (32 bytes)
///
/// Layout:
/// - [0..16]  symbol
/// - [16..24] price (1e9)
/// - [24..32] last_updated (unix seconds)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OracleEntry {
    pub symbol: String,
    pub price: u64,
    pub last_updated: i64,
}

/// Mark price entry per perp market (40 bytes)
///
/// Layout:
/// - [0..16]  symbol
/// - [16..24] mark_price (1e9)
/// - [24..32] funding_rate, hourly (1e9, signed)
/// - [32..40] last_funding_ts (unix seconds)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkEntry {
    pub symbol: String,
    pub mark_price: u64,
    pub funding_rate: i64,
    pub last_funding_ts: i64,
}

/// Cache account - oracle and mark prices
///
/// Layout:
/// - [0..8]   discriminator
/// - [8..10]  oracle count
/// - [10..12] mark count
/// - [12..16] _padding
/// - [16..]   oracle entries, then mark entries
#[derive(Debug, Clone)]
pub struct Cache {
    pub oracles: Vec<OracleEntry>,
    pub marks: Vec<MarkEntry>,
}

impl Cache {
    /// Deserialize from account data
    pub fn deserialize(data: &[u8]) -> SdkResult<Self> {
        check_len(data, CACHE_HEADER_SIZE)?;
        check_discriminator(data, CACHE_DISCRIMINATOR)?;

        let oracle_count = read_u16(data, 8) as usize;
        let mark_count = read_u16(data, 10) as usize;
        let marks_offset = CACHE_HEADER_SIZE + oracle_count * ORACLE_ENTRY_SIZE;
        check_len(data, marks_offset + mark_count * MARK_ENTRY_SIZE)?;

        let oracles = (0..oracle_count)
            .map(|i| {
                let o = CACHE_HEADER_SIZE + i * ORACLE_ENTRY_SIZE;
                OracleEntry {
                    symbol: read_symbol(data, o),
                    price: read_u64(data, o + 16),
                    last_updated: read_i64(data, o + 24),
                }
            })
            .collect();
        let marks = (0..mark_count)
            .map(|i| {
                let o = marks_offset + i * MARK_ENTRY_SIZE;
                MarkEntry {
                    symbol: read_symbol(data, o),
                    mark_price: read_u64(data, o + 16),
                    funding_rate: read_i64(data, o + 24),
                    last_funding_ts: read_i64(data, o + 32),
                }
            })
            .collect();

        Ok(Self { oracles, marks })
    }

    pub fn oracle(&self, symbol: &str) -> Option<&OracleEntry> {
        self.oracles.iter().find(|o| o.symbol == symbol)
    }

    pub fn mark(&self, symbol: &str) -> Option<&MarkEntry> {
        self.marks.iter().find(|m| m.symbol == symbol)
    }
}

// ============================================================================
// Margin Account
// ============================================================================

/// Margin account - a wallet's collateral balances
///
/// Layout:
/// - [0..8]   discriminator
/// - [8..40]  authority
/// - [40..72] control
/// - [72]     nonce
/// - [73..80] _padding
/// - [80..82] collateral count
/// - [82..88] _padding
/// - [88..]   i64 native balance per collateral (negative = borrowed)
#[derive(Debug, Clone)]
pub struct Margin {
    pub authority: Pubkey,
    pub control: Pubkey,
    pub nonce: u8,
    /// Native balances indexed like `State::collaterals`
    pub collateral: Vec<i64>,
}

impl Margin {
    /// Deserialize from account data
    pub fn deserialize(data: &[u8]) -> SdkResult<Self> {
        check_len(data, MARGIN_HEADER_SIZE)?;
        check_discriminator(data, MARGIN_DISCRIMINATOR)?;

        let count = read_u16(data, 80) as usize;
        check_len(data, MARGIN_HEADER_SIZE + count * 8)?;

        Ok(Self {
            authority: read_pubkey(data, 8),
            control: read_pubkey(data, 40),
            nonce: data[72],
            collateral: (0..count)
                .map(|i| read_i64(data, MARGIN_HEADER_SIZE + i * 8))
                .collect(),
        })
    }
}

// ============================================================================
// Control Account
// ============================================================================

/// Per-market position and open order aggregate (48 bytes)
///
/// Layout:
/// - [0..8]   pos_size (native base, signed, positive = long)
/// - [8..16]  native_pc_total (entry cost in native quote)
/// - [16..24] realized_pnl (native quote, signed)
/// - [24..32] coin_on_bids (native base)
/// - [32..40] coin_on_asks (native base)
/// - [40]     order_count
/// - [41..48] _padding
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OpenOrdersInfo {
    pub pos_size: i64,
    pub native_pc_total: i64,
    pub realized_pnl: i64,
    pub coin_on_bids: u64,
    pub coin_on_asks: u64,
    pub order_count: u8,
}

/// Control account - positions and open orders per market
///
/// Layout:
/// - [0..8]   discriminator
/// - [8..40]  authority
/// - [40..42] market count
/// - [42..48] _padding
/// - [48..]   open orders entries, indexed like `State::perp_markets`
#[derive(Debug, Clone)]
pub struct Control {
    pub authority: Pubkey,
    pub open_orders_agg: Vec<OpenOrdersInfo>,
}

impl Control {
    /// Deserialize from account data
    pub fn deserialize(data: &[u8]) -> SdkResult<Self> {
        check_len(data, CONTROL_HEADER_SIZE)?;
        check_discriminator(data, CONTROL_DISCRIMINATOR)?;

        let count = read_u16(data, 40) as usize;
        check_len(data, CONTROL_HEADER_SIZE + count * OPEN_ORDERS_INFO_SIZE)?;

        let open_orders_agg = (0..count)
            .map(|i| {
                let o = CONTROL_HEADER_SIZE + i * OPEN_ORDERS_INFO_SIZE;
                OpenOrdersInfo {
                    pos_size: read_i64(data, o),
                    native_pc_total: read_i64(data, o + 8),
                    realized_pnl: read_i64(data, o + 16),
                    coin_on_bids: read_u64(data, o + 24),
                    coin_on_asks: read_u64(data, o + 32),
                    order_count: data[o + 40],
                }
            })
            .collect();

        Ok(Self {
            authority: read_pubkey(data, 8),
            open_orders_agg,
        })
    }
}

// ============================================================================
// Dex Book Side
// ============================================================================

/// Resting order in a book side (64 bytes)
///
/// Layout:
/// - [0..16]  key (price ticks in the high 64 bits, sequence in the low)
/// - [16..48] owner (control account of the trader)
/// - [48..56] quantity (native base)
/// - [56..64] client_order_id
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Leaf {
    pub key: u128,
    pub owner: Pubkey,
    pub quantity: u64,
    pub client_order_id: u64,
}

impl Leaf {
    /// Price in ticks encoded in the order id.
    pub fn price_ticks(&self) -> u64 {
        (self.key >> 64) as u64
    }
}

/// One side of a dex order book
///
/// Layout:
/// - [0..8]   discriminator ("bookside")
/// - [8]      side (0 = bids, 1 = asks)
/// - [9..12]  _padding
/// - [12..16] leaf count
/// - [16..]   leaves
#[derive(Debug, Clone)]
pub struct BookSide {
    pub side: Side,
    pub leaves: Vec<Leaf>,
}

impl BookSide {
    /// Deserialize from account data
    pub fn deserialize(data: &[u8]) -> SdkResult<Self> {
        check_len(data, BOOKSIDE_HEADER_SIZE)?;
        check_discriminator(data, BOOKSIDE_DISCRIMINATOR)?;

        let side = Side::try_from(data[8])?;
        let count = read_u32(data, 12) as usize;
        check_len(data, BOOKSIDE_HEADER_SIZE + count * LEAF_SIZE)?;

        let leaves = (0..count)
            .map(|i| {
                let o = BOOKSIDE_HEADER_SIZE + i * LEAF_SIZE;
                Leaf {
                    key: read_u128(data, o),
                    owner: read_pubkey(data, o + 16),
                    quantity: read_u64(data, o + 48),
                    client_order_id: read_u64(data, o + 56),
                }
            })
            .collect();

        Ok(Self { side, leaves })
    }

    /// Leaves ordered best price first.
    pub fn sorted(&self) -> Vec<Leaf> {
        let mut leaves = self.leaves.clone();
        match self.side {
            Side::Buy => leaves.sort_by(|a, b| b.key.cmp(&a.key)),
            Side::Sell => leaves.sort_by(|a, b| a.key.cmp(&b.key)),
        }
        leaves
    }

    /// Best leaf on this side.
    pub fn best(&self) -> Option<Leaf> {
        match self.side {
            Side::Buy => self.leaves.iter().max_by_key(|l| l.key).copied(),
            Side::Sell => self.leaves.iter().min_by_key(|l| l.key).copied(),
        }
    }
}

// ============================================================================
// Encoders
// ============================================================================

/// Inverse of the decoders above, used to seed [`MockLedger`](crate::program::MockLedger)
/// with account data.
pub mod encode {
    use super::*;

    fn symbol_bytes(symbol: &str) -> [u8; SYMBOL_LEN] {
        let mut out = [0u8; SYMBOL_LEN];
        out[..symbol.len()].copy_from_slice(symbol.as_bytes());
        out
    }

    pub fn encode_state(state: &State) -> Vec<u8> {
        let mut data = Vec::new();
        data.extend_from_slice(&STATE_DISCRIMINATOR);
        data.extend_from_slice(state.admin.as_ref());
        data.extend_from_slice(&(state.collaterals.len() as u16).to_le_bytes());
        data.extend_from_slice(&(state.perp_markets.len() as u16).to_le_bytes());
        data.extend_from_slice(&[0u8; 4]);
        data.extend_from_slice(state.cache.as_ref());
        for c in &state.collaterals {
            data.extend_from_slice(c.mint.as_ref());
            data.extend_from_slice(&symbol_bytes(&c.symbol));
            data.push(c.decimals);
            data.push(c.is_swappable as u8);
            data.extend_from_slice(&c.weight.to_le_bytes());
            data.extend_from_slice(&[0u8; 4]);
            data.extend_from_slice(c.vault.as_ref());
        }
        for m in &state.perp_markets {
            data.extend_from_slice(&symbol_bytes(&m.symbol));
            data.extend_from_slice(m.dex_market.as_ref());
            data.extend_from_slice(m.bids.as_ref());
            data.extend_from_slice(m.asks.as_ref());
            data.push(m.price_decimals);
            data.push(m.size_decimals);
            data.extend_from_slice(&m.imf.to_le_bytes());
            data.extend_from_slice(&m.mmf.to_le_bytes());
            data.extend_from_slice(&m.cmf.to_le_bytes());
            data.push(m.perp_type);
            data.extend_from_slice(&[0u8; 7]);
        }
        data
    }

    pub fn encode_cache(cache: &Cache) -> Vec<u8> {
        let mut data = Vec::new();
        data.extend_from_slice(&CACHE_DISCRIMINATOR);
        data.extend_from_slice(&(cache.oracles.len() as u16).to_le_bytes());
        data.extend_from_slice(&(cache.marks.len() as u16).to_le_bytes());
        data.extend_from_slice(&[0u8; 4]);
        for o in &cache.oracles {
            data.extend_from_slice(&symbol_bytes(&o.symbol));
            data.extend_from_slice(&o.price.to_le_bytes());
            data.extend_from_slice(&o.last_updated.to_le_bytes());
        }
        for m in &cache.marks {
            data.extend_from_slice(&symbol_bytes(&m.symbol));
            data.extend_from_slice(&m.mark_price.to_le_bytes());
            data.extend_from_slice(&m.funding_rate.to_le_bytes());
            data.extend_from_slice(&m.last_funding_ts.to_le_bytes());
        }
        data
    }

    pub fn encode_margin(margin: &Margin) -> Vec<u8> {
        let mut data = Vec::new();
        data.extend_from_slice(&MARGIN_DISCRIMINATOR);
        data.extend_from_slice(margin.authority.as_ref());
        data.extend_from_slice(margin.control.as_ref());
        data.push(margin.nonce);
        data.extend_from_slice(&[0u8; 7]);
        data.extend_from_slice(&(margin.collateral.len() as u16).to_le_bytes());
        data.extend_from_slice(&[0u8; 6]);
        for balance in &margin.collateral {
            data.extend_from_slice(&balance.to_le_bytes());
        }
        data
    }

    pub fn encode_control(control: &Control) -> Vec<u8> {
        let mut data = Vec::new();
        data.extend_from_slice(&CONTROL_DISCRIMINATOR);
        data.extend_from_slice(control.authority.as_ref());
        data.extend_from_slice(&(control.open_orders_agg.len() as u16).to_le_bytes());
        data.extend_from_slice(&[0u8; 6]);
        for oo in &control.open_orders_agg {
            data.extend_from_slice(&oo.pos_size.to_le_bytes());
            data.extend_from_slice(&oo.native_pc_total.to_le_bytes());
            data.extend_from_slice(&oo.realized_pnl.to_le_bytes());
            data.extend_from_slice(&oo.coin_on_bids.to_le_bytes());
            data.extend_from_slice(&oo.coin_on_asks.to_le_bytes());
            data.push(oo.order_count);
            data.extend_from_slice(&[0u8; 7]);
        }
        data
    }

    pub fn encode_bookside(book: &BookSide) -> Vec<u8> {
        let mut data = Vec::new();
        data.extend_from_slice(&BOOKSIDE_DISCRIMINATOR);
        data.push(book.side as u8);
        data.extend_from_slice(&[0u8; 3]);
        data.extend_from_slice(&(book.leaves.len() as u32).to_le_bytes());
        for leaf in &book.leaves {
            data.extend_from_slice(&leaf.key.to_le_bytes());
            data.extend_from_slice(leaf.owner.as_ref());
            data.extend_from_slice(&leaf.quantity.to_le_bytes());
            data.extend_from_slice(&leaf.client_order_id.to_le_bytes());
        }
        data
    }

    pub fn leaf(price_ticks: u64, seq: u64, owner: Pubkey, quantity: u64, client_order_id: u64) -> Leaf {
        Leaf {
            key: ((price_ticks as u128) << 64) | seq as u128,
            owner,
            quantity,
            client_order_id,
        }
    }
}
