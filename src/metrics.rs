//! Account and position figures derived from a [`Snapshot`].
//!
//! Everything here is a pure function of its inputs. Ratios whose
//! denominator is zero return [`UNBOUNDED`] instead of failing; the REST
//! layer renders it as `null`.
//!
//! Definitions:
//! - collateral: positive balances at oracle price times collateral weight,
//!   borrows at full oracle price
//! - account value: collateral plus unrealized pnl of every position
//! - open size: worst-case position if every resting order on one side
//!   fills, `max(|size + bids|, |size - asks|)`
//! - collateral used: open size at mark price times the market's initial
//!   margin fraction
//! - free collateral: account value minus collateral used across markets

use rust_decimal::Decimal;

use crate::program::types::Side;
use crate::snapshot::model::{Asset, Market, Position, Snapshot};

/// Sentinel for a ratio with a zero denominator.
pub const UNBOUNDED: Decimal = Decimal::MAX;

/// `numerator / denominator`, or [`UNBOUNDED`] when the denominator is zero.
pub fn ratio(numerator: Decimal, denominator: Decimal) -> Decimal {
    if denominator.is_zero() {
        UNBOUNDED
    } else {
        numerator.checked_div(denominator).unwrap_or(UNBOUNDED)
    }
}

/// Whether a ratio is the zero-denominator sentinel.
pub fn is_unbounded(value: Decimal) -> bool {
    value == UNBOUNDED
}

// ============================================================================
// Position level
// ============================================================================

/// `(mark - entry) * |size| * sign(side)`, zero when flat.
pub fn position_pnl(position: &Position, market: &Market) -> Decimal {
    let Some(entry) = position.entry_price() else {
        return Decimal::ZERO;
    };
    let sign = match position.side() {
        Side::Buy => Decimal::ONE,
        Side::Sell => Decimal::NEGATIVE_ONE,
    };
    (market.mark_price - entry) * position.size.abs() * sign
}

/// Position notional at mark price.
pub fn position_notional(position: &Position, market: &Market) -> Decimal {
    position.size.abs() * market.mark_price
}

/// Worst-case absolute position if one side of resting orders fills.
pub fn open_size(position: &Position) -> Decimal {
    let if_bids_fill = (position.size + position.long_order_size).abs();
    let if_asks_fill = (position.size - position.short_order_size).abs();
    if_bids_fill.max(if_asks_fill)
}

/// Notional of [`open_size`] at mark price.
pub fn open_order_notional(position: &Position, market: &Market) -> Decimal {
    open_size(position) * market.mark_price
}

/// Initial margin held against a position and its resting orders.
pub fn collateral_used(position: &Position, market: &Market) -> Decimal {
    open_order_notional(position, market) * market.initial_margin_fraction
}

// ============================================================================
// Account level
// ============================================================================

fn asset_value(asset: &Asset, amount: Decimal) -> Decimal {
    let price = asset.oracle_price.unwrap_or_default();
    if amount.is_sign_negative() {
        amount * price
    } else {
        amount * price * asset.collateral_weight
    }
}

/// Weighted collateral in quote.
pub fn collateral(snapshot: &Snapshot) -> Decimal {
    snapshot
        .assets
        .iter()
        .map(|asset| asset_value(asset, snapshot.balance(&asset.symbol)))
        .sum()
}

/// Positions paired with their market, skipping positions whose market is gone.
fn positions_with_markets(snapshot: &Snapshot) -> impl Iterator<Item = (&Position, &Market)> {
    snapshot
        .account
        .positions
        .iter()
        .filter_map(|p| snapshot.market(&p.market).map(|m| (p, m)))
}

pub fn unrealized_pnl(snapshot: &Snapshot) -> Decimal {
    positions_with_markets(snapshot)
        .map(|(p, m)| position_pnl(p, m))
        .sum()
}

/// Collateral plus unrealized pnl.
pub fn account_value(snapshot: &Snapshot) -> Decimal {
    collateral(snapshot) + unrealized_pnl(snapshot)
}

/// Sum of position notionals.
pub fn total_position_notional(snapshot: &Snapshot) -> Decimal {
    positions_with_markets(snapshot)
        .map(|(p, m)| position_notional(p, m))
        .sum()
}

fn total_open_notional(snapshot: &Snapshot) -> Decimal {
    positions_with_markets(snapshot)
        .map(|(p, m)| open_order_notional(p, m))
        .sum()
}

/// Account value over position notional.
pub fn margin_fraction(snapshot: &Snapshot) -> Decimal {
    ratio(account_value(snapshot), total_position_notional(snapshot))
}

/// Account value over worst-case notional including resting orders.
pub fn open_margin_fraction(snapshot: &Snapshot) -> Decimal {
    ratio(account_value(snapshot), total_open_notional(snapshot))
}

fn weighted_fraction(snapshot: &Snapshot, fraction: impl Fn(&Market) -> Decimal) -> Decimal {
    let (weighted, notional) = positions_with_markets(snapshot).fold(
        (Decimal::ZERO, Decimal::ZERO),
        |(weighted, notional), (p, m)| {
            let n = position_notional(p, m);
            (weighted + n * fraction(m), notional + n)
        },
    );
    ratio(weighted, notional)
}

/// Notional-weighted initial margin fraction the account must keep.
pub fn initial_margin_fraction(snapshot: &Snapshot) -> Decimal {
    weighted_fraction(snapshot, |m| m.initial_margin_fraction)
}

/// Notional-weighted maintenance margin fraction; below it the account
/// can be liquidated.
pub fn maintenance_margin_fraction(snapshot: &Snapshot) -> Decimal {
    weighted_fraction(snapshot, |m| m.maintenance_margin_fraction)
}

/// Account value not tied up by positions or resting orders. May be negative.
pub fn free_collateral(snapshot: &Snapshot) -> Decimal {
    let used: Decimal = positions_with_markets(snapshot)
        .map(|(p, m)| collateral_used(p, m))
        .sum();
    account_value(snapshot) - used
}

/// How much of `symbol` can leave the account without borrowing or
/// breaching initial margin. Never negative.
pub fn withdrawable_without_borrow(snapshot: &Snapshot, symbol: &str) -> Decimal {
    let Some(asset) = snapshot.asset(symbol) else {
        return Decimal::ZERO;
    };
    let balance = snapshot.balance(symbol).max(Decimal::ZERO);
    let free = free_collateral(snapshot).max(Decimal::ZERO);
    let unit_value = asset.oracle_price.unwrap_or_default() * asset.collateral_weight;
    let by_margin = if unit_value.is_zero() {
        balance
    } else {
        free / unit_value
    };
    balance.min(by_margin).max(Decimal::ZERO)
}

/// Position notional over account value.
pub fn leverage(snapshot: &Snapshot) -> Decimal {
    let value = account_value(snapshot);
    if value <= Decimal::ZERO {
        return UNBOUNDED;
    }
    ratio(total_position_notional(snapshot), value)
}

/// Figures shown by the account endpoint, computed once per request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountMetrics {
    pub collateral: Decimal,
    pub free_collateral: Decimal,
    pub total_account_value: Decimal,
    pub total_position_size: Decimal,
    pub margin_fraction: Decimal,
    pub open_margin_fraction: Decimal,
    pub initial_margin_requirement: Decimal,
    pub maintenance_margin_requirement: Decimal,
    pub leverage: Decimal,
    /// Margin fraction below maintenance requirement
    pub liquidating: bool,
}

impl AccountMetrics {
    pub fn compute(snapshot: &Snapshot) -> Self {
        let margin_fraction = margin_fraction(snapshot);
        let maintenance = maintenance_margin_fraction(snapshot);
        Self {
            collateral: collateral(snapshot),
            free_collateral: free_collateral(snapshot),
            total_account_value: account_value(snapshot),
            total_position_size: total_position_notional(snapshot),
            margin_fraction,
            open_margin_fraction: open_margin_fraction(snapshot),
            initial_margin_requirement: initial_margin_fraction(snapshot),
            maintenance_margin_requirement: maintenance,
            leverage: leverage(snapshot),
            liquidating: !is_unbounded(maintenance) && margin_fraction < maintenance,
        }
    }
}
