//! REST payloads from snapshots, metrics and confirmed outcomes.
//!
//! Formatting only: nothing here touches the ledger. Unbounded ratios
//! become `None` (JSON `null`).

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::api::types::{
    AccountInfo, BookEntry, CancelAllInfo, CancelFailureInfo, CancelledInfo, CoinInfo, FundingRate,
    MarketInfo, OrderInfo, OrderbookInfo, PositionInfo, TransferInfo, WalletBalance,
};
use crate::metrics::{self, is_unbounded, AccountMetrics};
use crate::orders::OrderKind;
use crate::snapshot::model::{Asset, Market, OpenOrder, OrderBook, Position, Snapshot};
use crate::trading::{CancelAllReport, CompletedTransfer, PlacedOrder};

/// Status of a confirmed transfer.
pub const TRANSFER_PROCESSED: &str = "processed";

const ORDER_OPEN: &str = "open";
const ORDER_CLOSED: &str = "closed";

fn bounded(value: Decimal) -> Option<Decimal> {
    (!is_unbounded(value)).then_some(value)
}

/// `closed` iff nothing remains, whatever the order type.
pub fn order_status(remaining: Decimal) -> &'static str {
    if remaining.is_zero() {
        ORDER_CLOSED
    } else {
        ORDER_OPEN
    }
}

fn format_order_id(id: u128) -> String {
    id.to_string()
}

// ============================================================================
// Orders
// ============================================================================

/// Response of a placement or modify.
pub fn placed_order(placed: &PlacedOrder, now: DateTime<Utc>) -> OrderInfo {
    let order = &placed.order;
    if placed.filled_size > order.size {
        tracing::warn!(
            signature = %placed.signature,
            market = %order.market,
            size = %order.size,
            filled = %placed.filled_size,
            "Fill events exceed the order size, reporting it as fully filled"
        );
    }
    let remaining = (order.size - placed.filled_size).max(Decimal::ZERO);
    OrderInfo {
        id: None,
        client_id: order.client_id,
        market: order.market.clone(),
        future: order.market.clone(),
        side: order.side,
        kind: order.kind,
        price: order.price,
        size: order.size,
        filled_size: placed.filled_size,
        remaining_size: remaining,
        avg_fill_price: placed.avg_fill_price,
        status: order_status(remaining).to_string(),
        reduce_only: order.order_type.is_reduce_only(),
        ioc: order.order_type.is_ioc(),
        post_only: order.order_type.is_post_only(),
        created_at: Some(now),
        txid: Some(placed.signature.to_string()),
    }
}

/// A resting order as read from the book. The book only keeps what is left,
/// so the listed size is the remaining size.
pub fn open_order(order: &OpenOrder) -> OrderInfo {
    OrderInfo {
        id: Some(format_order_id(order.order_id)),
        client_id: order.client_id,
        market: order.market.clone(),
        future: order.market.clone(),
        side: order.side,
        kind: OrderKind::Limit,
        price: order.price,
        size: order.size,
        filled_size: Decimal::ZERO,
        remaining_size: order.size,
        avg_fill_price: None,
        status: order_status(order.size).to_string(),
        reduce_only: false,
        ioc: false,
        post_only: false,
        created_at: None,
        txid: None,
    }
}

pub fn cancel_all(report: &CancelAllReport) -> CancelAllInfo {
    CancelAllInfo {
        succeeded: report
            .succeeded
            .iter()
            .map(|c| CancelledInfo {
                id: c.order_id.map(format_order_id),
                client_id: c.client_id,
                market: c.market.clone(),
                txid: c.signature.to_string(),
            })
            .collect(),
        failed: report
            .failed
            .iter()
            .map(|f| CancelFailureInfo {
                id: f.order_id.map(format_order_id),
                client_id: f.client_id,
                market: f.market.clone(),
                error: f.error.to_string(),
                retryable: f.error.is_retryable(),
            })
            .collect(),
    }
}

// ============================================================================
// Markets
// ============================================================================

pub fn market(market: &Market) -> MarketInfo {
    MarketInfo {
        name: market.symbol.clone(),
        base_currency: None,
        quote_currency: None,
        market_type: "future".to_string(),
        underlying: market.underlying.clone(),
        enabled: true,
        ask: market.best_ask,
        bid: market.best_bid,
        last: market.mark_price,
        price: market.mark_price,
        mark: market.mark_price,
        index: market.index_price,
        post_only: false,
        price_increment: market.price_increment(),
        size_increment: market.size_increment(),
        min_provide_size: market.size_increment(),
        restricted: false,
    }
}

pub fn orderbook(book: &OrderBook, depth: usize) -> OrderbookInfo {
    let book = book.truncated(depth);
    let entries = |levels: &[crate::snapshot::model::BookLevel]| {
        levels.iter().map(|l| BookEntry(l.price, l.size)).collect()
    };
    OrderbookInfo {
        asks: entries(&book.asks),
        bids: entries(&book.bids),
    }
}

pub fn funding_rates(snapshot: &Snapshot) -> Vec<FundingRate> {
    snapshot
        .markets
        .iter()
        .map(|m| FundingRate {
            future: m.symbol.clone(),
            rate: m.funding_rate,
            time: DateTime::from_timestamp(m.last_funding_ts, 0).unwrap_or_default(),
        })
        .collect()
}

// ============================================================================
// Account
// ============================================================================

pub fn position(position: &Position, market: &Market) -> PositionInfo {
    PositionInfo {
        future: position.market.clone(),
        cost: position.cost_basis,
        entry_price: position.entry_price(),
        initial_margin_requirement: market.initial_margin_fraction,
        maintenance_margin_requirement: market.maintenance_margin_fraction,
        long_order_size: position.long_order_size,
        short_order_size: position.short_order_size,
        net_size: position.size,
        open_size: metrics::open_size(position),
        realized_pnl: position.realized_pnl,
        unrealized_pnl: metrics::position_pnl(position, market),
        side: position.side(),
        size: position.size.abs(),
        collateral_used: metrics::collateral_used(position, market),
    }
}

pub fn positions(snapshot: &Snapshot) -> Vec<PositionInfo> {
    snapshot
        .account
        .positions
        .iter()
        .filter_map(|p| snapshot.market(&p.market).map(|m| position(p, m)))
        .collect()
}

pub fn account(snapshot: &Snapshot) -> AccountInfo {
    let m = AccountMetrics::compute(snapshot);
    AccountInfo {
        username: snapshot.account.authority.to_string(),
        margin_account: snapshot.account.margin.to_string(),
        collateral: m.collateral,
        free_collateral: m.free_collateral,
        total_account_value: m.total_account_value,
        total_position_size: m.total_position_size,
        margin_fraction: bounded(m.margin_fraction),
        open_margin_fraction: bounded(m.open_margin_fraction),
        initial_margin_requirement: bounded(m.initial_margin_requirement),
        maintenance_margin_requirement: bounded(m.maintenance_margin_requirement),
        leverage: bounded(m.leverage),
        liquidating: m.liquidating,
        positions: positions(snapshot),
    }
}

// ============================================================================
// Wallet
// ============================================================================

pub fn coin(asset: &Asset) -> CoinInfo {
    CoinInfo {
        id: asset.symbol.clone(),
        name: asset.symbol.clone(),
        collateral: true,
        collateral_weight: asset.collateral_weight,
        can_deposit: true,
        can_withdraw: true,
        can_convert: asset.is_swappable,
        spl_mint: asset.mint.to_string(),
        decimals: asset.decimals,
        usd_fungible: false,
    }
}

pub fn balances(snapshot: &Snapshot) -> Vec<WalletBalance> {
    snapshot
        .assets
        .iter()
        .map(|asset| {
            let total = snapshot.balance(&asset.symbol);
            let free = metrics::withdrawable_without_borrow(snapshot, &asset.symbol);
            WalletBalance {
                coin: asset.symbol.clone(),
                free,
                spot_borrow: (-total).max(Decimal::ZERO),
                total,
                usd_value: total * asset.oracle_price.unwrap_or_default(),
                available_without_borrow: free,
            }
        })
        .collect()
}

pub fn transfer(done: &CompletedTransfer, now: DateTime<Utc>) -> TransferInfo {
    TransferInfo {
        coin: done.coin.clone(),
        size: done.size,
        status: TRANSFER_PROCESSED.to_string(),
        time: now,
        txid: done.signature.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orders::fixtures::xrp_sell;
    use crate::orders::{OrderFlags, PlaceOrder};
    use crate::program::types::{OrderType, Side};
    use crate::orders::TransferKind;
    use crate::snapshot::model::fixtures::account_set;
    use rust_decimal_macros::dec;
    use solana_instruction::Instruction;
    use solana_pubkey::Pubkey;
    use solana_signature::Signature;

    fn placed(size: Decimal, filled: Decimal, order_type: OrderType) -> PlacedOrder {
        let request = xrp_sell();
        PlacedOrder {
            order: PlaceOrder {
                market: request.market,
                side: request.side,
                price: dec!(0.306525),
                size,
                kind: OrderKind::Limit,
                order_type,
                client_id: None,
                size_decimals: 0,
                instruction: Instruction {
                    program_id: Pubkey::new_unique(),
                    accounts: vec![],
                    data: vec![],
                },
            },
            signature: Signature::default(),
            filled_size: filled,
            avg_fill_price: None,
            realized_pnl: Decimal::ZERO,
        }
    }

    #[test]
    fn test_remaining_and_status() {
        let now = Utc::now();
        let open = placed_order(&placed(dec!(31431), dec!(10), OrderType::Limit), now);
        assert_eq!(open.remaining_size, dec!(31421));
        assert_eq!(open.status, "open");
        assert_eq!(open.id, None);

        let closed = placed_order(&placed(dec!(31431), dec!(31431), OrderType::Limit), now);
        assert_eq!(closed.remaining_size, Decimal::ZERO);
        assert_eq!(closed.status, "closed");
    }

    #[test]
    fn test_overfill_reports_closed_with_logged_fill() {
        let info = placed_order(&placed(dec!(500), dec!(520), OrderType::Limit), Utc::now());
        assert_eq!(info.filled_size, dec!(520));
        assert_eq!(info.remaining_size, Decimal::ZERO);
        assert_eq!(info.status, "closed");
    }

    #[test]
    fn test_flags_echo_order_type() {
        let info = placed_order(&placed(dec!(1), dec!(0), OrderType::ReduceOnlyIoc), Utc::now());
        assert!(info.reduce_only && info.ioc && !info.post_only);
        assert_eq!(OrderFlags::of(OrderType::ReduceOnlyIoc).order_type(), OrderType::ReduceOnlyIoc);
    }

    #[test]
    fn test_order_json_shape() {
        let info = placed_order(&placed(dec!(31431), dec!(0), OrderType::Limit), Utc::now());
        let json = serde_json::to_value(&info).unwrap();
        assert_eq!(json["side"], "sell");
        assert_eq!(json["type"], "limit");
        assert_eq!(json["size"], 31431.0);
        assert_eq!(json["price"], 0.306525);
        assert_eq!(json["remainingSize"], 31431.0);
        assert!(json["id"].is_null());
        assert!(json["avgFillPrice"].is_null());
    }

    #[test]
    fn test_open_order_view() {
        let snapshot = account_set().to_snapshot(1);
        let order = snapshot.open_order_by_client_id(42).unwrap();
        let info = open_order(order);
        assert_eq!(info.id, Some(order.order_id.to_string()));
        assert_eq!(info.side, Side::Buy);
        assert_eq!(info.status, "open");
    }

    #[test]
    fn test_account_renders_flat_ratios_as_null() {
        let mut snapshot = account_set().to_snapshot(1);
        snapshot.account.positions.clear();
        let info = account(&snapshot);
        assert_eq!(info.margin_fraction, None);
        assert_eq!(info.leverage, Some(Decimal::ZERO));
        assert!(!info.liquidating);
        let json = serde_json::to_value(&info).unwrap();
        assert!(json["marginFraction"].is_null());
    }

    #[test]
    fn test_positions_and_balances() {
        let snapshot = account_set().to_snapshot(1);
        let rows = positions(&snapshot);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].future, "XRP-PERP");
        assert_eq!(rows[0].side, Side::Buy);
        assert_eq!(rows[0].entry_price, Some(dec!(0.3)));

        let balances = balances(&snapshot);
        let usdt = balances.iter().find(|b| b.coin == "USDT").unwrap();
        assert_eq!(usdt.total, dec!(50));
        assert_eq!(usdt.spot_borrow, Decimal::ZERO);
        assert!(usdt.free <= usdt.total);
    }

    #[test]
    fn test_transfer_is_processed() {
        let done = CompletedTransfer {
            kind: TransferKind::Withdrawal,
            coin: "USDT".to_string(),
            size: dec!(20.2),
            signature: Signature::default(),
        };
        let info = transfer(&done, Utc::now());
        assert_eq!(info.status, "processed");
        let json = serde_json::to_value(&info).unwrap();
        assert_eq!(json["size"], 20.2);
        assert_eq!(json["coin"], "USDT");
    }
}
