//! Decoded view of the ledger accounts the gateway mirrors.
//!
//! [`AccountSet`] holds the raw program accounts and is owned by the single
//! writer (bootstrap, then the listener). Every accepted push rebuilds an
//! immutable [`Snapshot`] in decimal units, which readers share through the
//! store.

use std::collections::{BTreeMap, HashMap};

use rust_decimal::Decimal;
use solana_pubkey::Pubkey;

use crate::program::accounts::{BookSide, Cache, Control, Leaf, Margin, State};
use crate::program::client::Ledger;
use crate::program::constants::QUOTE_DECIMALS;
use crate::program::error::{SdkError, SdkResult};
use crate::program::types::{DexMarketAccounts, Side};
use crate::shared::scaling::{from_cache_price, from_cache_signed, from_native, from_per_mille};

// ============================================================================
// Reference data
// ============================================================================

/// Collateral asset
#[derive(Debug, Clone, PartialEq)]
pub struct Asset {
    pub symbol: String,
    /// Position in the state's collateral table
    pub index: usize,
    pub mint: Pubkey,
    pub vault: Pubkey,
    pub decimals: u8,
    pub collateral_weight: Decimal,
    pub is_swappable: bool,
    /// Oracle price in quote, `None` when the cache has no entry
    pub oracle_price: Option<Decimal>,
}

/// Perpetual market
#[derive(Debug, Clone, PartialEq)]
pub struct Market {
    pub symbol: String,
    pub underlying: String,
    /// Position in the state's market table
    pub index: usize,
    pub dex_market: Pubkey,
    pub bids: Pubkey,
    pub asks: Pubkey,
    pub price_decimals: u8,
    pub size_decimals: u8,
    pub initial_margin_fraction: Decimal,
    pub maintenance_margin_fraction: Decimal,
    pub mark_price: Decimal,
    pub index_price: Option<Decimal>,
    /// Hourly funding rate
    pub funding_rate: Decimal,
    pub last_funding_ts: i64,
    pub best_bid: Option<Decimal>,
    pub best_ask: Option<Decimal>,
}

impl Market {
    pub fn price_increment(&self) -> Decimal {
        Decimal::new(1, self.price_decimals as u32)
    }

    pub fn size_increment(&self) -> Decimal {
        Decimal::new(1, self.size_decimals as u32)
    }

    pub fn price_from_ticks(&self, ticks: u64) -> Decimal {
        from_native(ticks as i128, self.price_decimals as u32)
    }

    pub fn size_from_native(&self, native: i128) -> Decimal {
        from_native(native, self.size_decimals as u32)
    }

    /// Dex accounts an order instruction on this market needs.
    pub fn dex_accounts(&self, dex_program: Pubkey) -> DexMarketAccounts {
        DexMarketAccounts {
            market: self.dex_market,
            bids: self.bids,
            asks: self.asks,
            dex_program,
        }
    }
}

// ============================================================================
// Order book
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BookLevel {
    pub price: Decimal,
    pub size: Decimal,
}

/// Aggregated price levels, best first on both sides
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderBook {
    pub bids: Vec<BookLevel>,
    pub asks: Vec<BookLevel>,
}

impl OrderBook {
    pub fn best_bid(&self) -> Option<Decimal> {
        self.bids.first().map(|l| l.price)
    }

    pub fn best_ask(&self) -> Option<Decimal> {
        self.asks.first().map(|l| l.price)
    }

    /// Top `depth` levels of each side.
    pub fn truncated(&self, depth: usize) -> OrderBook {
        OrderBook {
            bids: self.bids.iter().take(depth).copied().collect(),
            asks: self.asks.iter().take(depth).copied().collect(),
        }
    }
}

fn aggregate_levels(book: Option<&BookSide>, market: &Market) -> Vec<BookLevel> {
    let Some(book) = book else {
        return Vec::new();
    };
    // Ticks keyed, so bids iterate in reverse for best-first order.
    let mut levels: BTreeMap<u64, u128> = BTreeMap::new();
    for leaf in &book.leaves {
        *levels.entry(leaf.price_ticks()).or_default() += leaf.quantity as u128;
    }
    let to_level = |(ticks, quantity): (&u64, &u128)| BookLevel {
        price: market.price_from_ticks(*ticks),
        size: market.size_from_native(*quantity as i128),
    };
    match book.side {
        Side::Buy => levels.iter().rev().map(to_level).collect(),
        Side::Sell => levels.iter().map(to_level).collect(),
    }
}

// ============================================================================
// Margin account
// ============================================================================

/// Order resting on a book, owned by the account
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenOrder {
    /// Ledger-assigned id (the book leaf key)
    pub order_id: u128,
    pub client_id: Option<u64>,
    pub market: String,
    pub side: Side,
    pub price: Decimal,
    pub size: Decimal,
}

/// Per-market position aggregate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Position {
    pub market: String,
    /// Signed base size, positive = long
    pub size: Decimal,
    /// Quote paid to open the current size
    pub cost_basis: Decimal,
    pub realized_pnl: Decimal,
    /// Base size resting on bids
    pub long_order_size: Decimal,
    /// Base size resting on asks
    pub short_order_size: Decimal,
}

impl Position {
    pub fn side(&self) -> Side {
        Side::from_is_long(self.size >= Decimal::ZERO)
    }

    /// Average entry price, `None` when flat.
    pub fn entry_price(&self) -> Option<Decimal> {
        if self.size.is_zero() {
            None
        } else {
            Some(self.cost_basis / self.size.abs())
        }
    }
}

/// Collateral balance, negative when borrowed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Balance {
    pub symbol: String,
    pub amount: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarginAccount {
    pub authority: Pubkey,
    pub margin: Pubkey,
    pub control: Pubkey,
    pub balances: Vec<Balance>,
    pub positions: Vec<Position>,
    pub open_orders: Vec<OpenOrder>,
}

// ============================================================================
// Snapshot
// ============================================================================

/// Immutable mirror of markets, assets, books and the margin account
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    /// Highest slot among the pushes folded into this snapshot
    pub slot: u64,
    pub markets: Vec<Market>,
    pub assets: Vec<Asset>,
    pub books: HashMap<String, OrderBook>,
    pub account: MarginAccount,
}

impl Snapshot {
    pub fn market(&self, symbol: &str) -> Option<&Market> {
        self.markets.iter().find(|m| m.symbol == symbol)
    }

    pub fn asset(&self, symbol: &str) -> Option<&Asset> {
        self.assets.iter().find(|a| a.symbol == symbol)
    }

    pub fn book(&self, symbol: &str) -> Option<&OrderBook> {
        self.books.get(symbol)
    }

    /// Best bid and ask of a market.
    pub fn best_bid_ask(&self, symbol: &str) -> Option<(Option<Decimal>, Option<Decimal>)> {
        self.market(symbol).map(|m| (m.best_bid, m.best_ask))
    }

    pub fn position(&self, market: &str) -> Option<&Position> {
        self.account.positions.iter().find(|p| p.market == market)
    }

    /// Balance of a collateral asset, zero when absent.
    pub fn balance(&self, symbol: &str) -> Decimal {
        self.account
            .balances
            .iter()
            .find(|b| b.symbol == symbol)
            .map(|b| b.amount)
            .unwrap_or_default()
    }

    pub fn open_order(&self, order_id: u128) -> Option<&OpenOrder> {
        self.account.open_orders.iter().find(|o| o.order_id == order_id)
    }

    pub fn open_order_by_client_id(&self, client_id: u64) -> Option<&OpenOrder> {
        self.account
            .open_orders
            .iter()
            .find(|o| o.client_id == Some(client_id))
    }

    /// Open orders, optionally restricted to one market.
    pub fn open_orders<'a>(&'a self, market: Option<&'a str>) -> impl Iterator<Item = &'a OpenOrder> + 'a {
        self.account
            .open_orders
            .iter()
            .filter(move |o| market.map_or(true, |m| o.market == m))
    }
}

// ============================================================================
// Raw account set
// ============================================================================

/// Raw program accounts backing a snapshot
#[derive(Debug, Clone)]
pub struct AccountSet {
    pub state_key: Pubkey,
    pub margin_key: Pubkey,
    pub state: State,
    pub cache: Cache,
    pub margin: Margin,
    pub control: Control,
    /// Book sides keyed by account address
    pub books: HashMap<Pubkey, BookSide>,
}

async fn fetch(ledger: &dyn Ledger, key: &Pubkey) -> SdkResult<Vec<u8>> {
    ledger
        .account_data(key)
        .await?
        .ok_or_else(|| SdkError::AccountNotFound(key.to_string()))
}

impl AccountSet {
    /// Fetch every account once, in dependency order.
    pub async fn load(ledger: &dyn Ledger, state_key: Pubkey, margin_key: Pubkey) -> SdkResult<Self> {
        let state = State::deserialize(&fetch(ledger, &state_key).await?)?;
        let cache = Cache::deserialize(&fetch(ledger, &state.cache).await?)?;
        let margin = Margin::deserialize(&fetch(ledger, &margin_key).await?)?;
        let control = Control::deserialize(&fetch(ledger, &margin.control).await?)?;

        let book_keys: Vec<Pubkey> = state
            .perp_markets
            .iter()
            .flat_map(|m| [m.bids, m.asks])
            .collect();
        let fetched = futures::future::try_join_all(book_keys.iter().map(|key| fetch(ledger, key))).await?;
        let mut books = HashMap::with_capacity(book_keys.len());
        for (key, data) in book_keys.into_iter().zip(fetched) {
            books.insert(key, BookSide::deserialize(&data)?);
        }

        tracing::info!(
            markets = state.perp_markets.len(),
            collaterals = state.collaterals.len(),
            margin = %margin_key,
            "Loaded margin account state"
        );

        Ok(Self {
            state_key,
            margin_key,
            state,
            cache,
            margin,
            control,
            books,
        })
    }

    /// Accounts whose pushes feed the snapshot.
    pub fn watched_accounts(&self) -> Vec<Pubkey> {
        let mut keys = vec![self.state_key, self.state.cache, self.margin_key, self.margin.control];
        keys.extend(self.state.perp_markets.iter().flat_map(|m| [m.bids, m.asks]));
        keys
    }

    /// Fold a pushed account into the set. Returns `false` for unwatched keys.
    pub fn apply(&mut self, pubkey: &Pubkey, data: &[u8]) -> SdkResult<bool> {
        if *pubkey == self.state_key {
            self.state = State::deserialize(data)?;
        } else if *pubkey == self.state.cache {
            self.cache = Cache::deserialize(data)?;
        } else if *pubkey == self.margin_key {
            self.margin = Margin::deserialize(data)?;
        } else if *pubkey == self.margin.control {
            self.control = Control::deserialize(data)?;
        } else if let Some(book) = self.books.get_mut(pubkey) {
            *book = BookSide::deserialize(data)?;
        } else {
            return Ok(false);
        }
        Ok(true)
    }

    /// Build the decimal view.
    pub fn to_snapshot(&self, slot: u64) -> Snapshot {
        let assets: Vec<Asset> = self
            .state
            .collaterals
            .iter()
            .enumerate()
            .map(|(index, c)| Asset {
                symbol: c.symbol.clone(),
                index,
                mint: c.mint,
                vault: c.vault,
                decimals: c.decimals,
                collateral_weight: from_per_mille(c.weight),
                is_swappable: c.is_swappable,
                oracle_price: self.cache.oracle(&c.symbol).map(|o| from_cache_price(o.price)),
            })
            .collect();

        let mut markets = Vec::with_capacity(self.state.perp_markets.len());
        let mut books = HashMap::with_capacity(self.state.perp_markets.len());
        for (index, info) in self.state.perp_markets.iter().enumerate() {
            let mark = self.cache.mark(&info.symbol);
            let underlying = info.symbol.split('-').next().unwrap_or(&info.symbol).to_string();
            let mut market = Market {
                symbol: info.symbol.clone(),
                index_price: self.cache.oracle(&underlying).map(|o| from_cache_price(o.price)),
                underlying,
                index,
                dex_market: info.dex_market,
                bids: info.bids,
                asks: info.asks,
                price_decimals: info.price_decimals,
                size_decimals: info.size_decimals,
                initial_margin_fraction: from_per_mille(info.imf),
                maintenance_margin_fraction: from_per_mille(info.mmf),
                mark_price: mark.map(|m| from_cache_price(m.mark_price)).unwrap_or_default(),
                funding_rate: mark.map(|m| from_cache_signed(m.funding_rate)).unwrap_or_default(),
                last_funding_ts: mark.map(|m| m.last_funding_ts).unwrap_or_default(),
                best_bid: None,
                best_ask: None,
            };
            let book = OrderBook {
                bids: aggregate_levels(self.books.get(&info.bids), &market),
                asks: aggregate_levels(self.books.get(&info.asks), &market),
            };
            market.best_bid = book.best_bid();
            market.best_ask = book.best_ask();
            books.insert(market.symbol.clone(), book);
            markets.push(market);
        }

        let account = self.margin_account(&assets, &markets);
        Snapshot {
            slot,
            markets,
            assets,
            books,
            account,
        }
    }

    fn margin_account(&self, assets: &[Asset], markets: &[Market]) -> MarginAccount {
        let balances = assets
            .iter()
            .map(|asset| Balance {
                symbol: asset.symbol.clone(),
                amount: self
                    .margin
                    .collateral
                    .get(asset.index)
                    .map(|native| from_native(*native as i128, asset.decimals as u32))
                    .unwrap_or_default(),
            })
            .collect();

        let positions = markets
            .iter()
            .zip(&self.control.open_orders_agg)
            .filter(|(_, oo)| {
                oo.pos_size != 0 || oo.coin_on_bids != 0 || oo.coin_on_asks != 0 || oo.realized_pnl != 0
            })
            .map(|(market, oo)| Position {
                market: market.symbol.clone(),
                size: market.size_from_native(oo.pos_size as i128),
                cost_basis: from_native(oo.native_pc_total.unsigned_abs() as i128, QUOTE_DECIMALS),
                realized_pnl: from_native(oo.realized_pnl as i128, QUOTE_DECIMALS),
                long_order_size: market.size_from_native(oo.coin_on_bids as i128),
                short_order_size: market.size_from_native(oo.coin_on_asks as i128),
            })
            .collect();

        let owner = self.margin.control;
        let mut open_orders = Vec::new();
        for market in markets {
            for key in [market.bids, market.asks] {
                let Some(book) = self.books.get(&key) else {
                    continue;
                };
                open_orders.extend(
                    book.sorted()
                        .into_iter()
                        .filter(|leaf| leaf.owner == owner)
                        .map(|leaf| open_order(&leaf, book.side, market)),
                );
            }
        }

        MarginAccount {
            authority: self.margin.authority,
            margin: self.margin_key,
            control: self.margin.control,
            balances,
            positions,
            open_orders,
        }
    }
}

fn open_order(leaf: &Leaf, side: Side, market: &Market) -> OpenOrder {
    OpenOrder {
        order_id: leaf.key,
        client_id: (leaf.client_order_id != 0).then_some(leaf.client_order_id),
        market: market.symbol.clone(),
        side,
        price: market.price_from_ticks(leaf.price_ticks()),
        size: market.size_from_native(leaf.quantity as i128),
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::account_set;
    use super::*;
    use super::fixtures::seed_ledger;
    use crate::program::accounts::encode::encode_margin;
    use crate::program::mock::{MockLedger, MockOutcome};
    use rust_decimal_macros::dec;

    #[test]
    fn test_snapshot_markets_and_books() {
        let snapshot = account_set().to_snapshot(7);
        assert_eq!(snapshot.slot, 7);

        let market = snapshot.market("XRP-PERP").unwrap();
        assert_eq!(market.underlying, "XRP");
        assert_eq!(market.mark_price, dec!(0.306));
        assert_eq!(market.index_price, Some(dec!(0.305)));
        assert_eq!(market.initial_margin_fraction, dec!(0.1));
        assert_eq!(market.best_bid, Some(dec!(0.3055)));
        assert_eq!(market.best_ask, Some(dec!(0.306525)));

        let book = snapshot.book("XRP-PERP").unwrap();
        assert_eq!(
            book.bids,
            vec![
                BookLevel { price: dec!(0.3055), size: dec!(1250) },
                BookLevel { price: dec!(0.305), size: dec!(500) },
            ]
        );
        assert_eq!(book.truncated(1).bids.len(), 1);
    }

    #[test]
    fn test_snapshot_account_view() {
        let snapshot = account_set().to_snapshot(1);
        assert_eq!(snapshot.balance("USDC"), dec!(1000));
        assert_eq!(snapshot.balance("USDT"), dec!(50));
        assert_eq!(snapshot.balance("SOL"), Decimal::ZERO);

        let position = snapshot.position("XRP-PERP").unwrap();
        assert_eq!(position.size, dec!(1000));
        assert_eq!(position.entry_price(), Some(dec!(0.3)));
        assert_eq!(position.realized_pnl, dec!(2));
        assert_eq!(position.long_order_size, dec!(500));

        let orders: Vec<_> = snapshot.open_orders(None).collect();
        assert_eq!(orders.len(), 1);
        assert_eq!(orders[0].client_id, Some(42));
        assert_eq!(orders[0].price, dec!(0.305));
        assert_eq!(snapshot.open_order_by_client_id(42), Some(orders[0]));
        assert!(snapshot.open_orders(Some("BTC-PERP")).next().is_none());
    }

    #[test]
    fn test_apply_push() {
        let mut set = account_set();
        let mut margin = set.margin.clone();
        margin.collateral[0] = 0;
        let margin_key = set.margin_key;
        assert!(set.apply(&margin_key, &encode_margin(&margin)).unwrap());
        assert_eq!(set.to_snapshot(2).balance("USDC"), Decimal::ZERO);

        assert!(!set.apply(&Pubkey::new_unique(), &[]).unwrap());
    }

    #[test]
    fn test_apply_rejects_garbage() {
        let mut set = account_set();
        let bids = set.state.perp_markets[0].bids;
        assert!(set.apply(&bids, &[1, 2, 3]).is_err());
        // Unchanged after a failed decode
        assert_eq!(set.books[&bids].leaves.len(), 3);
    }

    #[test]
    fn test_watched_accounts() {
        let set = account_set();
        let watched = set.watched_accounts();
        assert_eq!(watched.len(), 6);
        assert!(watched.contains(&set.margin.control));
        assert!(watched.contains(&set.state.cache));
    }

    #[tokio::test]
    async fn test_load_reports_missing_account() {
        let set = account_set();
        let ledger = MockLedger::new(|_| MockOutcome::NeverConfirm);
        let err = AccountSet::load(&ledger, set.state_key, set.margin_key)
            .await
            .unwrap_err();
        assert!(matches!(err, SdkError::AccountNotFound(key) if key == set.state_key.to_string()));
    }

    #[tokio::test]
    async fn test_load_from_ledger() {
        let set = account_set();
        let ledger = MockLedger::new(|_| MockOutcome::NeverConfirm);
        seed_ledger(&ledger, &set);

        let loaded = AccountSet::load(&ledger, set.state_key, set.margin_key)
            .await
            .unwrap();
        assert_eq!(loaded.to_snapshot(0), set.to_snapshot(0));
    }
}
