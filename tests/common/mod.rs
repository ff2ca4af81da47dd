//! Shared fixtures: a synthetic XRP-PERP account seeded into a mock ledger.

#![allow(dead_code)]

use std::sync::Arc;

use solana_keypair::Keypair;
use solana_pubkey::Pubkey;
use solana_signer::Signer;
use solana_transaction::Transaction;
use zo_gateway::network::ProgramKeys;
use zo_gateway::program::accounts::encode::{
    encode_bookside, encode_cache, encode_control, encode_margin, encode_state, leaf,
};
use zo_gateway::program::accounts::{
    BookSide, Cache, CollateralInfo, Control, MarkEntry, Margin, OpenOrdersInfo, OracleEntry,
    PerpMarketInfo, State,
};
use zo_gateway::program::constants::instruction;
use zo_gateway::program::{ConfirmConfig, MockLedger, MockOutcome, Side};
use zo_gateway::session::Session;

/// Client id of the resting bid the account owns.
pub const OWN_CLIENT_ID: u64 = 42;

/// Client id of the resting ask added by [`Scenario::two_orders`].
pub const ASK_CLIENT_ID: u64 = 43;

/// How the synthetic account starts out.
#[derive(Debug, Clone, Copy)]
pub struct Scenario {
    /// Long 1000 XRP with one resting bid; otherwise flat with no orders
    pub with_position: bool,
    /// Also rest a 200 XRP ask at 0.307
    pub with_ask: bool,
}

impl Scenario {
    pub fn flat() -> Self {
        Self {
            with_position: false,
            with_ask: false,
        }
    }

    pub fn two_orders() -> Self {
        Self {
            with_position: true,
            with_ask: true,
        }
    }
}

impl Default for Scenario {
    fn default() -> Self {
        Self {
            with_position: true,
            with_ask: false,
        }
    }
}

/// Whether `tx` cancels a resting ask by order id.
pub fn cancels_ask(tx: &Transaction) -> bool {
    // [discriminator(8), 1, order_id(16), 1, is_long, 0]
    tx.message.instructions.iter().any(|ix| {
        ix.data.len() == 28 && ix.data[..8] == instruction::CANCEL_PERP_ORDER && ix.data[26] == 0
    })
}

pub fn fast_confirm() -> ConfirmConfig {
    ConfirmConfig {
        max_attempts: 3,
        base_delay_ms: 1,
        max_delay_ms: 2,
    }
}

/// Seed `ledger` with a full account set and bootstrap a session over it.
pub async fn bootstrap<F>(scenario: Scenario, outcome: F) -> (Session, Arc<MockLedger>)
where
    F: Fn(&Transaction) -> MockOutcome + Send + Sync + 'static,
{
    let keypair = Arc::new(Keypair::new());
    let keys = ProgramKeys {
        program_id: Pubkey::new_unique(),
        dex_program: Pubkey::new_unique(),
        state: Pubkey::new_unique(),
    };
    let ledger = Arc::new(MockLedger::new(outcome));
    seed(&ledger, &keys, &keypair.pubkey(), scenario);

    let (session, _accounts) = Session::bootstrap(keypair, keys, ledger.clone(), fast_confirm())
        .await
        .expect("bootstrap over seeded ledger");
    (session, ledger)
}

fn seed(ledger: &MockLedger, keys: &ProgramKeys, authority: &Pubkey, scenario: Scenario) {
    let control = Pubkey::new_unique();
    let cache_key = Pubkey::new_unique();
    let bids = Pubkey::new_unique();
    let asks = Pubkey::new_unique();
    let stranger = Pubkey::new_unique();

    let collateral = |symbol: &str, weight: u16, is_swappable: bool| CollateralInfo {
        mint: Pubkey::new_unique(),
        symbol: symbol.to_string(),
        decimals: 6,
        is_swappable,
        weight,
        vault: Pubkey::new_unique(),
    };
    let state = State {
        admin: Pubkey::new_unique(),
        cache: cache_key,
        collaterals: vec![collateral("USDC", 1000, false), collateral("USDT", 975, true)],
        perp_markets: vec![PerpMarketInfo {
            symbol: "XRP-PERP".to_string(),
            dex_market: Pubkey::new_unique(),
            bids,
            asks,
            price_decimals: 6,
            size_decimals: 0,
            imf: 100,
            mmf: 50,
            cmf: 25,
            perp_type: 0,
        }],
    };

    let oracle = |symbol: &str, price: u64| OracleEntry {
        symbol: symbol.to_string(),
        price,
        last_updated: 0,
    };
    let cache = Cache {
        oracles: vec![
            oracle("USDC", 1_000_000_000),
            oracle("USDT", 1_000_000_000),
            oracle("XRP", 305_000_000),
        ],
        marks: vec![MarkEntry {
            symbol: "XRP-PERP".to_string(),
            mark_price: 306_000_000,
            funding_rate: 12_500,
            last_funding_ts: 1_700_000_000,
        }],
    };

    let margin = Margin {
        authority: *authority,
        control,
        nonce: 255,
        collateral: vec![1_000_000_000, 50_000_000],
    };
    let open_orders = if scenario.with_position {
        OpenOrdersInfo {
            pos_size: 1_000,
            native_pc_total: 300_000_000,
            realized_pnl: 2_000_000,
            coin_on_bids: 500,
            coin_on_asks: if scenario.with_ask { 200 } else { 0 },
            order_count: if scenario.with_ask { 2 } else { 1 },
        }
    } else {
        OpenOrdersInfo {
            pos_size: 0,
            native_pc_total: 0,
            realized_pnl: 0,
            coin_on_bids: 0,
            coin_on_asks: 0,
            order_count: 0,
        }
    };
    let control_account = Control {
        authority: *authority,
        open_orders_agg: vec![open_orders],
    };

    let mut bid_leaves = vec![
        leaf(305_500, 2, stranger, 1_000, 0),
        leaf(305_500, 3, stranger, 250, 0),
    ];
    if scenario.with_position {
        bid_leaves.push(leaf(305_000, 1, control, 500, OWN_CLIENT_ID));
    }
    let bid_side = BookSide {
        side: Side::Buy,
        leaves: bid_leaves,
    };
    let mut ask_leaves = vec![leaf(306_525, 4, stranger, 31_431, 0)];
    if scenario.with_ask {
        ask_leaves.push(leaf(307_000, 5, control, 200, ASK_CLIENT_ID));
    }
    let ask_side = BookSide {
        side: Side::Sell,
        leaves: ask_leaves,
    };

    let margin_key = Session::margin_address(authority, keys);
    ledger.set_account(keys.state, encode_state(&state));
    ledger.set_account(cache_key, encode_cache(&cache));
    ledger.set_account(margin_key, encode_margin(&margin));
    ledger.set_account(control, encode_control(&control_account));
    ledger.set_account(bids, encode_bookside(&bid_side));
    ledger.set_account(asks, encode_bookside(&ask_side));
}
