//! Translation of REST order and wallet actions into program instructions.
//!
//! The translator validates a request against the current [`Snapshot`],
//! converts decimals into native units and builds the instruction(s) for the
//! action. Nothing here talks to the ledger; a validation failure never
//! reaches it.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use solana_instruction::Instruction;
use thiserror::Error;

use crate::network::ProgramKeys;
use crate::program::constants::DEFAULT_MATCH_LIMIT;
use crate::program::instructions::{
    build_cancel_perp_order_ix, build_deposit_ix, build_place_perp_order_ix, build_withdraw_ix,
};
use crate::program::pda::get_associated_token_address;
use crate::program::types::{
    CancelTarget, DepositParams, MarginAccounts, OrderType, PlacePerpOrderParams, Side,
    WithdrawParams,
};
use crate::shared::scaling::{to_native, ScalingError};
use crate::snapshot::model::{Asset, Market, OpenOrder, Snapshot};

/// Request validation and translation errors
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum OrderError {
    #[error("Missing parameter {0}")]
    MissingField(&'static str),

    #[error("Invalid {field}: {reason}")]
    InvalidField { field: &'static str, reason: String },

    #[error("No such market: {0}")]
    UnknownMarket(String),

    #[error("No such coin: {0}")]
    UnknownCoin(String),

    #[error("Order not found: {0}")]
    UnknownOrder(String),

    #[error("Unsupported order type: {0}")]
    Unsupported(String),

    #[error(transparent)]
    Scaling(#[from] ScalingError),
}

pub type OrderResult<T> = Result<T, OrderError>;

// ============================================================================
// Order type selection
// ============================================================================

/// Behaviour flags of a REST order
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct OrderFlags {
    pub reduce_only: bool,
    pub ioc: bool,
    pub post_only: bool,
}

impl OrderFlags {
    /// The single order type a flag combination maps to.
    ///
    /// | ioc | reduceOnly | postOnly | type            |
    /// |-----|------------|----------|-----------------|
    /// | yes | yes        | any      | reduceOnlyIoc   |
    /// | yes | no         | any      | immediateOrCancel |
    /// | no  | yes        | any      | reduceOnlyLimit |
    /// | no  | no         | yes      | postOnly        |
    /// | no  | no         | no       | limit           |
    ///
    /// `postOnly` with `reduceOnly` rests as reduce-only; the program has no
    /// variant carrying both.
    pub fn order_type(&self) -> OrderType {
        match (self.ioc, self.reduce_only, self.post_only) {
            (true, true, _) => OrderType::ReduceOnlyIoc,
            (true, false, _) => OrderType::ImmediateOrCancel,
            (false, true, _) => OrderType::ReduceOnlyLimit,
            (false, false, true) => OrderType::PostOnly,
            (false, false, false) => OrderType::Limit,
        }
    }

    /// Flags an order type actually carries.
    pub fn of(order_type: OrderType) -> Self {
        Self {
            reduce_only: order_type.is_reduce_only(),
            ioc: order_type.is_ioc(),
            post_only: order_type.is_post_only(),
        }
    }
}

/// REST `type` of a plain order
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderKind {
    #[default]
    Limit,
    /// Immediate-or-cancel at a protective limit price
    Market,
}

impl OrderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderKind::Limit => "limit",
            OrderKind::Market => "market",
        }
    }
}

// ============================================================================
// Requests and translated actions
// ============================================================================

/// Normalized order placement request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderRequest {
    pub market: String,
    pub side: Side,
    pub price: Option<Decimal>,
    pub trigger_price: Option<Decimal>,
    pub size: Decimal,
    pub kind: OrderKind,
    pub flags: OrderFlags,
    pub client_id: Option<u64>,
}

/// Which resting order a modify or cancel refers to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderRef {
    Id(u128),
    ClientId(u64),
}

impl std::fmt::Display for OrderRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderRef::Id(id) => write!(f, "{id}"),
            OrderRef::ClientId(id) => write!(f, "client id {id}"),
        }
    }
}

/// New price and/or size for a resting order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModifyRequest {
    pub price: Option<Decimal>,
    pub size: Option<Decimal>,
    pub client_id: Option<u64>,
}

/// A placement ready to submit
#[derive(Debug, Clone)]
pub struct PlaceOrder {
    pub market: String,
    pub side: Side,
    pub price: Decimal,
    pub size: Decimal,
    pub kind: OrderKind,
    pub order_type: OrderType,
    pub client_id: Option<u64>,
    pub size_decimals: u8,
    pub instruction: Instruction,
}

/// A cancel ready to submit
#[derive(Debug, Clone)]
pub struct CancelOrder {
    pub market: String,
    pub order_id: Option<u128>,
    pub client_id: Option<u64>,
    pub instruction: Instruction,
}

/// Cancel then place, submitted as one transaction
#[derive(Debug, Clone)]
pub struct ModifyOrder {
    pub cancel: CancelOrder,
    pub place: PlaceOrder,
}

impl ModifyOrder {
    /// Cancel first, then the replacement.
    pub fn instructions(&self) -> Vec<Instruction> {
        vec![self.cancel.instruction.clone(), self.place.instruction.clone()]
    }
}

/// Direction of a collateral transfer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferKind {
    Deposit,
    Withdrawal,
}

/// Deposit or withdrawal ready to submit
#[derive(Debug, Clone)]
pub struct Transfer {
    pub kind: TransferKind,
    pub coin: String,
    pub size: Decimal,
    pub decimals: u8,
    pub collateral_index: usize,
    pub instruction: Instruction,
}

// ============================================================================
// Translator
// ============================================================================

/// Builds instructions for one account against one snapshot
#[derive(Debug, Clone, Copy)]
pub struct Translator<'a> {
    snapshot: &'a Snapshot,
    accounts: &'a MarginAccounts,
    keys: &'a ProgramKeys,
}

impl<'a> Translator<'a> {
    pub fn new(snapshot: &'a Snapshot, accounts: &'a MarginAccounts, keys: &'a ProgramKeys) -> Self {
        Self {
            snapshot,
            accounts,
            keys,
        }
    }

    fn market(&self, symbol: &str) -> OrderResult<&'a Market> {
        self.snapshot
            .market(symbol)
            .ok_or_else(|| OrderError::UnknownMarket(symbol.to_string()))
    }

    fn asset(&self, symbol: &str) -> OrderResult<&'a Asset> {
        self.snapshot
            .asset(symbol)
            .ok_or_else(|| OrderError::UnknownCoin(symbol.to_string()))
    }

    /// Resting order by id or client id.
    pub fn find_order(&self, order: &OrderRef) -> OrderResult<&'a OpenOrder> {
        match order {
            OrderRef::Id(id) => self.snapshot.open_order(*id),
            OrderRef::ClientId(id) => self.snapshot.open_order_by_client_id(*id),
        }
        .ok_or_else(|| OrderError::UnknownOrder(order.to_string()))
    }

    fn build_place(
        &self,
        market: &Market,
        side: Side,
        price: Decimal,
        size: Decimal,
        order_type: OrderType,
        client_id: Option<u64>,
    ) -> OrderResult<Instruction> {
        let params = PlacePerpOrderParams {
            is_long: side.is_long(),
            limit_price: to_native("price", price, market.price_decimals as u32)?,
            max_base_quantity: to_native("size", size, market.size_decimals as u32)?,
            max_quote_quantity: u64::MAX,
            order_type,
            limit: DEFAULT_MATCH_LIMIT,
            client_id: client_id.unwrap_or(0),
        };
        Ok(build_place_perp_order_ix(
            self.accounts,
            &market.dex_accounts(self.keys.dex_program),
            &params,
            &self.keys.program_id,
        ))
    }

    /// Translate an order placement.
    pub fn place(&self, request: &OrderRequest) -> OrderResult<PlaceOrder> {
        let market = self.market(&request.market)?;
        let price = match (request.price, request.trigger_price) {
            (Some(price), _) => price,
            (None, Some(_)) => {
                return Err(OrderError::Unsupported(
                    "trigger orders are not supported".to_string(),
                ))
            }
            (None, None) => return Err(OrderError::MissingField("price")),
        };
        if request.client_id == Some(0) {
            return Err(OrderError::InvalidField {
                field: "clientId",
                reason: "must be non-zero".to_string(),
            });
        }

        let mut flags = request.flags;
        if request.kind == OrderKind::Market {
            flags.ioc = true;
        }
        let order_type = flags.order_type();
        let instruction = self.build_place(market, request.side, price, request.size, order_type, request.client_id)?;

        Ok(PlaceOrder {
            market: market.symbol.clone(),
            side: request.side,
            price,
            size: request.size,
            kind: request.kind,
            order_type,
            client_id: request.client_id,
            size_decimals: market.size_decimals,
            instruction,
        })
    }

    fn build_cancel(&self, market: &Market, target: CancelTarget) -> Instruction {
        build_cancel_perp_order_ix(
            self.accounts,
            &market.dex_accounts(self.keys.dex_program),
            target,
            &self.keys.program_id,
        )
    }

    fn cancel_resting(&self, order: &OpenOrder) -> OrderResult<CancelOrder> {
        let market = self.market(&order.market)?;
        let target = CancelTarget::OrderId {
            order_id: order.order_id,
            is_long: order.side.is_long(),
        };
        Ok(CancelOrder {
            market: market.symbol.clone(),
            order_id: Some(order.order_id),
            client_id: order.client_id,
            instruction: self.build_cancel(market, target),
        })
    }

    /// Cancel a resting order the snapshot knows about.
    pub fn cancel(&self, order: &OrderRef) -> OrderResult<CancelOrder> {
        let resting = self.find_order(order)?;
        self.cancel_resting(resting)
    }

    /// Cancel by client id on a named market, whether or not the snapshot
    /// has seen the order yet.
    pub fn cancel_by_client_id(&self, market: &str, client_id: u64) -> OrderResult<CancelOrder> {
        let market = self.market(market)?;
        Ok(CancelOrder {
            market: market.symbol.clone(),
            order_id: self
                .snapshot
                .open_order_by_client_id(client_id)
                .map(|o| o.order_id),
            client_id: Some(client_id),
            instruction: self.build_cancel(market, CancelTarget::ClientId(client_id)),
        })
    }

    /// One cancel per resting order, optionally limited to one market.
    pub fn cancel_all(&self, market: Option<&str>) -> OrderResult<Vec<CancelOrder>> {
        if let Some(symbol) = market {
            self.market(symbol)?;
        }
        self.snapshot
            .open_orders(market)
            .map(|order| self.cancel_resting(order))
            .collect()
    }

    /// Replace a resting order's price and/or size.
    pub fn modify(&self, order: &OrderRef, request: &ModifyRequest) -> OrderResult<ModifyOrder> {
        if request.price.is_none() && request.size.is_none() {
            return Err(OrderError::MissingField("price or size"));
        }
        let resting = self.find_order(order)?;
        let market = self.market(&resting.market)?;
        let cancel = self.cancel_resting(resting)?;

        let price = request.price.unwrap_or(resting.price);
        let size = request.size.unwrap_or(resting.size);
        let client_id = request.client_id.or(resting.client_id);
        let instruction = self.build_place(market, resting.side, price, size, OrderType::Limit, client_id)?;

        Ok(ModifyOrder {
            cancel,
            place: PlaceOrder {
                market: market.symbol.clone(),
                side: resting.side,
                price,
                size,
                kind: OrderKind::Limit,
                order_type: OrderType::Limit,
                client_id,
                size_decimals: market.size_decimals,
                instruction,
            },
        })
    }

    fn transfer(&self, kind: TransferKind, coin: &str, size: Decimal) -> OrderResult<Transfer> {
        let asset = self.asset(coin)?;
        let amount = to_native("size", size, asset.decimals as u32)?;
        let token_account = get_associated_token_address(&self.accounts.authority, &asset.mint);
        let instruction = match kind {
            TransferKind::Deposit => build_deposit_ix(
                self.accounts,
                &DepositParams {
                    token_account,
                    vault: asset.vault,
                    repay_only: false,
                    amount,
                },
                &self.keys.program_id,
            ),
            TransferKind::Withdrawal => build_withdraw_ix(
                self.accounts,
                &WithdrawParams {
                    token_account,
                    vault: asset.vault,
                    allow_borrow: false,
                    amount,
                },
                &self.keys.program_id,
            ),
        };
        Ok(Transfer {
            kind,
            coin: asset.symbol.clone(),
            size,
            decimals: asset.decimals,
            collateral_index: asset.index,
            instruction,
        })
    }

    /// Deposit from the authority's token account.
    pub fn deposit(&self, coin: &str, size: Decimal) -> OrderResult<Transfer> {
        self.transfer(TransferKind::Deposit, coin, size)
    }

    /// Withdraw to the authority's token account without borrowing.
    pub fn withdraw(&self, coin: &str, size: Decimal) -> OrderResult<Transfer> {
        self.transfer(TransferKind::Withdrawal, coin, size)
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;
    use crate::snapshot::model::fixtures::account_set;
    use rust_decimal_macros::dec;

    /// Order type byte of a built place instruction.
    fn order_type_byte(ix: &Instruction) -> u8 {
        ix.data[33]
    }

    #[test]
    fn test_order_type_decision_table() {
        let cases = [
            // (ioc, reduce_only, post_only) -> type
            ((false, false, false), OrderType::Limit),
            ((false, false, true), OrderType::PostOnly),
            ((false, true, false), OrderType::ReduceOnlyLimit),
            ((false, true, true), OrderType::ReduceOnlyLimit),
            ((true, false, false), OrderType::ImmediateOrCancel),
            ((true, false, true), OrderType::ImmediateOrCancel),
            ((true, true, false), OrderType::ReduceOnlyIoc),
            ((true, true, true), OrderType::ReduceOnlyIoc),
        ];
        for ((ioc, reduce_only, post_only), expected) in cases {
            let flags = OrderFlags {
                reduce_only,
                ioc,
                post_only,
            };
            assert_eq!(flags.order_type(), expected, "{flags:?}");
        }
    }

    #[test]
    fn test_place_xrp_sell() {
        let snapshot = account_set().to_snapshot(1);
        let (accounts, keys) = (margin_accounts(), program_keys());
        let translator = Translator::new(&snapshot, &accounts, &keys);

        let place = translator.place(&xrp_sell()).unwrap();
        assert_eq!(place.side, Side::Sell);
        assert_eq!(place.order_type, OrderType::Limit);
        assert_eq!(place.instruction.program_id, keys.program_id);

        let data = &place.instruction.data;
        assert_eq!(data[8], 0, "is_long");
        assert_eq!(u64::from_le_bytes(data[9..17].try_into().unwrap()), 306_525);
        assert_eq!(u64::from_le_bytes(data[17..25].try_into().unwrap()), 31_431);
        assert_eq!(u64::from_le_bytes(data[25..33].try_into().unwrap()), u64::MAX);
        assert_eq!(order_type_byte(&place.instruction), OrderType::Limit as u8);
    }

    #[test]
    fn test_market_order_forces_ioc() {
        let snapshot = account_set().to_snapshot(1);
        let (accounts, keys) = (margin_accounts(), program_keys());
        let translator = Translator::new(&snapshot, &accounts, &keys);

        let mut request = xrp_sell();
        request.kind = OrderKind::Market;
        request.flags.reduce_only = true;
        let place = translator.place(&request).unwrap();
        assert_eq!(place.order_type, OrderType::ReduceOnlyIoc);
        assert_eq!(order_type_byte(&place.instruction), OrderType::ReduceOnlyIoc as u8);
    }

    #[test]
    fn test_place_validation() {
        let snapshot = account_set().to_snapshot(1);
        let (accounts, keys) = (margin_accounts(), program_keys());
        let translator = Translator::new(&snapshot, &accounts, &keys);

        let mut request = xrp_sell();
        request.market = "DOGE-PERP".to_string();
        assert_eq!(
            translator.place(&request).unwrap_err(),
            OrderError::UnknownMarket("DOGE-PERP".to_string())
        );

        let mut request = xrp_sell();
        request.price = None;
        assert_eq!(translator.place(&request).unwrap_err(), OrderError::MissingField("price"));

        request.trigger_price = Some(dec!(0.3));
        assert!(matches!(translator.place(&request), Err(OrderError::Unsupported(_))));

        let mut request = xrp_sell();
        request.size = dec!(0.5);
        assert!(matches!(
            translator.place(&request),
            Err(OrderError::Scaling(ScalingError::TooPrecise { field: "size", .. }))
        ));

        let mut request = xrp_sell();
        request.size = dec!(-1);
        assert!(matches!(
            translator.place(&request),
            Err(OrderError::Scaling(ScalingError::NotPositive { .. }))
        ));
    }

    #[test]
    fn test_modify_is_cancel_then_place() {
        let snapshot = account_set().to_snapshot(1);
        let (accounts, keys) = (margin_accounts(), program_keys());
        let translator = Translator::new(&snapshot, &accounts, &keys);
        let resting = snapshot.open_order_by_client_id(42).unwrap().clone();

        let modify = translator
            .modify(
                &OrderRef::Id(resting.order_id),
                &ModifyRequest {
                    price: Some(dec!(0.3051)),
                    ..Default::default()
                },
            )
            .unwrap();
        let instructions = modify.instructions();
        assert_eq!(instructions.len(), 2);
        assert_eq!(instructions[0].data[..8], crate::program::constants::instruction::CANCEL_PERP_ORDER);
        assert_eq!(instructions[1].data[..8], crate::program::constants::instruction::PLACE_PERP_ORDER);
        assert_eq!(modify.place.price, dec!(0.3051));
        assert_eq!(modify.place.size, resting.size);
        assert_eq!(modify.place.side, resting.side);
        assert_eq!(modify.place.client_id, Some(42));
    }

    #[test]
    fn test_modify_requires_a_change() {
        let snapshot = account_set().to_snapshot(1);
        let (accounts, keys) = (margin_accounts(), program_keys());
        let translator = Translator::new(&snapshot, &accounts, &keys);
        assert_eq!(
            translator.modify(&OrderRef::ClientId(42), &ModifyRequest::default()).unwrap_err(),
            OrderError::MissingField("price or size")
        );
        assert!(matches!(
            translator.modify(
                &OrderRef::Id(7),
                &ModifyRequest {
                    size: Some(dec!(1)),
                    ..Default::default()
                }
            ),
            Err(OrderError::UnknownOrder(_))
        ));
    }

    #[test]
    fn test_cancel_all_one_per_order() {
        let snapshot = account_set().to_snapshot(1);
        let (accounts, keys) = (margin_accounts(), program_keys());
        let translator = Translator::new(&snapshot, &accounts, &keys);

        let cancels = translator.cancel_all(None).unwrap();
        assert_eq!(cancels.len(), snapshot.account.open_orders.len());
        assert!(translator.cancel_all(Some("XRP-PERP")).is_ok());
        assert!(matches!(
            translator.cancel_all(Some("BTC-PERP")),
            Err(OrderError::UnknownMarket(_))
        ));
    }

    #[test]
    fn test_cancel_by_client_id_unknown_to_snapshot() {
        let snapshot = account_set().to_snapshot(1);
        let (accounts, keys) = (margin_accounts(), program_keys());
        let translator = Translator::new(&snapshot, &accounts, &keys);

        let cancel = translator.cancel_by_client_id("XRP-PERP", 999).unwrap();
        assert_eq!(cancel.order_id, None);
        assert_eq!(cancel.client_id, Some(999));
    }

    #[test]
    fn test_withdraw_native_amount() {
        let snapshot = account_set().to_snapshot(1);
        let (accounts, keys) = (margin_accounts(), program_keys());
        let translator = Translator::new(&snapshot, &accounts, &keys);

        let withdraw = translator.withdraw("USDT", dec!(20.2)).unwrap();
        assert_eq!(withdraw.kind, TransferKind::Withdrawal);
        assert_eq!(withdraw.collateral_index, 1);
        let data = &withdraw.instruction.data;
        assert_eq!(data[8], 0, "allow_borrow");
        assert_eq!(u64::from_le_bytes(data[9..17].try_into().unwrap()), 20_200_000);

        assert_eq!(
            translator.deposit("DOGE", dec!(1)).unwrap_err(),
            OrderError::UnknownCoin("DOGE".to_string())
        );
    }
}
