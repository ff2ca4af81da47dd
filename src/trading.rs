//! Order and wallet actions: translate, submit, confirm, read the outcome.
//!
//! Every call takes the [`Session`] it acts for. The authoritative outcome of
//! an action (filled size, amount moved) comes from the confirmed
//! transaction's log events, never from the request.

use futures::future::join_all;
use rust_decimal::Decimal;
use solana_signature::Signature;
use thiserror::Error;

use crate::orders::{
    CancelOrder, ModifyOrder, ModifyRequest, OrderError, OrderRef, OrderRequest, PlaceOrder,
    Transfer, TransferKind,
};
use crate::program::constants::QUOTE_DECIMALS;
use crate::program::error::SdkError;
use crate::program::events::{DepositLog, RealizedPnlLog, WithdrawLog};
use crate::session::Session;
use crate::shared::scaling::from_native;
use crate::snapshot::SnapshotError;

/// Errors of a trading action, by the layer that raised them
#[derive(Debug, Error)]
pub enum TradingError {
    /// Refused locally before any ledger call
    #[error(transparent)]
    Order(#[from] OrderError),

    #[error(transparent)]
    Snapshot(#[from] SnapshotError),

    #[error(transparent)]
    Ledger(#[from] SdkError),
}

impl TradingError {
    /// Outcome unknown; the action may still land.
    pub fn is_timeout(&self) -> bool {
        matches!(self, TradingError::Ledger(SdkError::ConfirmationTimeout { .. }))
    }

    pub fn is_retryable(&self) -> bool {
        match self {
            TradingError::Ledger(e) => e.is_retryable(),
            TradingError::Snapshot(SnapshotError::NotSubscribed) => true,
            _ => false,
        }
    }
}

pub type TradingResult<T> = Result<T, TradingError>;

/// Confirmed placement and its fill
#[derive(Debug, Clone)]
pub struct PlacedOrder {
    pub order: PlaceOrder,
    pub signature: Signature,
    pub filled_size: Decimal,
    /// Quote over base of the matched part, `None` when nothing filled
    pub avg_fill_price: Option<Decimal>,
    pub realized_pnl: Decimal,
}

/// Confirmed cancel
#[derive(Debug, Clone)]
pub struct CancelledOrder {
    pub market: String,
    pub order_id: Option<u128>,
    pub client_id: Option<u64>,
    pub signature: Signature,
}

/// Cancel that did not confirm
#[derive(Debug)]
pub struct CancelFailure {
    pub market: String,
    pub order_id: Option<u128>,
    pub client_id: Option<u64>,
    pub error: TradingError,
}

/// Per-order outcome of a cancel-all
#[derive(Debug, Default)]
pub struct CancelAllReport {
    pub succeeded: Vec<CancelledOrder>,
    pub failed: Vec<CancelFailure>,
}

impl CancelAllReport {
    pub fn total(&self) -> usize {
        self.succeeded.len() + self.failed.len()
    }

    /// At least one order was targeted and none were cancelled.
    pub fn all_failed(&self) -> bool {
        self.succeeded.is_empty() && !self.failed.is_empty()
    }

    /// Every failure may succeed on retry: timeouts and an unreachable node.
    pub fn only_retryable(&self) -> bool {
        self.failed.iter().all(|f| f.error.is_retryable())
    }
}

/// Confirmed deposit or withdrawal
#[derive(Debug, Clone)]
pub struct CompletedTransfer {
    pub kind: TransferKind,
    pub coin: String,
    /// Amount the program reports having moved
    pub size: Decimal,
    pub signature: Signature,
}

fn fill_from_log(order: &PlaceOrder, log: &RealizedPnlLog) -> (Decimal, Option<Decimal>, Decimal) {
    let filled = from_native(log.base_filled() as i128, order.size_decimals as u32);
    let quote = from_native(log.quote_filled() as i128, QUOTE_DECIMALS);
    let avg = (!filled.is_zero()).then(|| quote / filled);
    (filled, avg, from_native(log.pnl as i128, QUOTE_DECIMALS))
}

async fn submit_placement(
    session: &Session,
    order: PlaceOrder,
    instructions: &[solana_instruction::Instruction],
) -> TradingResult<PlacedOrder> {
    let confirmed = session.execute(instructions).await?;
    let signature = confirmed.signature.to_string();
    let log = confirmed.events().expect::<RealizedPnlLog>(&signature)?;
    let (filled_size, avg_fill_price, realized_pnl) = fill_from_log(&order, &log);
    tracing::info!(
        %signature,
        market = %order.market,
        side = order.side.as_str(),
        size = %order.size,
        filled = %filled_size,
        "Order placed"
    );
    Ok(PlacedOrder {
        order,
        signature: confirmed.signature,
        filled_size,
        avg_fill_price,
        realized_pnl,
    })
}

/// Place an order.
pub async fn place_order(session: &Session, request: &OrderRequest) -> TradingResult<PlacedOrder> {
    let snapshot = session.snapshot()?;
    let order = session.translator(&snapshot).place(request)?;
    let instructions = [order.instruction.clone()];
    submit_placement(session, order, &instructions).await
}

/// Replace a resting order. Cancel and place land together or not at all.
pub async fn modify_order(
    session: &Session,
    order: &OrderRef,
    request: &ModifyRequest,
) -> TradingResult<PlacedOrder> {
    let snapshot = session.snapshot()?;
    let ModifyOrder { cancel, place } = session.translator(&snapshot).modify(order, request)?;
    let instructions = [cancel.instruction, place.instruction.clone()];
    submit_placement(session, place, &instructions).await
}

async fn submit_cancel(session: &Session, cancel: CancelOrder) -> Result<CancelledOrder, CancelFailure> {
    match session.execute(std::slice::from_ref(&cancel.instruction)).await {
        Ok(confirmed) => Ok(CancelledOrder {
            market: cancel.market,
            order_id: cancel.order_id,
            client_id: cancel.client_id,
            signature: confirmed.signature,
        }),
        Err(e) => Err(CancelFailure {
            market: cancel.market,
            order_id: cancel.order_id,
            client_id: cancel.client_id,
            error: e.into(),
        }),
    }
}

/// Cancel one resting order by id or client id.
pub async fn cancel_order(session: &Session, order: &OrderRef) -> TradingResult<CancelledOrder> {
    let snapshot = session.snapshot()?;
    let cancel = session.translator(&snapshot).cancel(order)?;
    submit_cancel(session, cancel).await.map_err(|f| f.error)
}

/// Cancel by client id on a market.
pub async fn cancel_by_client_id(
    session: &Session,
    market: &str,
    client_id: u64,
) -> TradingResult<CancelledOrder> {
    let snapshot = session.snapshot()?;
    let cancel = session.translator(&snapshot).cancel_by_client_id(market, client_id)?;
    submit_cancel(session, cancel).await.map_err(|f| f.error)
}

/// Cancel every resting order, one transaction per order, all in flight at
/// once. Failures are collected per order.
pub async fn cancel_all(session: &Session, market: Option<&str>) -> TradingResult<CancelAllReport> {
    let snapshot = session.snapshot()?;
    let cancels = session.translator(&snapshot).cancel_all(market)?;
    tracing::info!(orders = cancels.len(), market = ?market, "Cancelling all orders");

    let results = join_all(cancels.into_iter().map(|c| submit_cancel(session, c))).await;
    let mut report = CancelAllReport::default();
    for result in results {
        match result {
            Ok(cancelled) => report.succeeded.push(cancelled),
            Err(failure) => {
                tracing::warn!(
                    order_id = ?failure.order_id,
                    error = %failure.error,
                    "Cancel failed"
                );
                report.failed.push(failure);
            }
        }
    }
    Ok(report)
}

async fn submit_transfer(session: &Session, transfer: Transfer) -> TradingResult<CompletedTransfer> {
    let confirmed = session.execute(std::slice::from_ref(&transfer.instruction)).await?;
    let signature = confirmed.signature.to_string();
    let native = match transfer.kind {
        TransferKind::Deposit => confirmed.events().expect::<DepositLog>(&signature)?.deposit_amount,
        TransferKind::Withdrawal => confirmed.events().expect::<WithdrawLog>(&signature)?.withdraw_amount,
    };
    let size = from_native(native as i128, transfer.decimals as u32);
    tracing::info!(%signature, coin = %transfer.coin, %size, kind = ?transfer.kind, "Transfer confirmed");
    Ok(CompletedTransfer {
        kind: transfer.kind,
        coin: transfer.coin,
        size,
        signature: confirmed.signature,
    })
}

/// Deposit collateral from the wallet's token account.
pub async fn deposit(session: &Session, coin: &str, size: Decimal) -> TradingResult<CompletedTransfer> {
    let snapshot = session.snapshot()?;
    let transfer = session.translator(&snapshot).deposit(coin, size)?;
    submit_transfer(session, transfer).await
}

/// Withdraw collateral to the wallet's token account.
pub async fn withdraw(session: &Session, coin: &str, size: Decimal) -> TradingResult<CompletedTransfer> {
    let snapshot = session.snapshot()?;
    let transfer = session.translator(&snapshot).withdraw(coin, size)?;
    submit_transfer(session, transfer).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orders::fixtures::xrp_sell;
    use crate::program::constants::instruction;
    use crate::program::events::{realized_pnl_log_line, withdraw_log_line};
    use crate::program::mock::MockOutcome;
    use crate::session::fixtures::session;
    use rust_decimal_macros::dec;
    use solana_pubkey::Pubkey;

    fn pnl_log(is_long: bool, qty_paid: i64, qty_received: i64) -> String {
        realized_pnl_log_line(&RealizedPnlLog {
            market_key: Pubkey::new_unique(),
            margin: Pubkey::new_unique(),
            is_long,
            pnl: 0,
            qty_paid,
            qty_received,
        })
    }

    #[tokio::test]
    async fn test_place_reads_fill_from_log() {
        let (session, _) = session(|_| MockOutcome::Land {
            logs: vec![
                "Program log: Instruction: PlacePerpOrder".to_string(),
                pnl_log(false, 10, 3_065_250),
            ],
        });
        let placed = place_order(&session, &xrp_sell()).await.unwrap();
        assert_eq!(placed.filled_size, dec!(10));
        assert_eq!(placed.avg_fill_price, Some(dec!(0.306525)));
    }

    #[tokio::test]
    async fn test_place_without_event_is_missing_event() {
        let (session, _) = session(|_| MockOutcome::Land { logs: vec![] });
        let err = place_order(&session, &xrp_sell()).await.unwrap_err();
        assert!(matches!(
            err,
            TradingError::Ledger(SdkError::MissingExpectedEvent { expected: "RealizedPnlLog", .. })
        ));
    }

    #[tokio::test]
    async fn test_validation_never_reaches_ledger() {
        let (session, ledger) = session(|_| MockOutcome::Land { logs: vec![] });
        let mut request = xrp_sell();
        request.market = "NOPE-PERP".to_string();
        assert!(matches!(
            place_order(&session, &request).await,
            Err(TradingError::Order(OrderError::UnknownMarket(_)))
        ));
        assert!(ledger.submitted().is_empty());
    }

    #[tokio::test]
    async fn test_modify_submits_one_transaction() {
        let (session, ledger) = session(|_| MockOutcome::Land {
            logs: vec![pnl_log(true, 0, 0)],
        });
        let placed = modify_order(
            &session,
            &OrderRef::ClientId(42),
            &ModifyRequest {
                size: Some(dec!(400)),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(placed.filled_size, Decimal::ZERO);
        assert_eq!(placed.avg_fill_price, None);

        let submitted = ledger.submitted();
        assert_eq!(submitted.len(), 1);
        let ixs = &submitted[0].message.instructions;
        assert_eq!(ixs.len(), 2);
        assert_eq!(ixs[0].data[..8], instruction::CANCEL_PERP_ORDER);
        assert_eq!(ixs[1].data[..8], instruction::PLACE_PERP_ORDER);
    }

    #[tokio::test]
    async fn test_failed_modify_is_rejection() {
        let (session, _) = session(|_| MockOutcome::LandFailed("order not found".to_string()));
        let err = modify_order(
            &session,
            &OrderRef::ClientId(42),
            &ModifyRequest {
                price: Some(dec!(0.31)),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, TradingError::Ledger(SdkError::Rejected(_))));
        // Snapshot untouched: the original order is still listed
        assert!(session.snapshot().unwrap().open_order_by_client_id(42).is_some());
    }

    #[tokio::test]
    async fn test_withdraw_reports_logged_amount() {
        let (session, _) = session(|_| MockOutcome::Land {
            logs: vec![withdraw_log_line(&WithdrawLog {
                col_index: 1,
                withdraw_amount: 20_200_000,
                margin_key: Pubkey::new_unique(),
            })],
        });
        let done = withdraw(&session, "USDT", dec!(20.2)).await.unwrap();
        assert_eq!(done.size, dec!(20.2));
        assert_eq!(done.coin, "USDT");
    }

    #[tokio::test]
    async fn test_withdraw_timeout_is_retryable() {
        let (session, _) = session(|_| MockOutcome::NeverConfirm);
        let err = withdraw(&session, "USDT", dec!(20.2)).await.unwrap_err();
        assert!(err.is_timeout());
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn test_cancel_all_own_orders() {
        let (session, ledger) = session(|_| MockOutcome::Land { logs: vec![] });
        let report = cancel_all(&session, Some("XRP-PERP")).await.unwrap();
        assert_eq!(report.total(), 1);
        assert!(!report.all_failed());
        assert_eq!(ledger.submitted().len(), 1);
    }

    #[test]
    fn test_report_status_rules() {
        let failure = |error: TradingError| CancelFailure {
            market: "XRP-PERP".to_string(),
            order_id: None,
            client_id: None,
            error,
        };
        let report = CancelAllReport {
            succeeded: vec![],
            failed: vec![failure(TradingError::Ledger(SdkError::ConfirmationTimeout {
                signature: "sig".to_string(),
                attempts: 3,
            }))],
        };
        assert!(report.all_failed());
        assert!(report.only_retryable());

        let mixed = CancelAllReport {
            succeeded: vec![],
            failed: vec![failure(TradingError::Ledger(SdkError::Rejected("no".to_string())))],
        };
        assert!(!mixed.only_retryable());

        let unreachable = CancelAllReport {
            succeeded: vec![],
            failed: vec![failure(TradingError::Ledger(SdkError::Rpc(
                std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "down").into(),
            )))],
        };
        assert!(unreachable.only_retryable());
        assert!(!CancelAllReport::default().all_failed());
    }
}
