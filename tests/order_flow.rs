//! End-to-end trading flows against a bootstrapped session and a scripted ledger.
//!
//! Run: cargo test --test order_flow

mod common;

use chrono::Utc;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use solana_pubkey::Pubkey;
use tokio_test::{assert_err, assert_ok};
use zo_gateway::api::PlaceOrderRequest;
use zo_gateway::assembler;
use zo_gateway::orders::{ModifyRequest, OrderError, OrderRef};
use zo_gateway::program::constants::instruction;
use zo_gateway::program::events::{deposit_log_line, realized_pnl_log_line, withdraw_log_line};
use zo_gateway::program::{DepositLog, MockOutcome, RealizedPnlLog, SdkError, WithdrawLog};
use zo_gateway::server::handlers::order_request;
use zo_gateway::trading::{self, TradingError};

use common::{bootstrap, cancels_ask, Scenario, ASK_CLIENT_ID, OWN_CLIENT_ID};

fn short_fill(base: i64, quote: i64) -> String {
    realized_pnl_log_line(&RealizedPnlLog {
        market_key: Pubkey::new_unique(),
        margin: Pubkey::new_unique(),
        is_long: false,
        pnl: 0,
        qty_paid: base,
        qty_received: quote,
    })
}

fn xrp_sell_body() -> PlaceOrderRequest {
    serde_json::from_str(
        r#"{"market":"XRP-PERP","side":"sell","price":0.306525,"type":"limit","size":31431.0,"reduceOnly":false,"ioc":false,"postOnly":false,"clientId":null}"#,
    )
    .unwrap()
}

// ============================================================================
// Placement
// ============================================================================

#[tokio::test]
async fn test_resting_sell_on_flat_account() {
    let (session, ledger) = bootstrap(Scenario::flat(), |_| MockOutcome::Land {
        logs: vec![short_fill(0, 0)],
    })
    .await;
    let snapshot = session.snapshot().unwrap();
    assert!(snapshot.account.positions.iter().all(|p| p.size.is_zero()));
    assert!(snapshot.account.open_orders.is_empty());

    let request = order_request(xrp_sell_body()).unwrap();
    let placed = trading::place_order(&session, &request).await.unwrap();
    let view = assembler::placed_order(&placed, Utc::now());

    assert_eq!(view.market, "XRP-PERP");
    assert_eq!(view.filled_size, Decimal::ZERO);
    assert_eq!(view.remaining_size, dec!(31431));
    assert_eq!(view.status, "open");
    assert!(view.id.is_none());
    assert_eq!(view.txid.as_deref(), Some(placed.signature.to_string().as_str()));

    let json = serde_json::to_value(&view).unwrap();
    assert_eq!(json["side"], "sell");
    assert_eq!(json["type"], "limit");
    assert_eq!(json["price"], 0.306525);
    assert_eq!(json["avgFillPrice"], serde_json::Value::Null);

    let submitted = ledger.submitted();
    assert_eq!(submitted.len(), 1);
    assert_eq!(submitted[0].message.instructions[0].data[..8], instruction::PLACE_PERP_ORDER);
}

#[tokio::test]
async fn test_fully_filled_sell_is_closed() {
    let (session, _) = bootstrap(Scenario::default(), |_| MockOutcome::Land {
        logs: vec![
            "Program log: Instruction: PlacePerpOrder".to_string(),
            short_fill(31_431, 9_634_387_275),
        ],
    })
    .await;

    let request = order_request(xrp_sell_body()).unwrap();
    let placed = trading::place_order(&session, &request).await.unwrap();
    let view = assembler::placed_order(&placed, Utc::now());

    assert_eq!(view.filled_size, dec!(31431));
    assert_eq!(view.remaining_size, Decimal::ZERO);
    assert_eq!(view.avg_fill_price, Some(dec!(0.306525)));
    assert_eq!(view.status, "closed");
}

#[tokio::test]
async fn test_partial_fill_stays_open() {
    let (session, _) = bootstrap(Scenario::default(), |_| MockOutcome::Land {
        logs: vec![short_fill(1_431, 438_637_275)],
    })
    .await;

    let request = order_request(xrp_sell_body()).unwrap();
    let placed = trading::place_order(&session, &request).await.unwrap();
    let view = assembler::placed_order(&placed, Utc::now());

    assert_eq!(view.filled_size, dec!(1431));
    assert_eq!(view.remaining_size, dec!(30000));
    assert_eq!(view.status, "open");
}

#[tokio::test]
async fn test_rejected_placement_leaves_snapshot_alone() {
    let (session, _) = bootstrap(Scenario::default(), |_| {
        MockOutcome::Reject("insufficient collateral".to_string())
    })
    .await;
    let before = session.snapshot().unwrap();

    let request = order_request(xrp_sell_body()).unwrap();
    let err = trading::place_order(&session, &request).await.unwrap_err();
    assert!(matches!(err, TradingError::Ledger(SdkError::Rejected(ref m)) if m.contains("insufficient")));
    assert!(!err.is_retryable());
    assert_eq!(session.snapshot().unwrap().slot, before.slot);
}

#[tokio::test]
async fn test_unknown_market_is_validation_error() {
    let (session, ledger) = bootstrap(Scenario::default(), |_| MockOutcome::Land { logs: vec![] }).await;
    let mut body = xrp_sell_body();
    body.market = Some("DOGE-PERP".to_string());

    let request = order_request(body).unwrap();
    let err = trading::place_order(&session, &request).await.unwrap_err();
    assert!(matches!(err, TradingError::Order(OrderError::UnknownMarket(_))));
    assert!(ledger.submitted().is_empty());
}

// ============================================================================
// Modify and cancel
// ============================================================================

#[tokio::test]
async fn test_modify_is_one_atomic_transaction() {
    let (session, ledger) = bootstrap(Scenario::default(), |_| MockOutcome::Land {
        logs: vec![short_fill(0, 0)],
    })
    .await;

    let placed = trading::modify_order(
        &session,
        &OrderRef::ClientId(OWN_CLIENT_ID),
        &ModifyRequest {
            price: Some(dec!(0.304)),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    assert_eq!(placed.order.price, dec!(0.304));
    assert_eq!(placed.order.size, dec!(500));

    let submitted = ledger.submitted();
    assert_eq!(submitted.len(), 1);
    let ixs = &submitted[0].message.instructions;
    assert_eq!(ixs.len(), 2);
    assert_eq!(ixs[0].data[..8], instruction::CANCEL_PERP_ORDER);
    assert_eq!(ixs[1].data[..8], instruction::PLACE_PERP_ORDER);
}

#[tokio::test]
async fn test_cancel_unknown_order() {
    let (session, ledger) = bootstrap(Scenario::default(), |_| MockOutcome::Land { logs: vec![] }).await;
    let err = trading::cancel_order(&session, &OrderRef::ClientId(7)).await.unwrap_err();
    assert!(matches!(err, TradingError::Order(OrderError::UnknownOrder(_))));
    assert!(ledger.submitted().is_empty());
}

#[tokio::test]
async fn test_cancel_all_without_orders_is_empty() {
    let (session, ledger) = bootstrap(Scenario::flat(), |_| MockOutcome::Land {
        logs: vec![],
    })
    .await;
    let report = trading::cancel_all(&session, None).await.unwrap();
    assert_eq!(report.total(), 0);
    assert!(!report.all_failed());
    assert!(ledger.submitted().is_empty());
}

#[tokio::test]
async fn test_cancel_all_timeouts() {
    let (session, _) = bootstrap(Scenario::default(), |_| MockOutcome::NeverConfirm).await;
    let report = trading::cancel_all(&session, None).await.unwrap();
    assert!(report.all_failed());
    assert!(report.only_retryable());

    let view = assembler::cancel_all(&report);
    assert_eq!(view.failed.len(), 1);
    assert!(view.failed[0].retryable);
    assert_eq!(view.failed[0].client_id, Some(OWN_CLIENT_ID));
}

#[tokio::test]
async fn test_cancel_all_partial_failure() {
    let (session, ledger) = bootstrap(Scenario::two_orders(), |tx| {
        if cancels_ask(tx) {
            MockOutcome::Reject("order already filled".to_string())
        } else {
            MockOutcome::Land { logs: vec![] }
        }
    })
    .await;
    assert_eq!(session.snapshot().unwrap().account.open_orders.len(), 2);

    let report = trading::cancel_all(&session, Some("XRP-PERP")).await.unwrap();
    assert_eq!(report.total(), 2);
    assert!(!report.all_failed());
    assert!(!report.only_retryable());
    assert_eq!(report.succeeded.len(), 1);
    assert_eq!(report.succeeded[0].client_id, Some(OWN_CLIENT_ID));
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].client_id, Some(ASK_CLIENT_ID));
    assert!(matches!(report.failed[0].error, TradingError::Ledger(SdkError::Rejected(_))));
    assert_eq!(ledger.submitted().len(), 2);

    let view = assembler::cancel_all(&report);
    assert!(!view.failed[0].retryable);
    assert!(view.failed[0].error.contains("already filled"));
}

// ============================================================================
// Transfers
// ============================================================================

#[tokio::test]
async fn test_usdt_withdrawal_processed() {
    let (session, ledger) = bootstrap(Scenario::default(), |_| MockOutcome::Land {
        logs: vec![withdraw_log_line(&WithdrawLog {
            col_index: 1,
            withdraw_amount: 20_200_000,
            margin_key: Pubkey::new_unique(),
        })],
    })
    .await;

    let done = assert_ok!(trading::withdraw(&session, "USDT", dec!(20.2)).await);
    let view = assembler::transfer(&done, Utc::now());
    assert_eq!(view.coin, "USDT");
    assert_eq!(view.size, dec!(20.2));
    assert_eq!(view.status, "processed");
    assert_eq!(view.txid, done.signature.to_string());
    assert_eq!(ledger.submitted().len(), 1);
}

#[tokio::test]
async fn test_withdrawal_timeout_is_retryable() {
    let (session, ledger) = bootstrap(Scenario::default(), |_| MockOutcome::NeverConfirm).await;

    let err = assert_err!(trading::withdraw(&session, "USDT", dec!(20.2)).await);
    assert!(err.is_timeout());
    assert!(err.is_retryable());
    match err {
        TradingError::Ledger(SdkError::ConfirmationTimeout { signature, .. }) => {
            assert_eq!(signature, ledger.submitted()[0].signatures[0].to_string());
        }
        other => panic!("expected timeout, got {other:?}"),
    }
}

#[tokio::test]
async fn test_deposit_reports_logged_amount() {
    let (session, _) = bootstrap(Scenario::default(), |_| MockOutcome::Land {
        logs: vec![deposit_log_line(&DepositLog {
            col_index: 0,
            deposit_amount: 125_500_000,
            margin_key: Pubkey::new_unique(),
        })],
    })
    .await;

    let done = trading::deposit(&session, "USDC", dec!(125.5)).await.unwrap();
    assert_eq!(done.size, dec!(125.5));
}

#[tokio::test]
async fn test_withdraw_rejects_excess_precision() {
    let (session, ledger) = bootstrap(Scenario::default(), |_| MockOutcome::Land { logs: vec![] }).await;
    let err = trading::withdraw(&session, "USDT", dec!(0.0000001)).await.unwrap_err();
    assert!(matches!(err, TradingError::Order(_)));
    assert!(ledger.submitted().is_empty());
}
