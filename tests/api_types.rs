//! Wire shapes of request and response payloads.
//!
//! Run: cargo test --test api_types

use rust_decimal_macros::dec;
use serde_json::json;
use zo_gateway::api::{
    BookEntry, CancelAllInfo, CancelFailureInfo, Candle, CandleQuery, ErrorResponse, Fill,
    HistoryQuery, ModifyOrderRequest, OrderbookInfo, PlaceOrderRequest, Trade, TransferRequest,
};
use zo_gateway::orders::OrderKind;
use zo_gateway::program::Side;
use zo_gateway::shared::Resolution;

#[test]
fn test_market_order_request() {
    let body: PlaceOrderRequest = serde_json::from_value(json!({
        "market": "XRP-PERP",
        "side": "buy",
        "price": null,
        "type": "market",
        "size": 100.0
    }))
    .unwrap();
    assert_eq!(body.side, Some(Side::Buy));
    assert_eq!(body.kind, Some(OrderKind::Market));
    assert_eq!(body.price, None);
    assert_eq!(body.size, Some(dec!(100)));
    assert!(!body.ioc && !body.reduce_only && !body.post_only);
}

#[test]
fn test_unsupported_order_type_is_rejected() {
    let parsed = serde_json::from_value::<PlaceOrderRequest>(json!({
        "market": "XRP-PERP",
        "side": "sell",
        "type": "stop",
        "size": 1.0
    }));
    assert!(parsed.is_err());
}

#[test]
fn test_modify_and_transfer_bodies() {
    let modify: ModifyOrderRequest = serde_json::from_value(json!({"size": 31431.0})).unwrap();
    assert_eq!(modify.size, Some(dec!(31431)));
    assert_eq!(modify.price, None);

    let transfer: TransferRequest = serde_json::from_value(json!({"coin": "USDT", "size": 20.2})).unwrap();
    assert_eq!(transfer.coin.as_deref(), Some("USDT"));
    assert_eq!(transfer.size, Some(dec!(20.2)));
}

#[test]
fn test_decimal_fields_accept_numbers_and_strings() {
    let body: PlaceOrderRequest = serde_json::from_str(
        r#"{"market":"XRP-PERP","side":"sell","price":0.306525,"type":"limit","size":31431}"#,
    )
    .unwrap();
    assert_eq!(body.price, Some(dec!(0.306525)));
    assert_eq!(body.size, Some(dec!(31431)));

    let quoted: TransferRequest = serde_json::from_str(r#"{"coin":"USDC","size":"125.5"}"#).unwrap();
    assert_eq!(quoted.size, Some(dec!(125.5)));
}

#[test]
fn test_provider_bodies_with_float_fields() {
    let fill: Fill = serde_json::from_value(json!({
        "id": 9,
        "market": "XRP-PERP",
        "future": "XRP-PERP",
        "orderId": null,
        "price": 0.306525,
        "side": "sell",
        "size": 1431.0,
        "fee": 0.21,
        "feeRate": 0.0005,
        "liquidity": "taker",
        "time": "2023-11-14T22:13:20Z",
        "txid": null
    }))
    .unwrap();
    assert_eq!(fill.price, dec!(0.306525));
    assert_eq!(fill.size, dec!(1431));
    assert_eq!(fill.fee_rate, dec!(0.0005));

    let candle: Candle = serde_json::from_value(json!({
        "close": 0.3061,
        "high": 0.3072,
        "low": 0.3049,
        "open": 0.3055,
        "startTime": "2023-11-14T22:00:00Z",
        "volume": 125000.5
    }))
    .unwrap();
    assert_eq!(candle.high, dec!(0.3072));
    assert_eq!(candle.volume, dec!(125000.5));

    let trade: Trade = serde_json::from_value(json!({
        "id": 3,
        "liquidation": false,
        "price": 0.3055,
        "side": "buy",
        "size": 1250,
        "time": "2023-11-14T22:13:20Z"
    }))
    .unwrap();
    assert_eq!(trade.price, dec!(0.3055));
    assert_eq!(trade.size, dec!(1250));
}

#[test]
fn test_history_query_string() {
    let query: HistoryQuery =
        serde_urlencoded::from_str("future=XRP-PERP&start_time=1700000000&end_time=1700003600&limit=50").unwrap();
    assert_eq!(query.market_filter(), Some("XRP-PERP"));
    assert_eq!(query.limit, Some(50));

    let built = HistoryQuery::default().with_market("XRP-PERP").with_limit(10);
    assert_eq!(serde_urlencoded::to_string(&built).unwrap(), "market=XRP-PERP&limit=10");
}

#[test]
fn test_candle_resolution_in_seconds() {
    let query: CandleQuery = serde_urlencoded::from_str("resolution=3600").unwrap();
    assert_eq!(query.resolution, Resolution::OneHour);

    let default: CandleQuery = serde_urlencoded::from_str("").unwrap();
    assert_eq!(default.resolution, Resolution::OneMinute);

    assert!(serde_urlencoded::from_str::<CandleQuery>("resolution=61").is_err());
}

#[test]
fn test_orderbook_levels_are_pairs() {
    let book = OrderbookInfo {
        asks: vec![BookEntry(dec!(0.306525), dec!(31431))],
        bids: vec![BookEntry(dec!(0.3055), dec!(1250)), BookEntry(dec!(0.305), dec!(500))],
    };
    let value = serde_json::to_value(&book).unwrap();
    assert_eq!(value["asks"], json!([[0.306525, 31431.0]]));
    assert_eq!(value["bids"][1], json!([0.305, 500.0]));
}

#[test]
fn test_cancel_all_breakdown_shape() {
    let info = CancelAllInfo {
        succeeded: vec![],
        failed: vec![CancelFailureInfo {
            id: Some("5626184321047018389168193".to_string()),
            client_id: None,
            market: "XRP-PERP".to_string(),
            error: "timed out".to_string(),
            retryable: true,
        }],
    };
    let value = serde_json::to_value(&info).unwrap();
    assert_eq!(value["failed"][0]["id"], "5626184321047018389168193");
    assert_eq!(value["failed"][0]["clientId"], serde_json::Value::Null);
    assert_eq!(value["failed"][0]["retryable"], true);
}

#[test]
fn test_provider_error_body() {
    let parsed: ErrorResponse = serde_json::from_str(r#"{"message":"market not found"}"#).unwrap();
    assert_eq!(parsed.get_message(), "market not found");
    assert_eq!(ErrorResponse::from_text("boom").get_message(), "boom");
}
