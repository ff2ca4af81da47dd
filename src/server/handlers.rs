//! Route handlers.
//!
//! Read endpoints format the current snapshot. Write endpoints run one
//! trading action each and format its confirmed outcome.

use std::sync::Arc;

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use chrono::Utc;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::api::types::{
    CandleQuery, HistoryQuery, MarketFilter, ModifyOrderRequest, PlaceOrderRequest, TransferRequest,
};
use crate::api::MarketDataClient;
use crate::assembler;
use crate::orders::{ModifyRequest, OrderError, OrderFlags, OrderRef, OrderRequest};
use crate::server::error::{ok, AppError, AppResult};
use crate::server::AppState;
use crate::shared::TimeRange;
use crate::trading;

const DEFAULT_BOOK_DEPTH: usize = 20;
const MAX_BOOK_DEPTH: usize = 100;

type Shared = State<Arc<AppState>>;

fn body<T>(payload: Result<Json<T>, JsonRejection>) -> AppResult<T> {
    payload
        .map(|Json(v)| v)
        .map_err(|e| AppError::Validation(e.body_text()))
}

fn query<T>(params: Result<Query<T>, QueryRejection>) -> AppResult<T> {
    params
        .map(|Query(v)| v)
        .map_err(|e| AppError::Validation(e.body_text()))
}

fn market_data(state: &AppState) -> AppResult<&MarketDataClient> {
    state.market_data.as_ref().ok_or(AppError::MarketDataUnavailable)
}

fn parse_order_id(raw: &str) -> AppResult<OrderRef> {
    raw.parse::<u128>()
        .map(OrderRef::Id)
        .map_err(|_| AppError::Validation(format!("Invalid order id: {}", raw)))
}

fn parse_client_id(raw: &str) -> AppResult<OrderRef> {
    raw.parse::<u64>()
        .map(OrderRef::ClientId)
        .map_err(|_| AppError::Validation(format!("Invalid client id: {}", raw)))
}

/// Turn a REST order body into a normalized request.
pub fn order_request(body: PlaceOrderRequest) -> Result<OrderRequest, OrderError> {
    Ok(OrderRequest {
        market: body.market.ok_or(OrderError::MissingField("market"))?,
        side: body.side.ok_or(OrderError::MissingField("side"))?,
        price: body.price,
        trigger_price: body.trigger_price,
        size: body.size.ok_or(OrderError::MissingField("size"))?,
        kind: body.kind.unwrap_or_default(),
        flags: OrderFlags {
            reduce_only: body.reduce_only,
            ioc: body.ioc,
            post_only: body.post_only,
        },
        client_id: body.client_id,
    })
}

fn transfer_request(body: TransferRequest) -> Result<(String, Decimal), OrderError> {
    Ok((
        body.coin.ok_or(OrderError::MissingField("coin"))?,
        body.size.ok_or(OrderError::MissingField("size"))?,
    ))
}

// ============================================================================
// Health
// ============================================================================

#[derive(Debug, Serialize)]
pub struct Health {
    pub slot: u64,
    pub stale: bool,
}

pub async fn health(State(state): Shared) -> AppResult<impl IntoResponse> {
    let snapshot = state.session.store().load()?;
    Ok(ok(Health {
        slot: snapshot.slot,
        stale: state.session.store().is_stale(),
    }))
}

// ============================================================================
// Markets
// ============================================================================

pub async fn list_markets(State(state): Shared) -> AppResult<impl IntoResponse> {
    let snapshot = state.session.snapshot()?;
    Ok(ok(snapshot.markets.iter().map(assembler::market).collect::<Vec<_>>()))
}

pub async fn get_market(State(state): Shared, Path(name): Path<String>) -> AppResult<impl IntoResponse> {
    let snapshot = state.session.snapshot()?;
    let market = snapshot
        .market(&name)
        .ok_or_else(|| AppError::NotFound(format!("No such market: {}", name)))?;
    Ok(ok(assembler::market(market)))
}

#[derive(Debug, Default, Deserialize)]
pub struct DepthQuery {
    pub depth: Option<usize>,
}

pub async fn get_orderbook(
    State(state): Shared,
    Path(name): Path<String>,
    params: Result<Query<DepthQuery>, QueryRejection>,
) -> AppResult<impl IntoResponse> {
    let depth = query(params)?.depth.unwrap_or(DEFAULT_BOOK_DEPTH);
    if depth == 0 || depth > MAX_BOOK_DEPTH {
        return Err(AppError::Validation(format!("depth must be 1-{}", MAX_BOOK_DEPTH)));
    }
    let snapshot = state.session.snapshot()?;
    let book = snapshot
        .book(&name)
        .ok_or_else(|| AppError::NotFound(format!("No such market: {}", name)))?;
    Ok(ok(assembler::orderbook(book, depth)))
}

pub async fn get_market_trades(
    State(state): Shared,
    Path(name): Path<String>,
    params: Result<Query<HistoryQuery>, QueryRejection>,
) -> AppResult<impl IntoResponse> {
    let params = query(params)?;
    let trades = market_data(&state)?.get_trades(&name, &params).await?;
    Ok(ok(trades))
}

pub async fn get_candles(
    State(state): Shared,
    Path(name): Path<String>,
    params: Result<Query<CandleQuery>, QueryRejection>,
) -> AppResult<impl IntoResponse> {
    let params = query(params)?;
    let range = TimeRange {
        start_time: params.start_time,
        end_time: params.end_time,
    };
    let candles = market_data(&state)?
        .get_candles(&name, params.resolution, range)
        .await?;
    Ok(ok(candles))
}

pub async fn get_funding_rates(State(state): Shared) -> AppResult<impl IntoResponse> {
    let snapshot = state.session.snapshot()?;
    Ok(ok(assembler::funding_rates(&snapshot)))
}

// ============================================================================
// Account
// ============================================================================

pub async fn get_account(State(state): Shared) -> AppResult<impl IntoResponse> {
    let snapshot = state.session.snapshot()?;
    Ok(ok(assembler::account(&snapshot)))
}

pub async fn get_positions(State(state): Shared) -> AppResult<impl IntoResponse> {
    let snapshot = state.session.snapshot()?;
    Ok(ok(assembler::positions(&snapshot)))
}

pub async fn get_fills(
    State(state): Shared,
    params: Result<Query<HistoryQuery>, QueryRejection>,
) -> AppResult<impl IntoResponse> {
    let params = query(params)?;
    let margin = state.session.accounts().margin.to_string();
    Ok(ok(market_data(&state)?.get_fills(&margin, &params).await?))
}

pub async fn get_funding_payments(
    State(state): Shared,
    params: Result<Query<HistoryQuery>, QueryRejection>,
) -> AppResult<impl IntoResponse> {
    let params = query(params)?;
    let margin = state.session.accounts().margin.to_string();
    Ok(ok(market_data(&state)?.get_funding_payments(&margin, &params).await?))
}

// ============================================================================
// Wallet
// ============================================================================

pub async fn get_coins(State(state): Shared) -> AppResult<impl IntoResponse> {
    let snapshot = state.session.snapshot()?;
    Ok(ok(snapshot.assets.iter().map(assembler::coin).collect::<Vec<_>>()))
}

pub async fn get_balances(State(state): Shared) -> AppResult<impl IntoResponse> {
    let snapshot = state.session.snapshot()?;
    Ok(ok(assembler::balances(&snapshot)))
}

pub async fn get_transfers(
    State(state): Shared,
    params: Result<Query<HistoryQuery>, QueryRejection>,
) -> AppResult<impl IntoResponse> {
    let params = query(params)?;
    let margin = state.session.accounts().margin.to_string();
    Ok(ok(market_data(&state)?.get_transfers(&margin, &params).await?))
}

pub async fn post_deposit(
    State(state): Shared,
    payload: Result<Json<TransferRequest>, JsonRejection>,
) -> AppResult<impl IntoResponse> {
    let (coin, size) = transfer_request(body(payload)?)?;
    let done = trading::deposit(&state.session, &coin, size).await?;
    Ok(ok(assembler::transfer(&done, Utc::now())))
}

pub async fn post_withdrawal(
    State(state): Shared,
    payload: Result<Json<TransferRequest>, JsonRejection>,
) -> AppResult<impl IntoResponse> {
    let (coin, size) = transfer_request(body(payload)?)?;
    let done = trading::withdraw(&state.session, &coin, size).await?;
    Ok(ok(assembler::transfer(&done, Utc::now())))
}

// ============================================================================
// Orders
// ============================================================================

pub async fn list_orders(
    State(state): Shared,
    params: Result<Query<MarketFilter>, QueryRejection>,
) -> AppResult<impl IntoResponse> {
    let filter = query(params)?;
    let snapshot = state.session.snapshot()?;
    if let Some(market) = filter.market.as_deref() {
        if snapshot.market(market).is_none() {
            return Err(AppError::NotFound(format!("No such market: {}", market)));
        }
    }
    let orders: Vec<_> = snapshot
        .open_orders(filter.market.as_deref())
        .map(assembler::open_order)
        .collect();
    Ok(ok(orders))
}

async fn get_order_by(state: &AppState, order: OrderRef) -> AppResult<impl IntoResponse> {
    let snapshot = state.session.snapshot()?;
    let found = state
        .session
        .translator(&snapshot)
        .find_order(&order)
        .map_err(|e| AppError::from(e).not_found_on_read())?;
    Ok(ok(assembler::open_order(found)))
}

pub async fn get_order(State(state): Shared, Path(id): Path<String>) -> AppResult<impl IntoResponse> {
    get_order_by(&state, parse_order_id(&id)?).await
}

pub async fn get_order_by_client_id(
    State(state): Shared,
    Path(client_id): Path<String>,
) -> AppResult<impl IntoResponse> {
    get_order_by(&state, parse_client_id(&client_id)?).await
}

pub async fn place_order(
    State(state): Shared,
    payload: Result<Json<PlaceOrderRequest>, JsonRejection>,
) -> AppResult<impl IntoResponse> {
    let request = order_request(body(payload)?)?;
    let placed = trading::place_order(&state.session, &request).await?;
    Ok(ok(assembler::placed_order(&placed, Utc::now())))
}

async fn modify_by(
    state: &AppState,
    order: OrderRef,
    payload: Result<Json<ModifyOrderRequest>, JsonRejection>,
) -> AppResult<impl IntoResponse> {
    let body = body(payload)?;
    let request = ModifyRequest {
        price: body.price,
        size: body.size,
        client_id: body.client_id,
    };
    let placed = trading::modify_order(&state.session, &order, &request).await?;
    Ok(ok(assembler::placed_order(&placed, Utc::now())))
}

pub async fn modify_order(
    State(state): Shared,
    Path(id): Path<String>,
    payload: Result<Json<ModifyOrderRequest>, JsonRejection>,
) -> AppResult<impl IntoResponse> {
    modify_by(&state, parse_order_id(&id)?, payload).await
}

pub async fn modify_order_by_client_id(
    State(state): Shared,
    Path(client_id): Path<String>,
    payload: Result<Json<ModifyOrderRequest>, JsonRejection>,
) -> AppResult<impl IntoResponse> {
    modify_by(&state, parse_client_id(&client_id)?, payload).await
}

pub async fn cancel_order(State(state): Shared, Path(id): Path<String>) -> AppResult<impl IntoResponse> {
    let order = parse_order_id(&id)?;
    trading::cancel_order(&state.session, &order).await?;
    Ok(ok("Order cancelled"))
}

pub async fn cancel_order_by_client_id(
    State(state): Shared,
    Path((market, client_id)): Path<(String, String)>,
) -> AppResult<impl IntoResponse> {
    let client_id = client_id
        .parse::<u64>()
        .map_err(|_| AppError::Validation(format!("Invalid client id: {}", client_id)))?;
    trading::cancel_by_client_id(&state.session, &market, client_id).await?;
    Ok(ok("Order cancelled"))
}

/// 200 with the breakdown unless every targeted cancel failed.
pub async fn cancel_all_orders(
    State(state): Shared,
    params: Result<Query<MarketFilter>, QueryRejection>,
) -> AppResult<impl IntoResponse> {
    let filter = query(params)?;
    let report = trading::cancel_all(&state.session, filter.market.as_deref()).await?;
    let info = assembler::cancel_all(&report);
    if report.all_failed() {
        return Err(AppError::CancelAllFailed {
            report: info,
            retryable: report.only_retryable(),
        });
    }
    Ok((StatusCode::OK, ok(info)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::program::types::Side;
    use rust_decimal_macros::dec;

    #[test]
    fn test_order_request_requires_fields() {
        let body = PlaceOrderRequest {
            market: Some("XRP-PERP".to_string()),
            side: Some(Side::Sell),
            price: Some(dec!(0.306525)),
            ..Default::default()
        };
        assert_eq!(order_request(body).unwrap_err(), OrderError::MissingField("size"));
    }

    #[test]
    fn test_order_request_from_json() {
        let body: PlaceOrderRequest = serde_json::from_str(
            r#"{"market":"XRP-PERP","side":"sell","price":0.306525,"type":"limit",
                "size":31431.0,"reduceOnly":false,"ioc":false,"postOnly":false,"clientId":null}"#,
        )
        .unwrap();
        let request = order_request(body).unwrap();
        assert_eq!(request.size, dec!(31431));
        assert_eq!(request.price, Some(dec!(0.306525)));
        assert_eq!(request.flags, OrderFlags::default());
        assert_eq!(request.client_id, None);
    }

    #[test]
    fn test_id_parsing() {
        assert_eq!(parse_order_id("42").unwrap(), OrderRef::Id(42));
        assert!(parse_order_id("abc").is_err());
        assert_eq!(parse_client_id("7").unwrap(), OrderRef::ClientId(7));
    }
}
