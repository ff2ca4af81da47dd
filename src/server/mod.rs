//! Exchange-style REST surface.
//!
//! Every response is `{success: true, result}` or `{success: false, error}`
//! with the status of [`AppError::status`].

pub mod error;
pub mod handlers;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::api::MarketDataClient;
use crate::session::Session;

pub use error::{AppError, AppResult, Envelope};

/// State shared by every handler.
#[derive(Debug)]
pub struct AppState {
    pub session: Arc<Session>,
    /// `None` when no provider is configured; history routes answer 501
    pub market_data: Option<MarketDataClient>,
}

impl AppState {
    pub fn new(session: Arc<Session>, market_data: Option<MarketDataClient>) -> Self {
        Self {
            session,
            market_data,
        }
    }
}

/// Build the REST router.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        // Markets
        .route("/markets", get(handlers::list_markets))
        .route("/markets/{name}", get(handlers::get_market))
        .route("/markets/{name}/orderbook", get(handlers::get_orderbook))
        .route("/markets/{name}/trades", get(handlers::get_market_trades))
        .route("/markets/{name}/candles", get(handlers::get_candles))
        .route("/funding_rates", get(handlers::get_funding_rates))
        // Account
        .route("/account", get(handlers::get_account))
        .route("/positions", get(handlers::get_positions))
        .route("/fills", get(handlers::get_fills))
        .route("/trades/history", get(handlers::get_fills))
        .route("/funding_payments", get(handlers::get_funding_payments))
        // Wallet
        .route("/wallet/coins", get(handlers::get_coins))
        .route("/wallet/balances", get(handlers::get_balances))
        .route("/wallet/transfers", get(handlers::get_transfers))
        .route("/wallet/deposits", post(handlers::post_deposit))
        .route("/wallet/withdrawals", post(handlers::post_withdrawal))
        // Orders
        .route(
            "/orders",
            get(handlers::list_orders)
                .post(handlers::place_order)
                .delete(handlers::cancel_all_orders),
        )
        .route(
            "/orders/{id}",
            get(handlers::get_order).delete(handlers::cancel_order),
        )
        .route("/orders/{id}/modify", post(handlers::modify_order))
        // `{key}` is the client id, or the market when followed by a client id
        .route(
            "/orders/by_client_id/{key}",
            get(handlers::get_order_by_client_id),
        )
        .route(
            "/orders/by_client_id/{key}/modify",
            post(handlers::modify_order_by_client_id),
        )
        .route(
            "/orders/by_client_id/{key}/{client_id}",
            axum::routing::delete(handlers::cancel_order_by_client_id),
        )
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Serve until Ctrl-C.
pub async fn serve(state: Arc<AppState>, port: u16) -> std::io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "REST gateway listening");
    axum::serve(listener, router(state))
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for shutdown signal");
            }
            tracing::info!("Shutting down");
        })
        .await
}
