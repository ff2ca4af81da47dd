//! REST payload types and the external market-data client.
//!
//! - [`types`]: request and response bodies of the gateway's REST surface
//! - [`client`]: [`MarketDataClient`] for candles, public trades and account
//!   history, which the ledger does not keep

pub mod client;
pub mod error;
pub mod types;

pub use client::{MarketDataClient, MarketDataClientBuilder, RetryConfig};
pub use error::{ApiError, ApiResult, ErrorResponse};
pub use types::*;
