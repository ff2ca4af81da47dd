//! # zo gateway
//!
//! Exchange-style REST gateway over a zo margin account on Solana.
//!
//! ## Modules
//!
//! - [`program`]: account decoding, instruction builders, transaction
//!   confirmation and log events of the margin program
//! - [`snapshot`]: pushed, atomically swapped mirror of ledger state
//! - [`metrics`]: margin fraction, collateral and pnl figures from a snapshot
//! - [`orders`]: REST requests to instructions
//! - [`trading`]: submit, confirm and read the outcome of an action
//! - [`assembler`]: REST payloads from snapshots and outcomes
//! - [`api`]: payload types and the external market-data client
//! - [`server`]: axum routes
//!
//! Plus [`session`], [`config`], [`logging`], [`network`] and [`shared`].
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use zo_gateway::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let keypair = Arc::new(parse_keypair(&std::env::var("SECRET_KEY")?)?);
//!     let ledger = Arc::new(RpcLedger::new(Cluster::Devnet.default_rpc_url()));
//!     let (session, _accounts) = Session::bootstrap(
//!         keypair,
//!         Cluster::Devnet.program_keys(),
//!         ledger,
//!         ConfirmConfig::default(),
//!     )
//!     .await?;
//!
//!     let snapshot = session.snapshot()?;
//!     println!("margin fraction: {}", AccountMetrics::compute(&snapshot).margin_fraction);
//!     Ok(())
//! }
//! ```

// ============================================================================
// MODULES
// ============================================================================

/// On-chain program layer: accounts, instructions, confirmation, events.
pub mod program;

/// Scaling helpers and types shared across layers.
pub mod shared;

/// Clusters, default endpoints and program keys.
pub mod network;

/// Push subscription and snapshot store.
pub mod snapshot;

pub mod metrics;
pub mod orders;
pub mod session;
pub mod trading;
pub mod assembler;

/// REST payloads and the market-data client.
pub mod api;

pub mod server;
pub mod config;
pub mod logging;

// ============================================================================
// PRELUDE
// ============================================================================

/// Prelude module for convenient imports.
///
/// ```rust,ignore
/// use zo_gateway::prelude::*;
/// ```
pub mod prelude {
    pub use crate::program::{
        ConfirmConfig, ConfirmedTransaction, EventStream, Ledger, LogEvent, RpcLedger, SdkError,
        SdkResult,
    };

    pub use crate::snapshot::{
        ListenerConfig, Market, OpenOrder, Position, Snapshot, SnapshotError, SnapshotListener,
        SnapshotStore,
    };

    pub use crate::metrics::AccountMetrics;
    pub use crate::orders::{ModifyRequest, OrderError, OrderFlags, OrderKind, OrderRef, OrderRequest};
    pub use crate::trading::{CancelAllReport, PlacedOrder, TradingError};

    pub use crate::config::{parse_keypair, Settings};
    pub use crate::network::{Cluster, DeployMode, ProgramKeys};
    pub use crate::session::Session;
    pub use crate::shared::{Resolution, TimeRange};

    pub use crate::api::{MarketDataClient, RetryConfig};
    pub use crate::server::{router, AppState};
}
