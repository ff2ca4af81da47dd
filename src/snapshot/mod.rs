//! Eventually-consistent mirror of ledger state.
//!
//! - [`model`]: decoded markets, assets, books and the margin account
//! - [`store`]: atomically swapped snapshot with a stale flag
//! - [`listener`]: push subscription that keeps the store current

pub mod error;
pub mod listener;
pub mod model;
pub mod store;
pub mod subscriptions;
pub mod types;

pub use error::{SnapshotError, SnapshotResult};
pub use listener::{ListenerConfig, SnapshotListener};
pub use model::{
    AccountSet, Asset, Balance, BookLevel, MarginAccount, Market, OpenOrder, OrderBook, Position,
    Snapshot,
};
pub use store::SnapshotStore;
