//! On-chain program interaction module for the zo margin program.
//!
//! This module provides account decoding, instruction builders, log event
//! parsing and the submit-and-confirm cycle against a [`Ledger`].

pub mod accounts;
pub mod client;
pub mod confirm;
pub mod constants;
pub mod error;
pub mod events;
pub mod instructions;
pub mod mock;
pub mod pda;
pub mod types;

// Re-export commonly used items
pub use accounts::{BookSide, Cache, Control, Leaf, Margin, OpenOrdersInfo, State};
pub use client::{Ledger, RpcLedger, SignatureStatus};
pub use confirm::{submit_and_confirm, ConfirmConfig, ConfirmedTransaction, PendingTransaction, TxState};
pub use constants::*;
pub use error::{SdkError, SdkResult};
pub use events::{DepositLog, EventStream, ExpectedEvent, LogEvent, RealizedPnlLog, WithdrawLog};
pub use instructions::*;
pub use mock::{MockLedger, MockOutcome};
pub use pda::*;
pub use types::*;
