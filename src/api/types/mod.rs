//! REST payload types.
//!
//! Field names follow the exchange-style camelCase convention; every number
//! is a JSON number.

pub mod account;
pub mod history;
pub mod market;
pub mod order;
pub mod wallet;

pub use account::*;
pub use history::*;
pub use market::*;
pub use order::*;
pub use wallet::*;
