//! Error types for the zo program module.

use thiserror::Error;

/// Errors raised while talking to the ledger or decoding program data
#[derive(Debug, Error)]
pub enum SdkError {
    /// RPC client error (transport, not a verdict on the transaction)
    #[error("RPC error: {0}")]
    Rpc(#[from] solana_client::client_error::ClientError),

    /// Invalid account discriminator
    #[error("Invalid account discriminator: expected {expected}, got {actual}")]
    InvalidDiscriminator {
        expected: String,
        actual: String,
    },

    /// Account not found
    #[error("Account not found: {0}")]
    AccountNotFound(String),

    /// Invalid data length
    #[error("Invalid data length: expected {expected}, got {actual}")]
    InvalidDataLength {
        expected: usize,
        actual: usize,
    },

    /// Invalid order type byte
    #[error("Invalid order type: {0}")]
    InvalidOrderType(u8),

    /// Invalid side value
    #[error("Invalid side value: {0} (must be 0 or 1)")]
    InvalidSide(u8),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Arithmetic overflow
    #[error("Arithmetic overflow")]
    Overflow,

    /// Transaction could not be signed
    #[error("Signing error: {0}")]
    Signing(String),

    /// Invalid pubkey
    #[error("Invalid pubkey: {0}")]
    InvalidPubkey(String),

    /// Transaction refused by the ledger; the detail is the ledger's own message
    #[error("Transaction rejected: {0}")]
    Rejected(String),

    /// Transaction outcome unknown after the confirmation budget was spent
    #[error("Confirmation timed out for {signature} after {attempts} attempts")]
    ConfirmationTimeout {
        signature: String,
        attempts: u32,
    },

    /// Transaction confirmed but the node never served its logs
    #[error("Transaction {signature} confirmed but its logs were unavailable after {attempts} attempts")]
    LogsUnavailable {
        signature: String,
        attempts: u32,
    },

    /// Confirmed transaction did not emit the event the action depends on
    #[error("Transaction {signature} confirmed without a {expected} event")]
    MissingExpectedEvent {
        signature: String,
        expected: &'static str,
    },
}

impl SdkError {
    /// Whether retrying the same request may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, SdkError::ConfirmationTimeout { .. } | SdkError::Rpc(_))
    }
}

/// Result type alias for program operations
pub type SdkResult<T> = Result<T, SdkError>;
