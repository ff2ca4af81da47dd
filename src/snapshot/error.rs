//! Error types for the account subscription and snapshot cache.

use thiserror::Error;

use crate::program::SdkError;

/// Snapshot and subscription errors
#[derive(Debug, Error)]
pub enum SnapshotError {
    /// No snapshot has been published yet
    #[error("No account snapshot received yet")]
    NotSubscribed,

    /// Initial connection failure
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Unexpected connection close
    #[error("Connection closed unexpectedly: code {code}, reason: {reason}")]
    ConnectionClosed { code: u16, reason: String },

    /// JSON deserialization failure
    #[error("Failed to parse message: {0}")]
    MessageParseError(String),

    /// Subscription refused by the node
    #[error("Subscription failed: {0}")]
    SubscriptionFailed(String),

    /// Client ping not responded
    #[error("Ping timeout: no pong response received")]
    PingTimeout,

    /// WebSocket protocol error
    #[error("WebSocket protocol error: {0}")]
    Protocol(String),

    /// Invalid URL
    #[error("Invalid WebSocket URL: {0}")]
    InvalidUrl(String),

    /// Timeout
    #[error("Operation timed out")]
    Timeout,

    /// IO error
    #[error("IO error: {0}")]
    Io(String),

    /// Pushed or fetched account data could not be decoded
    #[error("Account decode error: {0}")]
    Decode(#[from] SdkError),
}

impl From<tokio_tungstenite::tungstenite::Error> for SnapshotError {
    fn from(err: tokio_tungstenite::tungstenite::Error) -> Self {
        use tokio_tungstenite::tungstenite::Error;
        match err {
            Error::ConnectionClosed | Error::AlreadyClosed => SnapshotError::ConnectionClosed {
                code: 1000,
                reason: "Connection closed".to_string(),
            },
            Error::Io(e) => SnapshotError::Io(e.to_string()),
            Error::Protocol(e) => SnapshotError::Protocol(e.to_string()),
            Error::Url(e) => SnapshotError::InvalidUrl(e.to_string()),
            Error::Http(resp) => {
                SnapshotError::ConnectionFailed(format!("HTTP error: {:?}", resp.status()))
            }
            Error::HttpFormat(e) => SnapshotError::ConnectionFailed(e.to_string()),
            other => SnapshotError::Protocol(other.to_string()),
        }
    }
}

impl From<serde_json::Error> for SnapshotError {
    fn from(err: serde_json::Error) -> Self {
        SnapshotError::MessageParseError(err.to_string())
    }
}

/// Result type alias for snapshot operations
pub type SnapshotResult<T> = Result<T, SnapshotError>;
