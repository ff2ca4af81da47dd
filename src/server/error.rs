//! HTTP error type and the `{success, result | error}` envelope.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::api::types::CancelAllInfo;
use crate::api::ApiError;
use crate::orders::OrderError;
use crate::program::error::SdkError;
use crate::snapshot::SnapshotError;
use crate::trading::TradingError;

/// Successful response body.
#[derive(Debug, Serialize)]
pub struct Envelope<T: Serialize> {
    pub success: bool,
    pub result: T,
}

/// Wrap a payload as `{success: true, result}`.
pub fn ok<T: Serialize>(result: T) -> Json<Envelope<T>> {
    Json(Envelope {
        success: true,
        result,
    })
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    success: bool,
    error: String,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    retryable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    signature: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<CancelAllInfo>,
}

/// Every failure a handler can return.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    NotFound(String),

    /// Unknown market, coin or order in a request
    #[error("{0}")]
    Unknown(String),

    #[error("No snapshot received yet")]
    NotSubscribed,

    /// Ledger refused the transaction, detail verbatim
    #[error("{0}")]
    Rejected(String),

    #[error("Transaction {signature} not confirmed in time; it may still land")]
    Timeout { signature: String },

    /// Ledger node unreachable; nothing was confirmed
    #[error("Ledger unavailable: {0}")]
    Unavailable(String),

    /// Transaction landed but its outcome could not be read
    #[error("Transaction {signature} confirmed but its result could not be read")]
    Unreadable { signature: String },

    #[error("{0}")]
    Internal(String),

    #[error("Market data provider is not configured")]
    MarketDataUnavailable,

    #[error("Market data provider error: {0}")]
    MarketData(ApiError),

    /// Cancel-all where every cancel failed
    #[error("All {} cancels failed", .report.failed.len())]
    CancelAllFailed { report: CancelAllInfo, retryable: bool },
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::Unknown(_) | AppError::Rejected(_) => {
                StatusCode::BAD_REQUEST
            }
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::NotSubscribed | AppError::Timeout { .. } | AppError::Unavailable(_) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            AppError::Internal(_) | AppError::Unreadable { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::MarketDataUnavailable => StatusCode::NOT_IMPLEMENTED,
            AppError::MarketData(_) => StatusCode::BAD_GATEWAY,
            AppError::CancelAllFailed { retryable, .. } => {
                if *retryable {
                    StatusCode::SERVICE_UNAVAILABLE
                } else {
                    StatusCode::BAD_REQUEST
                }
            }
        }
    }

    pub fn is_retryable(&self) -> bool {
        match self {
            AppError::NotSubscribed | AppError::Timeout { .. } | AppError::Unavailable(_) => true,
            AppError::CancelAllFailed { retryable, .. } => *retryable,
            _ => false,
        }
    }

    /// Same error, reported as a missing resource. Used by read endpoints.
    pub fn not_found_on_read(self) -> Self {
        match self {
            AppError::Unknown(message) => AppError::NotFound(message),
            other => other,
        }
    }
}

impl From<OrderError> for AppError {
    fn from(e: OrderError) -> Self {
        match e {
            OrderError::UnknownMarket(_) | OrderError::UnknownCoin(_) | OrderError::UnknownOrder(_) => {
                AppError::Unknown(e.to_string())
            }
            other => AppError::Validation(other.to_string()),
        }
    }
}

impl From<SnapshotError> for AppError {
    fn from(e: SnapshotError) -> Self {
        match e {
            SnapshotError::NotSubscribed => AppError::NotSubscribed,
            other => AppError::Internal(other.to_string()),
        }
    }
}

impl From<SdkError> for AppError {
    fn from(e: SdkError) -> Self {
        match e {
            SdkError::Rejected(detail) => AppError::Rejected(detail),
            SdkError::ConfirmationTimeout { signature, .. } => AppError::Timeout { signature },
            SdkError::LogsUnavailable { signature, .. } => AppError::Unreadable { signature },
            SdkError::Rpc(e) => AppError::Unavailable(e.to_string()),
            other => AppError::Internal(other.to_string()),
        }
    }
}

impl From<TradingError> for AppError {
    fn from(e: TradingError) -> Self {
        match e {
            TradingError::Order(e) => e.into(),
            TradingError::Snapshot(e) => e.into(),
            TradingError::Ledger(e) => e.into(),
        }
    }
}

impl From<ApiError> for AppError {
    fn from(e: ApiError) -> Self {
        match e {
            ApiError::InvalidParameter(message) => AppError::Validation(message),
            other => AppError::MarketData(other),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() && status != StatusCode::SERVICE_UNAVAILABLE {
            tracing::error!(%status, error = %self, "Request failed");
        } else {
            tracing::debug!(%status, error = %self, "Request refused");
        }

        let retryable = self.is_retryable();
        let error = self.to_string();
        let (signature, result) = match self {
            AppError::Timeout { signature } | AppError::Unreadable { signature } => (Some(signature), None),
            AppError::CancelAllFailed { report, .. } => (None, Some(report)),
            _ => (None, None),
        };
        let body = ErrorBody {
            success: false,
            error,
            retryable,
            signature,
            result,
        };
        (status, Json(body)).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(AppError::from(OrderError::MissingField("size")).status(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::from(SnapshotError::NotSubscribed).status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(
            AppError::from(SdkError::Rejected("insufficient funds".to_string())).status(),
            StatusCode::BAD_REQUEST
        );
        let timeout = AppError::from(SdkError::ConfirmationTimeout {
            signature: "sig".to_string(),
            attempts: 30,
        });
        assert_eq!(timeout.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert!(timeout.is_retryable());
        assert_eq!(
            AppError::from(SdkError::MissingExpectedEvent {
                signature: "sig".to_string(),
                expected: "WithdrawLog",
            })
            .status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(AppError::MarketDataUnavailable.status(), StatusCode::NOT_IMPLEMENTED);
        assert_eq!(
            AppError::from(ApiError::ServerError("down".to_string())).status(),
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn test_transport_failure_is_retryable_503() {
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "connection refused");
        let err = AppError::from(SdkError::Rpc(io.into()));
        assert_eq!(err.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert!(err.is_retryable());
        assert!(err.to_string().contains("connection refused"));

        let err = AppError::from(TradingError::Ledger(SdkError::Rpc(
            std::io::Error::new(std::io::ErrorKind::TimedOut, "blockhash").into(),
        )));
        assert!(matches!(err, AppError::Unavailable(_)));
    }

    #[test]
    fn test_missing_logs_after_confirmation() {
        let err = AppError::from(SdkError::LogsUnavailable {
            signature: "sig".to_string(),
            attempts: 30,
        });
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!err.is_retryable());
        assert!(!err.to_string().contains("may still land"));
    }

    #[test]
    fn test_cancel_all_failure_status() {
        let failed = |retryable| AppError::CancelAllFailed {
            report: CancelAllInfo::default(),
            retryable,
        };
        assert_eq!(failed(true).status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(failed(false).status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_not_found_on_read() {
        let err = AppError::from(OrderError::UnknownMarket("DOGE-PERP".to_string())).not_found_on_read();
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
        let err = AppError::from(OrderError::MissingField("size")).not_found_on_read();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }
}
