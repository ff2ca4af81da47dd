//! Error types for the external market-data client.

use thiserror::Error;

/// Failure talking to the market-data provider.
#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP/network error from reqwest
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Resource not found (404)
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid request parameters (400)
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Too many requests (429)
    #[error("Rate limited: {0}")]
    RateLimited(String),

    /// Provider-side error (5xx)
    #[error("Server error: {0}")]
    ServerError(String),

    /// JSON deserialization error
    #[error("Deserialization error: {0}")]
    Deserialize(String),

    /// Invalid parameter provided
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Unexpected HTTP status code
    #[error("Unexpected status {0}: {1}")]
    UnexpectedStatus(u16, String),
}

/// Result type alias for market-data operations.
pub type ApiResult<T> = Result<T, ApiError>;

/// Error body returned by the provider.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct ErrorResponse {
    #[serde(alias = "message")]
    pub error: Option<String>,
    #[serde(default)]
    pub details: Option<String>,
}

impl ErrorResponse {
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            error: Some(text.into()),
            details: None,
        }
    }

    /// The error message, preferring `error` over `details`.
    pub fn get_message(&self) -> String {
        self.error
            .clone()
            .or_else(|| self.details.clone())
            .unwrap_or_else(|| "Unknown error".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_response_message() {
        let parsed: ErrorResponse = serde_json::from_str(r#"{"message":"bad symbol"}"#).unwrap();
        assert_eq!(parsed.get_message(), "bad symbol");

        let parsed: ErrorResponse = serde_json::from_str(r#"{"error":null,"details":"x"}"#).unwrap();
        assert_eq!(parsed.get_message(), "x");
        assert_eq!(ErrorResponse::from_text("plain").get_message(), "plain");
    }
}
