//! Error types for the Runhook client

use thiserror::Error;

/// Result type alias for client operations
pub type Result<T> = std::result::Result<T, ClientError>;

/// Errors that can occur when talking to the orchestrator
#[derive(Debug, Error)]
pub enum ClientError {
    /// HTTP request failed before a response arrived
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    /// Orchestrator returned a status other than 200
    #[error("API error (status {status}): {message}")]
    ApiError {
        /// HTTP status code
        status: u16,
        /// Response body
        message: String,
    },

    /// Writing a downloaded body to disk failed
    #[error("Failed to write response body: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to encode a request body
    #[error("Failed to serialize request: {0}")]
    SerializeError(#[from] serde_json::Error),
}

impl ClientError {
    /// Create an API error from status code and message
    pub fn api_error(status: u16, message: impl Into<String>) -> Self {
        Self::ApiError {
            status,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_display() {
        let err = ClientError::api_error(404, "not found");
        assert_eq!(err.to_string(), "API error (status 404): not found");
        assert!(matches!(err, ClientError::ApiError { status: 404, .. }));
    }

    #[test]
    fn test_io_error_display() {
        let err = ClientError::from(std::io::Error::other("disk full"));
        assert_eq!(err.to_string(), "Failed to write response body: disk full");
    }
}
