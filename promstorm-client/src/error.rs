//! Error types for the Prometheus client.

use thiserror::Error;

/// Errors that can occur when talking to the Prometheus HTTP API.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The configured endpoint is not a usable base URL.
    #[error("Invalid endpoint {0:?}")]
    InvalidEndpoint(String),

    /// HTTP request failed before a response was received.
    #[error("HTTP request failed: {0}")]
    Network(String),

    /// Connection failed.
    #[error("Connection failed: {0}")]
    Connection(String),

    /// Timeout waiting for response.
    #[error("Request timed out")]
    Timeout,

    /// The server answered with a status other than 200.
    #[error("HTTP {status}: {body}")]
    Http {
        /// Response status code.
        status: u16,
        /// Response body, truncated.
        body: String,
    },

    /// Failed to decode the response body.
    #[error("Failed to decode response: {0}")]
    Decode(String),

    /// The response decoded but reported a non-success status.
    #[error("API returned status {status:?}")]
    Api {
        /// The `status` field of the envelope.
        status: String,
    },
}

impl ClientError {
    /// Whether the request never produced a response (transport-level failure).
    pub fn is_network(&self) -> bool {
        matches!(
            self,
            ClientError::Network(_) | ClientError::Connection(_) | ClientError::Timeout
        )
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ClientError::Timeout
        } else if err.is_connect() {
            ClientError::Connection(err.to_string())
        } else if err.is_decode() {
            ClientError::Decode(err.to_string())
        } else {
            ClientError::Network(err.to_string())
        }
    }
}
