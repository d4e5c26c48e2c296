//! Error types for the Cavity client

use cavity_core::dto::simulation::ErrorResponse;
use thiserror::Error;

/// Result type alias for client operations
pub type Result<T> = std::result::Result<T, ClientError>;

/// Errors that can occur when using the Cavity client
#[derive(Debug, Error)]
pub enum ClientError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    /// API returned an error status code
    #[error("API error (status {status}): {message}")]
    ApiError {
        /// HTTP status code
        status: u16,
        /// Error message from the API
        message: String,
        /// Offending request field, for validation failures
        field: Option<String>,
    },

    /// Failed to parse response
    #[error("Failed to parse response: {0}")]
    ParseError(String),

    /// Gave up waiting for a simulation to finish
    #[error("Simulation {0} did not finish in time")]
    Timeout(i64),
}

impl ClientError {
    /// Create an API error from a status code and the raw response body
    ///
    /// Bodies in the orchestrator's `{ message, field }` shape are unpacked;
    /// anything else is kept verbatim as the message.
    pub fn api_error(status: u16, body: impl Into<String>) -> Self {
        let body = body.into();
        match serde_json::from_str::<ErrorResponse>(&body) {
            Ok(err) => Self::ApiError {
                status,
                message: err.message,
                field: err.field,
            },
            Err(_) => Self::ApiError {
                status,
                message: body,
                field: None,
            },
        }
    }

    /// Check if this error is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::ApiError { status: 404, .. })
    }

    /// Check if this error is a client error (4xx status)
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::ApiError { status, .. } if *status >= 400 && *status < 500)
    }

    /// Check if this error is a server error (5xx status)
    pub fn is_server_error(&self) -> bool {
        matches!(self, Self::ApiError { status, .. } if *status >= 500)
    }

    /// The request field a validation error refers to
    pub fn field(&self) -> Option<&str> {
        match self {
            Self::ApiError { field, .. } => field.as_deref(),
            _ => None,
        }
    }
}
