//! API error types

use thiserror::Error;

/// Error reading the catalog or submitting requests to the backend.
#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Invalid response format
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Authentication required
    #[error("Authentication required")]
    Unauthorized,

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ApiError {
    /// Server-supplied message, when the response carried one.
    pub fn server_message(&self) -> Option<&str> {
        match self {
            ApiError::NotFound(msg) | ApiError::Validation(msg) | ApiError::Internal(msg)
                if !msg.is_empty() =>
            {
                Some(msg)
            }
            _ => None,
        }
    }
}

/// Result type for backend operations
pub type ApiResult<T> = Result<T, ApiError>;
