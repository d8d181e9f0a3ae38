//! Error types for the SOA sync system
//!
//! This module defines all error types used throughout the crate.

use thiserror::Error;

use crate::traits::ApiError;

/// Result type alias for SOA sync operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for the SOA sync system
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration errors (missing API key, unknown provider, ...)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Missing or empty field in a zone snapshot
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The provider answered, but reported embedded errors
    #[error("API call {action} reported {} error(s)", errors.len())]
    Api {
        /// Provider action that failed (e.g. "domain.list")
        action: String,
        /// Errors embedded in the response
        errors: Vec<ApiError>,
    },

    /// HTTP client errors (from provider APIs)
    #[error("HTTP error: {0}")]
    Http(String),

    /// Provider-specific transport or protocol error
    #[error("Provider error ({provider}): {message}")]
    Provider {
        /// Provider name
        provider: String,
        /// Error message
        message: String,
    },
}

impl Error {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an invalid input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Create an embedded API error
    pub fn api(action: impl Into<String>, errors: Vec<ApiError>) -> Self {
        Self::Api {
            action: action.into(),
            errors,
        }
    }

    /// Create an HTTP error
    pub fn http(msg: impl Into<String>) -> Self {
        Self::Http(msg.into())
    }

    /// Create a provider-specific error
    pub fn provider(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Provider {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Whether the error came from the provider's transport rather than its payload
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Http(_) | Self::Provider { .. })
    }
}
