//! Unified error type for feedsync
//!
//! A single error enum covers every fallible operation in the workspace. The
//! variants are split along the retry taxonomy used by [`crate::reliability`]:
//! transient failures are retried, permanent ones propagate immediately and
//! cancellation is neither retried nor reported as a failure.

use crate::reliability::RetryableError;
use serde::{Deserialize, Serialize};

/// Unified error type for all feedsync operations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
pub enum FeedsError {
    /// Network or transport error
    #[error("Network error: {message}")]
    Network {
        /// Error message describing the network issue
        message: String,
    },

    /// The remote service throttled the request
    #[error("Rate limited: {message}")]
    RateLimited {
        /// Error message returned by the service
        message: String,
    },

    /// The remote service answered with an error status
    #[error("Server error ({status}): {message}")]
    Server {
        /// HTTP-like status code
        status: u16,
        /// Error message returned by the service
        message: String,
    },

    /// Resource not found
    #[error("Not found: {message}")]
    NotFound {
        /// Error message describing what was not found
        message: String,
    },

    /// Invalid input or configuration
    #[error("Invalid input: {message}")]
    InvalidInput {
        /// Error message describing the invalid input
        message: String,
    },

    /// The surrounding task was cancelled
    #[error("Operation cancelled")]
    Cancelled,

    /// Internal error
    #[error("Internal error: {message}")]
    Internal {
        /// Error message describing the internal error
        message: String,
    },
}

impl FeedsError {
    /// Create a network error
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
        }
    }

    /// Create a rate-limited error
    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self::RateLimited {
            message: message.into(),
        }
    }

    /// Create a server error with the given status
    pub fn server(status: u16, message: impl Into<String>) -> Self {
        Self::Server {
            status,
            message: message.into(),
        }
    }

    /// Create a not found error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    /// Create an invalid input error
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Whether a retry may succeed.
    ///
    /// Network failures, throttling and 5xx responses are transient. Client
    /// errors, missing resources and cancellation are not.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Network { .. } | Self::RateLimited { .. } => true,
            Self::Server { status, .. } => *status >= 500,
            Self::NotFound { .. }
            | Self::InvalidInput { .. }
            | Self::Cancelled
            | Self::Internal { .. } => false,
        }
    }
}

impl RetryableError for FeedsError {
    fn is_retryable(&self) -> bool {
        self.is_transient()
    }

    fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

/// Standard Result type for feedsync operations
pub type Result<T> = std::result::Result<T, FeedsError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_classification() {
        assert!(FeedsError::network("reset").is_transient());
        assert!(FeedsError::rate_limited("slow down").is_transient());
        assert!(FeedsError::server(503, "unavailable").is_transient());
        assert!(!FeedsError::server(404, "missing").is_transient());
        assert!(!FeedsError::not_found("feed").is_transient());
        assert!(!FeedsError::Cancelled.is_transient());
    }

    #[test]
    fn cancellation_is_not_retryable() {
        let err = FeedsError::Cancelled;
        assert!(err.is_cancelled());
        assert!(!err.is_retryable());
    }

    #[test]
    fn display_includes_status() {
        let err = FeedsError::server(502, "bad gateway");
        assert_eq!(err.to_string(), "Server error (502): bad gateway");
    }
}
