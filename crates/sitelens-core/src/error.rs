//! Error types for site audits.
//!
//! - `FetchError`: what went wrong talking to the target host
//! - `AuditError`: what the caller sees; either a validation failure (400)
//!   or a failed audit wrapping the fetch error (500)

use std::time::Duration;

use thiserror::Error;

/// Failure while retrieving the page.
#[derive(Debug, Error)]
pub enum FetchError {
    /// No response within the configured timeout
    #[error("timeout of {}ms exceeded", .timeout.as_millis())]
    Timeout { timeout: Duration },

    /// The server answered with a non-success status
    #[error("Request failed with status code {status}")]
    Status { status: u16 },

    /// DNS, connection, TLS or redirect failure
    #[error("{0}")]
    Transport(String),

    /// The response body could not be read
    #[error("failed to read response body: {0}")]
    Body(String),

    /// The HTTP client could not be constructed
    #[error("failed to build HTTP client: {0}")]
    Client(String),
}

impl FetchError {
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

/// Terminal error for one audit request.
#[derive(Debug, Error)]
pub enum AuditError {
    /// Missing or empty input; raised before any network call
    #[error("{0}")]
    Validation(String),

    /// Fetching the page failed; no partial report is produced
    #[error("Failed to audit site: {0}")]
    Fetch(#[from] FetchError),
}

impl AuditError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// HTTP status an endpoint should answer with
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Validation(_) => 400,
            Self::Fetch(_) => 500,
        }
    }
}

/// Result type alias using AuditError.
pub type Result<T> = std::result::Result<T, AuditError>;
