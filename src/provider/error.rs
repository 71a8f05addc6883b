// ABOUTME: Errors raised by cloud provider backends.
// ABOUTME: Not-found is a distinct variant so callers can treat it as state, not failure.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProviderError {
    /// The requested resource does not exist.
    #[error("{0} does not exist")]
    NotFound(String),

    /// The provider rejected or failed a request.
    #[error("{operation} failed: {message}")]
    Request { operation: String, message: String },

    /// The provider answered with something we could not interpret.
    #[error("unexpected response from {operation}: {message}")]
    Malformed { operation: String, message: String },

    #[error("failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ProviderError {
    pub fn request(operation: impl Into<String>, message: impl Into<String>) -> Self {
        ProviderError::Request {
            operation: operation.into(),
            message: message.into(),
        }
    }

    pub fn malformed(operation: impl Into<String>, message: impl Into<String>) -> Self {
        ProviderError::Malformed {
            operation: operation.into(),
            message: message.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ProviderError::NotFound(_))
    }
}
