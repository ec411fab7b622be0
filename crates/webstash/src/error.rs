use std::sync::Arc;

use reqwest::StatusCode;

// Custom error type for fetch operations
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid request: {0}")]
    InvalidInput(String),

    #[error("server returned status code {0}")]
    Status(StatusCode),

    #[error("storage error: {0}")]
    Storage(#[from] std::io::Error),

    #[error("transport failed: {0}")]
    Transport(String),

    /// Failure shared between the caller that performed the download and
    /// every waiter on the same key.
    #[error("{0}")]
    Shared(Arc<FetchError>),
}

impl FetchError {
    /// Whether the request itself was malformed. These failures are terminal
    /// and never degrade to a placeholder delivery.
    pub fn is_invalid_input(&self) -> bool {
        match self {
            FetchError::InvalidInput(_) => true,
            FetchError::Shared(inner) => inner.is_invalid_input(),
            _ => false,
        }
    }
}
