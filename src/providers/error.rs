//! Failure taxonomy for chain-data providers.

use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Unsupported chain: {0}")]
    UnsupportedChain(String),

    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    #[error("Rate limited by upstream")]
    RateLimited { retry_after: Option<Duration> },

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Provider unavailable: {0}")]
    Unavailable(String),
}

impl ProviderError {
    /// Whether the fault is worth retrying against the same provider.
    ///
    /// Validation-class faults are never retried.
    pub fn is_transient(&self) -> bool {
        match self {
            ProviderError::Timeout(_)
            | ProviderError::RateLimited { .. }
            | ProviderError::Connection(_) => true,
            ProviderError::Http { status, .. } => *status >= 500,
            ProviderError::InvalidAddress(_)
            | ProviderError::UnsupportedChain(_)
            | ProviderError::Decode(_)
            | ProviderError::Unavailable(_) => false,
        }
    }

    /// The request itself was bad. Any provider would reject it the same
    /// way, so it says nothing about the provider's health.
    pub fn is_caller_fault(&self) -> bool {
        matches!(
            self,
            ProviderError::InvalidAddress(_) | ProviderError::UnsupportedChain(_)
        )
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ProviderError::Timeout(Duration::ZERO)
        } else if err.is_connect() || err.is_request() {
            ProviderError::Connection(err.to_string())
        } else if err.is_decode() || err.is_body() {
            ProviderError::Decode(err.to_string())
        } else if let Some(status) = err.status() {
            ProviderError::Http {
                status: status.as_u16(),
                message: err.to_string(),
            }
        } else {
            ProviderError::Connection(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(ProviderError::Timeout(Duration::from_secs(1)).is_transient());
        assert!(ProviderError::RateLimited { retry_after: None }.is_transient());
        assert!(ProviderError::Connection("reset".into()).is_transient());
        assert!(ProviderError::Http { status: 503, message: String::new() }.is_transient());

        assert!(!ProviderError::Http { status: 404, message: String::new() }.is_transient());
        assert!(!ProviderError::InvalidAddress("zz".into()).is_transient());
        assert!(!ProviderError::Decode("bad json".into()).is_transient());
    }

    #[test]
    fn test_caller_fault_classification() {
        assert!(ProviderError::InvalidAddress("0x1234".into()).is_caller_fault());
        assert!(ProviderError::UnsupportedChain("dogechain".into()).is_caller_fault());
        assert!(!ProviderError::Timeout(Duration::from_secs(1)).is_caller_fault());
        assert!(!ProviderError::Http { status: 404, message: String::new() }.is_caller_fault());
    }
}
