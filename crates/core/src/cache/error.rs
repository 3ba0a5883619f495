//! Cache error types.

use std::time::Duration;

use thiserror::Error;

/// Errors raised by a backend adapter.
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    /// Transport or protocol failure; the connection may still be usable.
    #[error("transport error: {0}")]
    Transport(String),

    /// The connection to the backend is gone.
    #[error("disconnected: {0}")]
    Disconnected(String),
}

impl StoreError {
    /// Whether this error means the backend cannot serve further requests.
    pub fn is_fatal(&self) -> bool {
        matches!(self, StoreError::Disconnected(_))
    }
}

/// Errors surfaced by `Cache::read`.
///
/// Callers treat every variant as "compute fresh"; they differ only in how
/// they are logged.
#[derive(Debug, Error)]
pub enum CacheError {
    /// No backend is configured, or the backend has failed.
    #[error("no cache configured")]
    NoCache,

    /// An empty key was supplied.
    #[error("no key supplied")]
    NoKey,

    /// The backend did not answer within the read timeout.
    #[error("cache read timed out after {}ms", .0.as_millis())]
    Timeout(Duration),

    /// The backend answered with an error.
    #[error("cache backend error: {0}")]
    Store(#[from] StoreError),
}

/// Result type for cache operations.
pub type CacheResult<T> = Result<T, CacheError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(CacheError::NoCache.to_string(), "no cache configured");
        assert_eq!(CacheError::NoKey.to_string(), "no key supplied");
        assert_eq!(CacheError::Timeout(Duration::from_millis(200)).to_string(), "cache read timed out after 200ms");

        let err: CacheError = StoreError::Transport("connection reset".into()).into();
        assert!(err.to_string().contains("connection reset"));
    }

    #[test]
    fn test_store_error_fatality() {
        assert!(StoreError::Disconnected("closed".into()).is_fatal());
        assert!(!StoreError::Transport("WRONGTYPE".into()).is_fatal());
    }
}
