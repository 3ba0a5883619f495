//! Read timeout guard.
//!
//! A backend read runs on its own task. The guard waits for that task or for
//! the deadline, whichever comes first, and delivers exactly one outcome. When
//! the deadline wins the read is left to finish in the background and its
//! result is dropped, so a connection is never abandoned halfway through a
//! request.

use std::future::Future;
use std::time::Duration;

use tokio::task::JoinHandle;

use super::error::{CacheError, CacheResult, StoreError};

/// Bounds how long a cache read may take.
#[derive(Debug, Clone, Copy)]
pub struct ReadGuard {
    limit: Duration,
}

impl ReadGuard {
    pub fn new(limit: Duration) -> Self {
        Self { limit }
    }

    /// Run `op` and return its result, or `CacheError::Timeout` if it takes longer than the limit.
    pub async fn run<F, T>(&self, op: F) -> CacheResult<T>
    where
        F: Future<Output = Result<T, StoreError>> + Send + 'static,
        T: Send + 'static,
    {
        let handle: JoinHandle<Result<T, StoreError>> = tokio::spawn(op);

        tokio::select! {
            biased;
            joined = handle => match joined {
                Ok(result) => result.map_err(CacheError::from),
                Err(e) => Err(CacheError::Store(StoreError::Transport(format!("cache read task failed: {e}")))),
            },
            _ = tokio::time::sleep(self.limit) => Err(CacheError::Timeout(self.limit)),
        }
    }
}
