//! In-memory store for tests.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;

use super::error::StoreError;
use super::store::CacheStore;

/// TTL-aware map with optional latency and injectable failures.
#[derive(Default)]
pub(crate) struct MemoryStore {
    entries: Mutex<HashMap<String, (String, Instant)>>,
    delay: Duration,
    failure: Mutex<Option<StoreError>>,
    reads: AtomicUsize,
    writes: AtomicUsize,
}

impl MemoryStore {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Every read and write sleeps this long first.
    pub(crate) fn with_delay(delay: Duration) -> Self {
        Self { delay, ..Self::default() }
    }

    /// Fail every subsequent operation with `err` until cleared.
    pub(crate) fn fail_with(&self, err: StoreError) {
        *self.failure.lock().unwrap() = Some(err);
    }

    pub(crate) fn clear_failure(&self) {
        *self.failure.lock().unwrap() = None;
    }

    /// Place a raw value directly, bypassing the facade.
    pub(crate) fn insert_raw(&self, key: &str, value: &str, ttl: Duration) {
        self.entries.lock().unwrap().insert(key.to_string(), (value.to_string(), Instant::now() + ttl));
    }

    pub(crate) fn get_raw(&self, key: &str) -> Option<String> {
        self.entries.lock().unwrap().get(key).map(|(value, _)| value.clone())
    }

    pub(crate) fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    pub(crate) fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    fn check_failure(&self) -> Result<(), StoreError> {
        match self.failure.lock().unwrap().clone() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl CacheStore for MemoryStore {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn write(&self, key: &str, value: &str, ttl: Duration) -> Result<(), StoreError> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.check_failure()?;
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.insert_raw(key, value, ttl);
        Ok(())
    }

    async fn read(&self, key: &str) -> Result<Option<String>, StoreError> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.check_failure()?;
        self.reads.fetch_add(1, Ordering::SeqCst);

        let mut entries = self.entries.lock().unwrap();
        match entries.get(key) {
            Some((_, expires_at)) if *expires_at <= Instant::now() => {
                entries.remove(key);
                Ok(None)
            }
            Some((value, _)) => Ok(Some(value.clone())),
            None => Ok(None),
        }
    }
}

/// Let spawned cache writes run to completion.
pub(crate) async fn settle() {
    tokio::time::sleep(Duration::from_millis(1)).await;
}
