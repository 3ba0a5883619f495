//! Backend-agnostic cache facade.
//!
//! `Cache` is cheap to clone and safe to share. Reads are bounded by the
//! read timeout and writes never block the caller. When no backend is
//! configured, or the backend has failed, reads report [`CacheError::NoCache`]
//! and writes do nothing.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use super::error::{CacheError, CacheResult, StoreError};
use super::guard::ReadGuard;
use super::lifecycle::{BackendState, Lifecycle};
use super::store::{BackendConfig, CacheStore};

/// Default entry lifetime in seconds.
pub const DEFAULT_EXPIRE_SECS: u64 = 3600;
/// Default read timeout in milliseconds.
pub const DEFAULT_READ_TIMEOUT_MS: u64 = 200;
/// Default number of consecutive transient failures before the backend is disabled.
pub const DEFAULT_FAILURE_THRESHOLD: u32 = 5;

/// Tunables for the cache facade.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheSettings {
    /// Lifetime of every written entry.
    pub expire: Duration,
    /// Upper bound on a single read.
    pub read_timeout: Duration,
    /// Consecutive transient failures (errors or timeouts) that disable the backend. Zero never disables.
    pub failure_threshold: u32,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            expire: Duration::from_secs(DEFAULT_EXPIRE_SECS),
            read_timeout: Duration::from_millis(DEFAULT_READ_TIMEOUT_MS),
            failure_threshold: DEFAULT_FAILURE_THRESHOLD,
        }
    }
}

/// A resolved value plus whether it was served from the cache.
///
/// Serializes as the value's own fields with `"cached": true` added on hits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cached<T> {
    #[serde(flatten)]
    pub value: T,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub cached: bool,
}

impl<T> Cached<T> {
    /// A value that was just computed.
    pub fn fresh(value: T) -> Self {
        Self { value, cached: false }
    }

    /// A value served from the cache.
    pub fn hit(value: T) -> Self {
        Self { value, cached: true }
    }
}

/// Snapshot of the facade for health reporting.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheStatus {
    /// Backend name, absent when no backend is configured.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backend: Option<String>,
    pub state: BackendState,
}

struct Inner {
    backend: Option<&'static str>,
    store: OnceLock<Arc<dyn CacheStore>>,
    lifecycle: Lifecycle,
    failures: AtomicU32,
    settings: CacheSettings,
}

/// Shared handle to the process-wide cache.
#[derive(Clone)]
pub struct Cache {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for Cache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cache")
            .field("backend", &self.inner.backend)
            .field("state", &self.state())
            .field("settings", &self.inner.settings)
            .finish()
    }
}

impl Cache {
    fn build(backend: Option<&'static str>, initial: BackendState, settings: CacheSettings) -> Self {
        Self {
            inner: Arc::new(Inner {
                backend,
                store: OnceLock::new(),
                lifecycle: Lifecycle::new(initial),
                failures: AtomicU32::new(0),
                settings,
            }),
        }
    }

    /// A cache with no backend. Reads report no cache, writes are dropped.
    pub fn unconfigured(settings: CacheSettings) -> Self {
        Self::build(None, BackendState::Unconfigured, settings)
    }

    /// Start connecting to `backend` in the background.
    ///
    /// Returns immediately in the `Connecting` state; requests made before the
    /// connection is up are served without the cache. Must be called inside a
    /// Tokio runtime, otherwise the cache starts out failed.
    pub fn connect(backend: Option<BackendConfig>, settings: CacheSettings) -> Self {
        let Some(config) = backend else {
            info!("No cache backend configured, caching disabled");
            return Self::unconfigured(settings);
        };

        let cache = Self::pending(config.name(), settings);
        match Handle::try_current() {
            Ok(handle) => {
                info!(backend = %config, "Connecting cache backend");
                let task_cache = cache.clone();
                handle.spawn(async move {
                    let opened = config.open().await;
                    task_cache.install(opened);
                });
            }
            Err(_) => {
                cache.install(Err(StoreError::Disconnected("no async runtime to connect from".into())));
            }
        }
        cache
    }

    /// A cache that is already connected to `store`.
    pub fn with_store(store: Arc<dyn CacheStore>, settings: CacheSettings) -> Self {
        let cache = Self::pending(store.name(), settings);
        cache.install(Ok(store));
        cache
    }

    /// A cache whose backend could not be set up. Behaves like an unavailable backend.
    pub fn failed(backend: &'static str, settings: CacheSettings) -> Self {
        Self::build(Some(backend), BackendState::Failed, settings)
    }

    fn pending(backend: &'static str, settings: CacheSettings) -> Self {
        Self::build(Some(backend), BackendState::Connecting, settings)
    }

    /// Record the outcome of the connection attempt.
    fn install(&self, opened: Result<Arc<dyn CacheStore>, StoreError>) {
        let backend = self.inner.backend.unwrap_or("none");
        match opened {
            Ok(store) => {
                if self.inner.store.set(store).is_err() || !self.inner.lifecycle.mark_ready() {
                    warn!(backend = backend, "Cache backend connected after it was given up on");
                    return;
                }
                info!(backend = backend, "Cache backend ready");
            }
            Err(e) => {
                self.inner.lifecycle.mark_failed();
                error!(backend = backend, error = %e, "Cache backend unavailable, continuing without cache");
            }
        }
    }

    pub fn state(&self) -> BackendState {
        self.inner.lifecycle.get()
    }

    /// Name of the configured backend, if any.
    pub fn backend(&self) -> Option<&'static str> {
        self.inner.backend
    }

    pub fn status(&self) -> CacheStatus {
        CacheStatus { backend: self.inner.backend.map(str::to_string), state: self.state() }
    }

    fn ready_store(&self) -> Option<Arc<dyn CacheStore>> {
        if !self.state().is_ready() {
            return None;
        }
        self.inner.store.get().cloned()
    }

    /// Store `value` under `key` in the background.
    ///
    /// Never blocks and never fails from the caller's point of view; problems
    /// are logged and counted against the backend.
    pub fn write<T: Serialize>(&self, key: &str, value: &T) {
        let _ = self.spawn_write(key, value);
    }

    pub(crate) fn spawn_write<T: Serialize>(&self, key: &str, value: &T) -> Option<JoinHandle<()>> {
        if key.is_empty() {
            debug!("Skipping cache write with empty key");
            return None;
        }
        let store = self.ready_store()?;

        let payload = match serde_json::to_string(value) {
            Ok(payload) => payload,
            Err(e) => {
                warn!(key = key, error = %e, "Failed to serialize cache value");
                return None;
            }
        };

        let Ok(handle) = Handle::try_current() else {
            warn!(key = key, "No async runtime, dropping cache write");
            return None;
        };

        let cache = self.clone();
        let key = key.to_string();
        let ttl = self.inner.settings.expire;
        Some(handle.spawn(async move {
            match store.write(&key, &payload, ttl).await {
                Ok(()) => cache.record_success(),
                Err(e) => {
                    warn!(key = %key, error = %e, "Cache write failed");
                    cache.record_failure(&e);
                }
            }
        }))
    }

    /// Look up `key`, bounded by the read timeout.
    ///
    /// `Ok(None)` is a miss, including a stored value that no longer decodes
    /// as `T`. Every `Err` means the cache could not answer; callers should
    /// compute the value themselves.
    pub async fn read<T: DeserializeOwned>(&self, key: &str) -> CacheResult<Option<Cached<T>>> {
        let Some(store) = self.ready_store() else {
            return Err(CacheError::NoCache);
        };
        if key.is_empty() {
            return Err(CacheError::NoKey);
        }

        let guard = ReadGuard::new(self.inner.settings.read_timeout);
        let owned_key = key.to_string();
        let outcome = guard.run(async move { store.read(&owned_key).await }).await;

        match outcome {
            Ok(Some(raw)) => {
                self.record_success();
                match serde_json::from_str::<T>(&raw) {
                    Ok(value) => Ok(Some(Cached::hit(value))),
                    Err(e) => {
                        debug!(key = key, error = %e, "Ignoring malformed cache entry");
                        Ok(None)
                    }
                }
            }
            Ok(None) => {
                self.record_success();
                Ok(None)
            }
            Err(CacheError::Store(e)) => {
                self.record_failure(&e);
                Err(CacheError::Store(e))
            }
            Err(e) => {
                self.record_transient();
                Err(e)
            }
        }
    }

    fn record_success(&self) {
        self.inner.failures.store(0, Ordering::Release);
    }

    fn record_failure(&self, err: &StoreError) {
        if err.is_fatal() {
            if self.inner.lifecycle.mark_failed() {
                error!(backend = self.inner.backend.unwrap_or("none"), error = %err, "Cache backend disconnected, caching disabled");
            }
        } else {
            self.record_transient();
        }
    }

    fn record_transient(&self) {
        let threshold = self.inner.settings.failure_threshold;
        let count = self.inner.failures.fetch_add(1, Ordering::AcqRel).saturating_add(1);
        if threshold > 0 && count >= threshold && self.inner.lifecycle.mark_failed() {
            error!(
                backend = self.inner.backend.unwrap_or("none"),
                failures = count,
                "Cache backend failing repeatedly, caching disabled"
            );
        }
    }
}
