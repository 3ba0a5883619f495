//! Backend adapter contract and backend selection.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use super::error::StoreError;
use super::memcached::{MemcachedEndpoint, MemcachedStore};
use super::redis::{RedisEndpoint, RedisStore};

/// Uniform read/write contract over a key/value backend.
///
/// Implementations must be safe to share across concurrent requests.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Short backend name for logs and status output.
    fn name(&self) -> &'static str;

    /// Store `value` under `key`, overwriting any previous value, expiring after `ttl`.
    async fn write(&self, key: &str, value: &str, ttl: Duration) -> Result<(), StoreError>;

    /// Fetch the raw value for `key`. A missing key is `Ok(None)`, not an error.
    async fn read(&self, key: &str) -> Result<Option<String>, StoreError>;
}

/// The configured cache backend, selected once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendConfig {
    Redis(RedisEndpoint),
    Memcached(Vec<MemcachedEndpoint>),
}

impl BackendConfig {
    /// Backend name, matching `CacheStore::name` of the store it opens.
    pub fn name(&self) -> &'static str {
        match self {
            BackendConfig::Redis(_) => RedisStore::NAME,
            BackendConfig::Memcached(_) => MemcachedStore::NAME,
        }
    }

    /// Connect to the backend and wait for it to become ready.
    pub async fn open(&self) -> Result<Arc<dyn CacheStore>, StoreError> {
        match self {
            BackendConfig::Redis(endpoint) => Ok(Arc::new(RedisStore::connect(endpoint).await?)),
            BackendConfig::Memcached(endpoints) => Ok(Arc::new(MemcachedStore::connect(endpoints).await?)),
        }
    }
}

impl std::fmt::Display for BackendConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackendConfig::Redis(endpoint) => write!(f, "redis {endpoint}"),
            BackendConfig::Memcached(endpoints) => {
                let hosts: Vec<String> = endpoints.iter().map(ToString::to_string).collect();
                write!(f, "memcached {}", hosts.join(","))
            }
        }
    }
}
