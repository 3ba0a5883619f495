//! Shared result cache backed by Redis or Memcached.
//!
//! The cache is an optimization only. Every failure mode degrades to "not
//! cached" and the caller computes the value itself:
//!
//! - No backend configured: reads report no cache, writes are dropped
//! - Backend still connecting or failed: same as unconfigured
//! - Slow backend: reads give up after the read timeout
//! - Lost connection: the backend is disabled for the rest of the process

pub mod error;
pub mod facade;
pub mod guard;
pub mod key;
pub mod lifecycle;
pub mod memcached;
pub mod redis;
pub mod store;

#[cfg(test)]
pub(crate) mod testing;

pub use error::{CacheError, CacheResult, StoreError};
pub use facade::{Cache, CacheSettings, CacheStatus, Cached};
pub use guard::ReadGuard;
pub use key::{bucket, cache_key, digest};
pub use lifecycle::BackendState;
pub use memcached::{MemcachedEndpoint, MemcachedStore};
pub use redis::{RedisEndpoint, RedisStore};
pub use store::{BackendConfig, CacheStore};
