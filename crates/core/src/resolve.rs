//! Resolution orchestrator.
//!
//! Every lookup tool follows the same shape: consult the cache, resolve the
//! URL on any non-hit, write a successful result back and return it.
//! Failures are reported with the strategy's own message and never cached.

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::cache::{Cache, CacheError, Cached, cache_key};
use crate::error::Error;

/// Message returned when a request carries no URL.
pub const MISSING_URL_MESSAGE: &str = "Expected url param, found none.";

/// A strategy that turns a URL into a cacheable result.
#[async_trait]
pub trait Resolver: Send + Sync {
    type Output: Serialize + DeserializeOwned + Send + Sync + 'static;

    /// Key suffix separating this strategy's results from others for the same URL.
    fn suffix(&self) -> &'static str;

    /// User-facing message reported when resolution fails.
    fn failure_message(&self) -> &'static str;

    async fn resolve(&self, url: &str) -> Result<Self::Output, Error>;
}

/// Resolve `url` with `resolver`, going through `cache`.
pub async fn resolve_cached<R>(cache: &Cache, resolver: &R, url: &str) -> Result<Cached<R::Output>, Error>
where
    R: Resolver + ?Sized,
{
    let url = url.trim();
    if url.is_empty() {
        return Err(Error::InvalidInput(MISSING_URL_MESSAGE.to_string()));
    }

    let key = cache_key(url, resolver.suffix());

    match cache.read::<R::Output>(&key).await {
        Ok(Some(hit)) => {
            debug!(key = %key, "Cache hit");
            return Ok(hit);
        }
        Ok(None) => debug!(key = %key, "Cache miss"),
        Err(CacheError::NoCache) => {}
        Err(e) => debug!(key = %key, error = %e, "Cache unavailable, resolving live"),
    }

    match resolver.resolve(url).await {
        Ok(output) => {
            cache.write(&key, &output);
            Ok(Cached::fresh(output))
        }
        Err(e) => {
            warn!(url = %url, suffix = resolver.suffix(), error = %e, "Resolution failed");
            Err(Error::ResolveFailed(resolver.failure_message().to_string()))
        }
    }
}
