//! url_mime, url_meta and img_size tool implementation.
//!
//! All three lookups share one shape: validate the URL parameter, then hand
//! off to the cache-aware orchestrator with the tool's resolver.

use hubble_core::{Cache, Error, Resolver, resolve::MISSING_URL_MESSAGE, resolve_cached};
use rmcp::{ErrorData as McpError, model::*};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Input parameters for the URL lookup tools.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct UrlParams {
    /// The URL to look up.
    #[serde(default)]
    pub url: String,
}

/// Implementation shared by the URL lookup tools.
///
/// The result is the resolver's output as JSON, with `"cached": true` when it
/// was served from the cache.
pub async fn lookup_impl<R>(cache: &Cache, resolver: &R, params: UrlParams) -> Result<CallToolResult, McpError>
where
    R: Resolver + ?Sized,
{
    if params.url.trim().is_empty() {
        return Err(Error::InvalidInput(MISSING_URL_MESSAGE.into()).into());
    }

    let result = resolve_cached(cache, resolver, &params.url).await?;

    let json = serde_json::to_string_pretty(&result)
        .map_err(|e| Error::InvalidInput(format!("Failed to serialize result: {e}")))?;

    Ok(CallToolResult::success(vec![Content::text(json)]))
}
