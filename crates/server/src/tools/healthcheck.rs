//! healthcheck tool implementation.

use chrono::Utc;
use hubble_core::Cache;
use hubble_core::cache::CacheStatus;
use rmcp::{ErrorData as McpError, model::*};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Output structure for the healthcheck tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct HealthOutput {
    /// Always "okay" while the server answers.
    pub http: String,
    /// Cache backend and its lifecycle state.
    pub cache: CacheStatus,
    /// ISO8601 timestamp of the check.
    pub checked_at: String,
}

pub fn health(cache: &Cache) -> HealthOutput {
    HealthOutput { http: "okay".into(), cache: cache.status(), checked_at: Utc::now().to_rfc3339() }
}

/// Implementation of the healthcheck tool.
pub async fn healthcheck_impl(cache: &Cache) -> Result<CallToolResult, McpError> {
    let output = health(cache);
    Ok(CallToolResult::success(vec![Content::text(
        serde_json::to_string_pretty(&output).unwrap_or_default(),
    )]))
}
