//! MCP server handler implementation.
//!
//! This module defines the main server handler that
//! routes tool calls to the appropriate implementations.
use std::sync::Arc;

use crate::tools::{UrlParams, healthcheck_impl, lookup_impl};

use hubble_client::{FetchClient, ImageResolver, MetaResolver, MimeResolver};
use hubble_core::Cache;
use rmcp::{
    ErrorData as McpError, ServerHandler,
    handler::server::{
        tool::{ToolCallContext, ToolRouter},
        wrapper::Parameters,
    },
    model::{
        CallToolRequestParam, CallToolResult, Implementation, ListToolsResult, PaginatedRequestParam, ProtocolVersion,
        ServerCapabilities, ServerInfo,
    },
    service::{RequestContext, RoleServer},
    tool, tool_router,
};

/// Everything a tool call needs, built once in `main`.
pub struct AppState {
    pub cache: Cache,
    pub mime: MimeResolver,
    pub meta: MetaResolver,
    pub image: ImageResolver,
}

impl AppState {
    pub fn new(cache: Cache, client: Arc<FetchClient>) -> Self {
        Self {
            cache,
            mime: MimeResolver::new(client.clone()),
            meta: MetaResolver::new(client.clone()),
            image: ImageResolver::new(client),
        }
    }
}

/// The main MCP server handler for hubble.
#[derive(Clone)]
pub struct HubbleServer {
    state: Arc<AppState>,
    tool_router: ToolRouter<Self>,
}

/// Tool router implementation using the #[tool_router] macro.
///
/// This macro generates the routing logic that maps tool names to handler methods.
#[tool_router]
impl HubbleServer {
    /// Create a new server handler.
    pub fn new(state: Arc<AppState>) -> Self {
        Self { state, tool_router: Self::tool_router() }
    }

    /// Determine the content type of a resource.
    #[tool(
        description = "Determine the MIME type of a URL with a HEAD request, following redirects. Returns JSON {href, contentType}; cached results carry \"cached\": true."
    )]
    async fn url_mime(&self, params: Parameters<UrlParams>) -> Result<CallToolResult, McpError> {
        lookup_impl(&self.state.cache, &self.state.mime, params.0).await
    }

    /// Read Open Graph, Twitter Card and Dublin Core metadata from an HTML page.
    #[tool(
        description = "Read Open Graph, Twitter Card and Dublin Core metadata (or description, author and title) from an HTML page. Returns JSON {href, contentType, meta}."
    )]
    async fn url_meta(&self, params: Parameters<UrlParams>) -> Result<CallToolResult, McpError> {
        lookup_impl(&self.state.cache, &self.state.meta, params.0).await
    }

    /// Measure the pixel dimensions of an image.
    #[tool(description = "Measure the width and height of an image URL. Returns JSON {href, contentType, size}.")]
    async fn img_size(&self, params: Parameters<UrlParams>) -> Result<CallToolResult, McpError> {
        lookup_impl(&self.state.cache, &self.state.image, params.0).await
    }

    #[tool(description = "Report server health and the state of the cache backend.")]
    async fn healthcheck(&self) -> Result<CallToolResult, McpError> {
        healthcheck_impl(&self.state.cache).await
    }
}

impl ServerHandler for HubbleServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            server_info: Implementation {
                name: "hubble".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                ..Default::default()
            },
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }

    async fn list_tools(
        &self, _request: Option<PaginatedRequestParam>, _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, rmcp::model::ErrorData> {
        Ok(ListToolsResult { meta: None, tools: self.tool_router.list_all(), next_cursor: None })
    }

    async fn call_tool(
        &self, request: CallToolRequestParam, context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, rmcp::model::ErrorData> {
        self.tool_router
            .call(ToolCallContext::new(self, request, context))
            .await
    }
}
