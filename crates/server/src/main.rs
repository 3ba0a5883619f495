//! hubble server entry point.
//!
//! Boots the MCP server on stdio transport. Logging goes to stderr to avoid
//! interfering with the JSON-RPC protocol on stdout.

use std::sync::Arc;

use anyhow::Result;
use hubble_client::{FetchClient, FetchConfig};
use hubble_core::AppConfig;
use rmcp::service::serve_server;
use rmcp::transport::io::stdio;
use tracing_subscriber::EnvFilter;

mod handler;
mod tools;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let config = AppConfig::load()?;
    tracing::info!("Starting hubble server on stdio transport");

    let cache = config.connect_cache();
    let client = Arc::new(FetchClient::new(FetchConfig::from(&config))?);
    let state = Arc::new(handler::AppState::new(cache, client));

    let handler = handler::HubbleServer::new(state);
    let transport = stdio();
    let server = serve_server(handler, transport).await?;

    server.waiting().await?;

    Ok(())
}
