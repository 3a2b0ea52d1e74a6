//! MCP server initialization for stdio and streamable HTTP transports.
//!
//! Provides [`serve_stdio`] and [`serve_http`] entry points that open the
//! agent and wire the MCP tool handler into a running server.

use anyhow::{Context, Result};
use lore::agent::Agent;
use lore::config::LoreConfig;
use rmcp::ServiceExt;
use std::sync::{Arc, Mutex};

use crate::tools::LoreTools;

/// Open the databases and model providers once; every MCP session shares them.
fn setup_shared_state(config: &LoreConfig) -> Result<Arc<Mutex<Agent>>> {
    let agent = Agent::from_config(config).context("failed to open knowledge base")?;
    tracing::info!(
        knowledge = %config.knowledge_db_path().display(),
        history = %config.history_db_path().display(),
        ollama = %config.ollama.base_url,
        "agent ready"
    );
    Ok(Arc::new(Mutex::new(agent)))
}

/// Start the MCP server over stdio transport.
pub async fn serve_stdio(config: LoreConfig) -> Result<()> {
    tracing::info!("starting Lore MCP server on stdio");

    let agent = setup_shared_state(&config)?;

    let tools = LoreTools::new(agent);
    let transport = rmcp::transport::stdio();

    let server = tools.serve(transport).await?;
    tracing::info!("MCP server running, waiting for client");

    server.waiting().await?;
    tracing::info!("MCP server shut down");

    Ok(())
}

/// Start the MCP server over Streamable HTTP transport.
pub async fn serve_http(config: LoreConfig) -> Result<()> {
    let bind_addr = format!("{}:{}", config.server.host, config.server.port);
    tracing::info!(addr = %bind_addr, "starting Lore MCP server on HTTP");

    let agent = setup_shared_state(&config)?;

    let service = rmcp::transport::streamable_http_server::StreamableHttpService::new(
        move || Ok(LoreTools::new(agent.clone())),
        rmcp::transport::streamable_http_server::session::local::LocalSessionManager::default()
            .into(),
        Default::default(),
    );

    let router = axum::Router::new().nest_service("/mcp", service);

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {bind_addr}"))?;
    tracing::info!(addr = %bind_addr, "MCP server listening at http://{bind_addr}/mcp");

    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "failed to listen for ctrl-c");
            }
            tracing::info!("shutting down HTTP server");
        })
        .await?;

    Ok(())
}
