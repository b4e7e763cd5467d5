//! Tablechat tool execution server binary.

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tablechat_core::{Settings, init_tracing};
use tablechat_mcp::{AzureTableStore, McpState, ToolRegistry, create_router};
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(author, version, about = "Tablechat tool execution server", long_about = None)]
struct Args {
    /// Configuration file overlaid on the bundled defaults
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Port to listen on (overrides config and PORT)
    #[arg(short, long)]
    port: Option<u16>,

    /// Azure storage connection string
    #[arg(long, env = "AZURE_STORAGE_CONNECTION_STRING", hide_env_values = true)]
    connection_string: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    let args = Args::parse();

    let settings = match &args.config {
        Some(path) => Settings::from_file(path)?,
        None => Settings::load()?,
    };
    init_tracing(settings.logging()).map_err(|e| anyhow::anyhow!(e))?;

    let mcp = settings.mcp();

    let store = AzureTableStore::new(args.connection_string, mcp.table().clone());
    if !store.has_credential() {
        error!("AZURE_STORAGE_CONNECTION_STRING not set; every tool call will fail");
    }

    let registry = ToolRegistry::with_table_tools(Arc::new(store), mcp.table().clone());
    info!(tools = registry.len(), table = %mcp.table(), "Registry initialized");

    let app = create_router(McpState::new(registry));
    let addr = mcp.bind_addr(args.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!(addr = %addr, "Tool server listening");
    axum::serve(listener, app).await?;

    Ok(())
}
