use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tablechat_core::{Settings, init_tracing};
use tablechat_mcp_client::{McpHttpClient, Orchestrator};
use tablechat_server::{
    GatewayState, InferenceGateway, LlamaLaunch, LlamaLaunchBuilder, LlamaProcess,
    LlamaServerEngine, cors_layer, create_router,
};
use tracing::info;

#[derive(Parser, Debug)]
#[command(author, version, about = "Tablechat local inference gateway", long_about = None)]
struct Args {
    /// Configuration file overlaid on the bundled defaults
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// GGUF model to serve; the gateway then runs its own engine process
    #[arg(short, long, env = "TABLECHAT_MODEL_PATH")]
    model: Option<PathBuf>,

    /// Port to listen on
    #[arg(short, long)]
    port: Option<u16>,
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

    let gateway_settings = settings.gateway();
    let launch = match &args.model {
        Some(model) => Some(
            LlamaLaunchBuilder::default()
                .binary(gateway_settings.engine_binary().clone())
                .model_path(model.clone())
                .n_ctx(*gateway_settings.n_ctx())
                .n_threads(*gateway_settings.n_threads())
                .port(*gateway_settings.engine_port())
                .build()?,
        ),
        None => LlamaLaunch::from_settings(gateway_settings),
    };

    // Held for the life of the server; dropping it kills the engine.
    let engine_process = match launch {
        Some(launch) => {
            let process = LlamaProcess::start(launch)?;
            process
                .wait_until_ready(Duration::from_secs(*gateway_settings.startup_timeout_secs()))
                .await?;
            Some(process)
        }
        None => None,
    };
    let engine_url = engine_process
        .as_ref()
        .map(|process| process.launch().base_url())
        .unwrap_or_else(|| gateway_settings.engine_url().clone());
    info!(engine = %engine_url, "Using inference engine");

    let client = settings.client();
    let gateway = InferenceGateway::new(Arc::new(LlamaServerEngine::new(engine_url)))
        .with_chat_defaults(*client.max_tokens(), *client.temperature());
    let orchestrator = Orchestrator::new(
        Arc::new(gateway.clone()),
        Arc::new(McpHttpClient::new(client.mcp_url().clone())),
    );

    let app = create_router(
        GatewayState::new(gateway, orchestrator),
        cors_layer(gateway_settings.cors_origin())?,
    );

    let addr = gateway_settings.bind_addr(args.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(addr = %addr, "Gateway listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutdown requested");
        })
        .await?;

    if let Some(process) = engine_process {
        process.stop()?;
    }
    Ok(())
}
