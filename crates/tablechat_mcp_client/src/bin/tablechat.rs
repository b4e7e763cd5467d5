//! Tablechat command-line client.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;
use tablechat_core::{Settings, init_tracing};
use tablechat_mcp_client::{GatewayClient, McpHttpClient, Orchestrator};
use tracing::info;

#[derive(Parser, Debug)]
#[command(author, version, about = "Ask questions about your table", long_about = None)]
struct Args {
    /// Configuration file overlaid on the bundled defaults
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Inference gateway base URL
    #[arg(long, env = "TABLECHAT_GATEWAY_URL")]
    gateway_url: Option<String>,

    /// Tool server base URL
    #[arg(long, env = "TABLECHAT_MCP_URL")]
    mcp_url: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Ask a single question and exit
    Ask {
        /// The question
        #[arg(required = true, num_args = 1..)]
        question: Vec<String>,
    },
    /// Interactive session (default)
    Repl,
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

    let client = settings.client();
    let gateway = match &args.gateway_url {
        Some(url) => GatewayClient::from_settings(client).with_base_url(url.clone()),
        None => GatewayClient::from_settings(client),
    };
    let mcp_url = args.mcp_url.clone().unwrap_or_else(|| client.mcp_url().clone());
    info!(gateway = %gateway.base_url(), mcp = %mcp_url, "Client configured");

    let orchestrator = Orchestrator::new(Arc::new(gateway), Arc::new(McpHttpClient::new(mcp_url)));

    match args.command.unwrap_or(Command::Repl) {
        Command::Ask { question } => {
            let answer = orchestrator.run(&question.join(" ")).await;
            println!("{}", answer.to_display_string());
        }
        Command::Repl => repl(&orchestrator).await?,
    }

    Ok(())
}

async fn repl(orchestrator: &Orchestrator) -> Result<()> {
    let stdin = std::io::stdin();
    let mut lines = stdin.lock().lines();

    loop {
        print!("\nAsk a question, prompt (or 'exit'): ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next() else {
            break;
        };
        let question = line?;
        let question = question.trim();
        if question.eq_ignore_ascii_case("exit") {
            break;
        }
        if question.is_empty() {
            continue;
        }

        let answer = orchestrator.run(question).await;
        println!("\nFINAL ANSWER:\n{}", answer.to_display_string());
    }

    Ok(())
}
