//! Azure Pricing MCP Server - Rust Implementation
//!
//! A Model Context Protocol (MCP) server for the Azure Retail Prices API.
//! Serves a single session over stdio by default, or many sessions over
//! WebSocket with the `serve` subcommand.

use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};

use azure_pricing_mcp::config::Config;
use azure_pricing_mcp::mcp::server::{self, ConnectionManager};
use azure_pricing_mcp::mcp::tools::pricing_registry;
use azure_pricing_mcp::pricing::client::AzurePricingClient;

/// Azure Pricing MCP Server
#[derive(Parser)]
#[command(name = "azure-pricing-mcp")]
#[command(author, version, about = "Azure Pricing MCP Server - A Model Context Protocol server for Azure retail prices")]
struct Cli {
    /// Maximum response length in characters
    #[arg(long, global = true)]
    character_limit: Option<usize>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve MCP sessions over WebSocket at /mcp
    Serve {
        /// Port to listen on
        #[arg(long)]
        port: Option<u16>,

        /// Address to bind
        #[arg(long)]
        host: Option<String>,
    },

    /// Print the available tools and exit
    Tools,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr; stdout carries the protocol in stdio mode
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = Config::new().context("failed to load configuration")?;
    if let Some(limit) = cli.character_limit {
        config.character_limit = limit;
    }
    if let Some(Commands::Serve { port, host }) = &cli.command {
        if let Some(port) = port {
            config.port = *port;
        }
        if let Some(host) = host {
            config.host = host.clone();
        }
    }
    config.check().context("invalid configuration")?;

    let client = AzurePricingClient::new(&config).context("failed to build HTTP client")?;
    let registry = pricing_registry(Arc::new(client), &config)?;

    match cli.command {
        Some(Commands::Tools) => {
            let tools = serde_json::to_string_pretty(&registry.list())?;
            println!("{}", tools);
        }
        Some(Commands::Serve { .. }) => {
            let manager = Arc::new(ConnectionManager::new(registry, config.tool_timeout));
            server::serve(manager, &config.bind_addr())
                .await
                .with_context(|| format!("server on {} failed", config.bind_addr()))?;
        }
        None => {
            let manager = ConnectionManager::new(registry, config.tool_timeout);
            manager.run_stdio().await?;
        }
    }

    Ok(())
}
