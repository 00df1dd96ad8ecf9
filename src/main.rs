use clap::{Parser, ValueEnum};
use pve_bridge::config;
use pve_bridge::core::infrastructure::api_client::ApiClient;
use pve_bridge::core::infrastructure::hypervisor::PveApi;
use pve_bridge::server::{mcp::McpServer, rest};
use pve_bridge::tools::ToolRegistry;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Transport {
    /// MCP JSON-RPC over stdin/stdout.
    Stdio,
    /// REST over HTTP.
    Http,
}

#[derive(Debug, Parser)]
#[command(name = "pve-bridge", version, about = "Proxmox VE tool bridge")]
struct Cli {
    /// Path to the JSON config file (falls back to $PVE_BRIDGE_CONFIG).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Which front end to serve.
    #[arg(long, value_enum, default_value = "stdio")]
    transport: Transport,

    /// Listen address for the HTTP transport.
    #[arg(long, default_value = "127.0.0.1:8620")]
    listen: SocketAddr,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Stdout carries the MCP protocol stream, so logs go to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(std::io::stderr)
        .init();

    let config = match config::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(err) => {
            tracing::error!(%err, "configuration error");
            return ExitCode::FAILURE;
        }
    };

    let client = match ApiClient::new(&config.proxmox, config.options.rate_limit) {
        Ok(client) => Arc::new(client),
        Err(err) => {
            tracing::error!(%err, "cannot build API client");
            return ExitCode::FAILURE;
        }
    };
    let registry = Arc::new(ToolRegistry::new(
        Arc::new(PveApi::new(client)),
        &config.options,
    ));

    let served = match cli.transport {
        Transport::Stdio => {
            tracing::info!("MCP front end serving on stdio");
            McpServer::new(registry).run().await
        }
        Transport::Http => rest::serve(registry, cli.listen).await,
    };

    match served {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(%err, "server error");
            ExitCode::FAILURE
        }
    }
}
