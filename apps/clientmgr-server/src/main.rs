mod services;

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use clientmgr_bootstrap::{AppConfig, init_logging, shutdown_signal};
use greeter_sdk::GreeterServer;
use status_sdk::StatusServiceServer;
use tokio::net::TcpListener;
use tokio_stream::wrappers::TcpListenerStream;

use crate::services::{GreeterImpl, StatusServiceImpl};

/// ClientMgr demo server - status and greeter gRPC services
#[derive(Parser)]
#[command(name = "clientmgr-server")]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Listen address override (overrides server.address)
    #[arg(short, long)]
    address: Option<String>,

    /// Log verbosity level (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the server
    Run,
    /// Validate configuration and exit
    Check,
}

fn apply_cli_overrides(config: &mut AppConfig, cli: &Cli) {
    if let Some(address) = &cli.address {
        config.server.address.clone_from(address);
    }
    let level = match cli.verbose {
        0 => return,
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    config.logging.level = level.to_owned();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::load(cli.config.as_deref())?;
    apply_cli_overrides(&mut config, &cli);

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => run_server(config).await,
        Commands::Check => {
            config.validate()?;
            println!("Configuration is valid");
            println!("{config:#?}");
            Ok(())
        }
    }
}

async fn run_server(config: AppConfig) -> Result<()> {
    let _log_guard = init_logging(&config.logging)?;

    let addr: SocketAddr = config
        .server
        .address
        .parse()
        .with_context(|| format!("invalid server.address '{}'", config.server.address))?;
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    let local_addr = listener.local_addr()?;

    tracing::info!(%local_addr, "gRPC server listening");

    tonic::transport::Server::builder()
        .add_service(StatusServiceServer::new(StatusServiceImpl))
        .add_service(GreeterServer::new(GreeterImpl))
        .serve_with_incoming_shutdown(TcpListenerStream::new(listener), async {
            if let Err(e) = shutdown_signal().await {
                tracing::error!(error = %e, "signal handling failed, shutting down");
            }
        })
        .await
        .context("gRPC server failed")?;

    tracing::info!("gRPC server stopped");
    Ok(())
}
