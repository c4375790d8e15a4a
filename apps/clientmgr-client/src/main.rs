mod wiring;

use std::path::PathBuf;

use anyhow::{Result, bail};
use clap::Parser;
use clientmgr::{Logger, init_global};
use clientmgr_bootstrap::{AppConfig, init_logging};
use greeter_sdk::global_greeter_client;
use status_sdk::{Status, global_status_client};

use crate::wiring::register_configured;

/// ClientMgr demo client - registers the configured clients and calls each once
#[derive(Parser)]
#[command(name = "clientmgr-client")]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Name sent in the SayHello request
    #[arg(short, long, default_value = "world")]
    name: String,

    /// Log verbosity level (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::load(cli.config.as_deref())?;
    match cli.verbose {
        0 => {}
        1 => config.logging.level = "info".to_owned(),
        2 => config.logging.level = "debug".to_owned(),
        _ => config.logging.level = "trace".to_owned(),
    }
    let _log_guard = init_logging(&config.logging)?;

    let registry = init_global(Logger::new(tracing::info_span!("clientmgr")));
    let registered = register_configured(&registry, &config);
    tracing::info!(clients = ?registry.list_clients(), "client registry ready");

    let mut failures = registered.failed.len();

    if let Some(name) = &registered.greeter {
        match global_greeter_client(name)?.say_hello(&cli.name).await {
            Ok(message) => tracing::info!(%message, "greeting received"),
            Err(e) => {
                tracing::error!(error = %e, "SayHello failed");
                failures += 1;
            }
        }
    }

    if let Some(name) = &registered.status {
        let status = Status::now();
        match global_status_client(name)?.send_status(&status).await {
            Ok(response) => tracing::info!(
                uuid = %response.uuid,
                message = %response.message,
                code = response.code,
                "status recorded"
            ),
            Err(e) => {
                tracing::error!(uuid = %status.uuid, error = %e, "SetStatus failed");
                failures += 1;
            }
        }
    }

    registry.close_all();

    if failures > 0 {
        bail!("{failures} client operation(s) failed");
    }
    Ok(())
}
