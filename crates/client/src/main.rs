//! Command-line front-end for the simulator facade.
mod commands;
mod config;
mod logging;

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use commands::{Logs, Run, SessionDemo, SimulatorsCommand, SnapshotsCommand};
use config::ClientConfig;
use simulator_facade::{PythonRuntimeSource, ReqwestFetch, SimulatorFacade};

/// Drive a simulator through the remote service or the embedded runtime
#[derive(Parser)]
#[command(name = "simulator")]
#[command(about = "Client for the game-mechanics simulator", long_about = None)]
#[command(version)]
struct Cli {
    /// Override SIMULATOR_BASE_URL
    #[arg(long, global = true, value_name = "URL")]
    base_url: Option<String>,

    /// Route overrides, e.g. `run=remote,get_logs=remote`
    #[arg(long, global = true, value_name = "ROUTES")]
    routes: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Parser)]
enum Command {
    /// Load the embedded runtime ahead of the first simulation
    Init,

    /// Create and list simulators
    #[command(subcommand)]
    Simulators(SimulatorsCommand),

    /// Create, list and load snapshots
    #[command(subcommand)]
    Snapshots(SnapshotsCommand),

    /// Run a plan against a simulator
    Run(Run),

    /// Print a simulator's operation logs
    Logs(Logs),

    /// List skills known to the remote service
    Skills,

    /// Create a baseline simulator, run a plan and print its logs
    Session(SessionDemo),
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if it exists (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let mut config = ClientConfig::from_env();
    if let Some(base_url) = cli.base_url {
        config.facade.base_url = base_url;
    }
    if let Some(routes) = cli.routes.as_deref() {
        config
            .facade
            .routes
            .apply_overrides(routes)
            .context("Invalid --routes")?;
    }

    logging::setup_logging(&config)?;

    let facade = build_facade(&config)?;

    match cli.command {
        Command::Init => {
            if !facade.routes().uses_embedded() {
                tracing::info!("No operation is routed to the embedded runtime; nothing to load");
                return Ok(());
            }
            facade.initialize().await?;
            tracing::info!("Embedded runtime ready");
            Ok(())
        }
        Command::Simulators(cmd) => cmd.execute(&facade).await,
        Command::Snapshots(cmd) => cmd.execute(&facade).await,
        Command::Run(cmd) => cmd.execute(&facade).await,
        Command::Logs(cmd) => cmd.execute(&facade).await,
        Command::Skills => commands::print_json(&facade.list_skills().await?),
        Command::Session(cmd) => cmd.execute(&facade).await,
    }
}

fn build_facade(config: &ClientConfig) -> Result<SimulatorFacade> {
    let fetch = match config.facade.request_timeout {
        Some(timeout) => ReqwestFetch::with_timeout(timeout)
            .context("Failed to construct HTTP client")?,
        None => ReqwestFetch::new(),
    };
    let source = PythonRuntimeSource::new(config.facade.python.clone());

    let facade = SimulatorFacade::builder()
        .config(&config.facade)
        .fetch(Arc::new(fetch))
        .runtime_source(Arc::new(source))
        .build()?;

    tracing::debug!(
        "Facade ready: base_url={} routes={:?}",
        facade.base_url(),
        facade.routes()
    );
    Ok(facade)
}
