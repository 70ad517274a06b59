//! Telemetry Service
//!
//! Entry point for the synthetic telemetry service. Loads configuration,
//! builds the engine and either runs a live stream until interrupted or
//! prints a one-off snapshot, KPI summary, chart series or catalog.

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use std::sync::Arc;
use tracing::info;

use telemetry_service::cli::sort_order;
use telemetry_service::config::validate_config;
use telemetry_service::{
    graceful_shutdown, initialize_logging, load_configuration, setup_signal_handlers, Cli,
    Commands, ServiceState,
};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration, then let command-line flags win
    let mut config = load_configuration(cli.config.as_deref())?;
    cli.apply_overrides(&mut config);
    validate_config(&config).context("Invalid command-line overrides")?;

    // Initialize logging
    initialize_logging(&config.logging)?;
    info!("Starting Telemetry Service v{}", env!("CARGO_PKG_VERSION"));

    let service_state = Arc::new(ServiceState::new(config)?);
    info!("Service state initialized");

    match cli.command {
        Commands::Run { ticks, .. } => run(service_state, ticks).await,
        Commands::Snapshot { sort, descending } => {
            print_json(&service_state.snapshot(sort_order(sort, descending))?)
        }
        Commands::Kpi => print_json(&service_state.kpi()?),
        Commands::Series { window, interval_hours } => {
            print_json(&service_state.series(window, interval_hours)?)
        }
        Commands::Catalog => print_json(&service_state.engine.catalog().list_devices()),
    }
}

async fn run(service_state: Arc<ServiceState>, ticks: Option<u64>) -> Result<()> {
    // Setup signal handlers for graceful shutdown
    let shutdown_signal = setup_signal_handlers()?;
    info!("Signal handlers configured");

    let mut stream_handle = {
        let state = Arc::clone(&service_state);
        tokio::spawn(async move { state.run_stream(ticks, std::io::stdout()).await })
    };

    info!("Telemetry Service is running. Press Ctrl+C to shutdown gracefully.");
    let finished = tokio::select! {
        _ = shutdown_signal => None,
        result = &mut stream_handle => Some(result),
    };

    match finished {
        None => {
            info!("Shutdown signal received. Initiating graceful shutdown...");
            graceful_shutdown(service_state, stream_handle).await?;
        }
        Some(result) => {
            let delivered = result.context("Telemetry stream task panicked")??;
            info!("Telemetry stream finished after {} payloads", delivered);
            service_state.shutdown();
        }
    }

    info!("Telemetry Service shutdown complete");
    Ok(())
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{json}");
    Ok(())
}
