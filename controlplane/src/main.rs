//! Main entry point for the control plane binary
//!
//! Brings a control plane up, prints where to reach it, and keeps it running
//! until Ctrl+C.

use clap::Parser;
use std::time::Duration;
use tokio::signal;

use controlplane::{ApiServerConfig, ControlPlane, ControlPlaneResult};
use shared::{logging, process_info, ProcessId};

/// Runs a local test control plane until interrupted
#[derive(Parser)]
#[command(name = "controlplane")]
#[command(about = "Starts the backing processes integration tests run against")]
pub struct Args {
    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    pub log_level: String,

    /// API server binary (overrides TEST_ASSET_KUBE_APISERVER)
    #[arg(long)]
    pub apiserver_bin: Option<String>,

    /// Seconds to wait for the API server to become ready
    #[arg(long)]
    pub start_timeout_secs: Option<u64>,
}

#[tokio::main]
async fn main() -> ControlPlaneResult<()> {
    let args = Args::parse();

    // Environment file is optional
    let _ = dotenv::dotenv();

    logging::init_tracing_with_level(Some(&args.log_level));

    let mut config = ApiServerConfig::from_env()?;
    if let Some(binary) = args.apiserver_bin {
        config = config.with_binary(binary);
    }
    if let Some(secs) = args.start_timeout_secs {
        config = config.with_start_timeout(Duration::from_secs(secs));
    }

    let mut control_plane = ControlPlane::from_config(config)?;

    if let Err(e) = control_plane.start().await {
        logging::log_error(&ProcessId::ControlPlane, "Control plane start", &e);
        // Processes that did come up are ours to clean up
        if let Err(stop_err) = control_plane.stop().await {
            logging::log_error(&ProcessId::ControlPlane, "Cleanup after failed start", &stop_err);
        }
        return Err(e);
    }

    let url = control_plane.api_server_url().await?;
    process_info!(ProcessId::ControlPlane, "🌍 API server available at {}", url);
    println!("{}", serde_json::to_string_pretty(&control_plane.status().await)?);

    match signal::ctrl_c().await {
        Ok(()) => logging::log_shutdown(&ProcessId::ControlPlane, "Received Ctrl+C signal"),
        Err(err) => logging::log_error(&ProcessId::ControlPlane, "Signal handling", &err),
    }

    control_plane.stop().await?;
    logging::log_success(&ProcessId::ControlPlane, "Control plane stopped gracefully");
    Ok(())
}
