//! Photo Gateway
//!
//! HTTP front door for an external image-processing worker.
//!
//! # Architecture Overview
//!
//! ```text
//!                        ┌──────────────────────────────────────────────┐
//!                        │                 PHOTO GATEWAY                │
//!                        │                                              │
//!   POST /send_photo     │  ┌─────────┐   ┌─────────┐   ┌────────────┐  │
//!   ─────────────────────┼─▶│  http   │──▶│   job   │──▶│   worker   │──┼──▶ Image worker
//!                        │  │handlers │   │ staging │   │   bridge   │  │    (TCP, one line,
//!                        │  └────┬────┘   │ naming  │   └─────┬──────┘  │     reply until close)
//!   {response, output}   │       │        └─────────┘         │         │
//!   ◀────────────────────┼───────┴─────── translate ◀─────────┘         │
//!                        │                                              │
//!   GET /photo/{name}    │  ┌─────────────────────┐                     │
//!   ─────────────────────┼─▶│ storage (output dir)│                     │
//!                        │  └─────────────────────┘                     │
//!                        │                                              │
//!                        │  config · observability · lifecycle · cors   │
//!                        └──────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;

use photo_gateway::config::{load_config, validation::validate_config, GatewayConfig};
use photo_gateway::lifecycle::{startup, Shutdown};
use photo_gateway::observability::logging;

#[derive(Parser)]
#[command(name = "photo-gateway")]
#[command(about = "Upload photos over HTTP and hand them to an image worker", long_about = None)]
struct Cli {
    /// Path to a TOML configuration file.
    #[arg(short, long, env = "PHOTO_GATEWAY_CONFIG")]
    config: Option<PathBuf>,

    /// Override `listener.bind_address`.
    #[arg(long)]
    bind: Option<String>,

    /// Override the worker address (`host:port`).
    #[arg(long)]
    worker: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => GatewayConfig::default(),
    };
    apply_overrides(&mut config, &cli)?;
    if let Err(errors) = validate_config(&config) {
        for error in &errors {
            eprintln!("invalid configuration: {error}");
        }
        return Err("configuration rejected".into());
    }

    logging::init_logging(&config.observability)?;

    tracing::info!("photo-gateway v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        worker = %config.worker.address(),
        upload_dir = %config.storage.upload_dir.display(),
        output_dir = %config.storage.output_dir.display(),
        request_timeout_secs = config.limits.request_secs,
        "Configuration loaded"
    );

    let shutdown = Shutdown::new();
    startup::run(config, &shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

fn apply_overrides(config: &mut GatewayConfig, cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(bind) = &cli.bind {
        config.listener.bind_address = bind.clone();
    }
    if let Some(worker) = &cli.worker {
        let (host, port) = worker
            .rsplit_once(':')
            .ok_or_else(|| format!("worker address {worker:?} must be host:port"))?;
        config.worker.host = host.to_string();
        config.worker.port = port.parse()?;
    }
    Ok(())
}
