//! DFD API server.
//!
//! # Architecture Overview
//!
//! ```text
//!                 ┌──────────────────────────────────────────────────────────┐
//!                 │                         DFD API                           │
//!                 │                                                           │
//!   Request       │  ┌────────────┐   ┌──────────────┐   ┌────────────────┐  │
//!   ──────────────┼─▶│ trace / id │──▶│ latency pad  │──▶│  rate limit    │  │
//!                 │  │  timeout   │   │ (state-chg.) │   │  csrf / body   │  │
//!                 │  └────────────┘   └──────────────┘   └───────┬────────┘  │
//!                 │                                              ▼           │
//!   Response      │  ┌────────────┐                      ┌────────────────┐  │
//!   ◀─────────────┼──│ sec headers│◀─────────────────────│ sanitize +     │  │
//!                 │  └────────────┘                      │ handler        │  │
//!                 │                                      └────────────────┘  │
//!                 │  ┌────────────────────────────────────────────────────┐  │
//!                 │  │ config │ observability │ lifecycle (signals/shutdown)│  │
//!                 │  └────────────────────────────────────────────────────┘  │
//!                 └──────────────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use dfd_api::config::{load_config, ApiConfig};
use dfd_api::lifecycle::{wait_for_termination, Shutdown};
use dfd_api::observability::{logging, metrics};
use dfd_api::HttpServer;

#[derive(Parser)]
#[command(name = "dfd-api")]
#[command(about = "API server for the DFD drafting application", long_about = None)]
struct Args {
    /// Path to a TOML configuration file. Defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the listener bind address.
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => ApiConfig::default(),
    };
    if let Some(bind) = args.bind {
        config.listener.bind_address = bind;
    }

    logging::init_logging(&config.observability)?;
    tracing::info!("dfd-api v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        rate_limit_max = config.rate_limit.max_requests,
        rate_limit_window_ms = config.rate_limit.window_ms,
        latency_target_ms = config.latency.target_ms,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    let mut server = tokio::spawn(HttpServer::new(config).run(listener, server_shutdown));

    tokio::select! {
        _ = wait_for_termination() => {
            shutdown.trigger();
            server.await??;
        }
        result = &mut server => result??,
    }

    tracing::info!("Shutdown complete");
    Ok(())
}
