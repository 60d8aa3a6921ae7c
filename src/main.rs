//! Authenticating API gateway.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ──────────────▶ http server ──▶ filter chain ──────────▶ route table ──▶ load balancer
//!                     (request id,    (strip service segment,  (longest       (round robin /
//!                      trace,          enforce token on         prefix)        least conn)
//!                      timeout)        protected paths,                            │
//!                                      inject id/role)                              ▼
//!     ◀────────────── response ◀──────────────────────────────────────────── backend
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use auth_gateway::config::{load_config, watcher::ConfigWatcher};
use auth_gateway::lifecycle::{wait_for_shutdown_signal, Shutdown};
use auth_gateway::observability::{logging, metrics};
use auth_gateway::HttpServer;

#[derive(Parser)]
#[command(name = "auth-gateway")]
#[command(about = "Authenticating reverse proxy for backend services", long_about = None)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long, default_value = "gateway.toml")]
    config: PathBuf,

    /// Do not reload the configuration when the file changes.
    #[arg(long)]
    no_watch: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = load_config(&cli.config)?;

    logging::init_logging(&config.observability.log_level);
    tracing::info!("auth-gateway v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        routes = config.routes.len(),
        backends = config.backends.len(),
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse::<SocketAddr>() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    // Keep the watcher alive for the lifetime of the server.
    let (_watcher, config_updates) = if cli.no_watch {
        let (_, rx) = mpsc::unbounded_channel();
        (None, rx)
    } else {
        let (watcher, rx) = ConfigWatcher::new(&cli.config);
        (Some(watcher.run()?), rx)
    };

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        wait_for_shutdown_signal().await;
        shutdown.trigger();
    });

    let server = HttpServer::new(config)?;
    server.run(listener, config_updates, server_shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
