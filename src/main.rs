//! Header-driven request forwarder.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ──────────────▶ http server ──▶ forwarded-port filter ──▶ handler
//!                                     (validate *-forwarded-port   │
//!                                      headers into the request    │
//!                                      context)                    ▼
//!                                                          decision engine
//!                                                      LocalHandle │ Forward(port)
//!                                          ┌───────────────────────┴──────┐
//!                                          ▼                              ▼
//!     Client Response ◀──────────── local body             strategy factory
//!                    ◀──────────── relayed body ◀──── json/text strategy ──▶ upstream
//!                                                         (outbound client)     http://domain:port/path
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use port_forwarder::config::resolve_config;
use port_forwarder::lifecycle::{spawn_signal_handler, Shutdown};
use port_forwarder::observability::{init_logging, metrics};
use port_forwarder::HttpServer;

#[derive(Debug, Parser)]
#[command(name = "port-forwarder", version, about = "Forwards requests to the port named in a *-forwarded-port header")]
struct Cli {
    /// Path to the TOML configuration file. Defaults are used when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Validate the configuration and exit.
    #[arg(long)]
    check: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = resolve_config(cli.config.as_deref())?;

    if cli.check {
        println!("configuration OK");
        return Ok(());
    }

    init_logging(&config.observability)?;
    tracing::info!("port-forwarder v{} starting", env!("CARGO_PKG_VERSION"));

    let source = cli
        .config
        .as_ref()
        .map_or_else(|| "<defaults>".to_string(), |p| p.display().to_string());
    tracing::info!(
        source = %source,
        bind_address = %config.listener.bind_address,
        upstream = %config.upstream.name,
        domain = %config.upstream.domain,
        header_key = %config.upstream.header.key,
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        metrics::init_metrics(config.observability.metrics_address.parse()?)?;
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;

    let shutdown = Shutdown::new();
    spawn_signal_handler(shutdown.clone());

    let server = HttpServer::new(config)?;
    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
