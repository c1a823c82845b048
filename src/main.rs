//! Proxy controller.
//!
//! # Architecture Overview
//!
//! ```text
//!                       ┌──────────────────────────────────────────────────┐
//!                       │                 PROXY CONTROLLER                 │
//!                       │                                                  │
//!   API client          │  ┌──────────┐   ┌──────────────┐   ┌──────────┐  │
//!   ────────────────────┼─▶│ listener │──▶│ SetupHandler │──▶│   api    │  │
//!                       │  │  (http)  │   │ pending/fail │   │  router  │  │
//!                       │  └──────────┘   └──────────────┘   └────┬─────┘  │
//!                       │                                         │        │
//!                       │        ┌──────────────┬─────────────────┤        │
//!                       │        ▼              ▼                 ▼        │
//!                       │  ┌──────────┐  ┌─────────────┐  ┌───────────┐    │
//!                       │  │ checker  │  │ proxyconfig │  │   nginx   │    │
//!                       │  └────┬─────┘  └──────┬──────┘  │ generator │    │
//!                       │       │               │         └───────────┘    │
//!   Service registry ◀──┼───────┤               ▼                          │
//!                       │       └──────▶ storage + notification            │
//!                       │                                                  │
//!                       │  reconcile: periodic checker pass                │
//!                       │  lifecycle: bootstrap, signals, shutdown         │
//!                       └──────────────────────────────────────────────────┘
//! ```

use clap::Parser;
use tokio::net::TcpListener;

use proxy_controller::config::CliArgs;
use proxy_controller::lifecycle::{self, signals, DefaultComponents, Shutdown};
use proxy_controller::observability::{logging, metrics};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = CliArgs::parse().into_config()?;

    logging::init(&config.log_level);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "proxy-controller starting");
    tracing::info!(
        api_port = config.api_port,
        database = %config.database.kind,
        poll_interval_ms = config.poll_interval_ms,
        "Configuration loaded"
    );

    if !config.metrics_host.is_empty() {
        metrics::init_metrics(&config.metrics_host);
    }

    let listener = TcpListener::bind(("0.0.0.0", config.api_port)).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    signals::spawn_signal_listener(shutdown.clone());

    lifecycle::run(config, DefaultComponents, listener, &shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
