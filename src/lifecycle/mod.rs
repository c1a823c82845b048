//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (mod.rs):
//!     Listener bound → serve SetupHandler (pending)
//!     → startup.rs bootstrap on a blocking thread
//!     → Ready: install router, start reconciliation
//!     → Failed: keep serving the failure, no reconciliation
//!
//! Shutdown (shutdown.rs):
//!     Signal received → stop reconciliation → drain listener → exit
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//! ```
//!
//! # Design Decisions
//! - The listener serves before bootstrap starts so probes always get an answer
//! - The setup handler moves to a terminal state exactly once
//! - A bootstrap failure never exits the process

pub mod setup;
pub mod shutdown;
pub mod signals;
pub mod startup;

use std::io;
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use crate::config::ControllerConfig;
use crate::http;
use crate::reconcile::{Reconciler, ReconcilerConfig};

pub use setup::{SetupHandler, SetupPhase, SetupState};
pub use shutdown::Shutdown;
pub use startup::{Application, BootstrapError, BootstrapStep, Bootstrapper, ComponentFactory, DefaultComponents};

/// Run the controller on an already bound listener until `shutdown` fires.
pub async fn run<F: ComponentFactory>(
    config: ControllerConfig,
    factory: F,
    listener: TcpListener,
    shutdown: &Shutdown,
) -> io::Result<()> {
    let port = listener.local_addr()?.port();
    let handler = Arc::new(SetupHandler::new());
    let server = tokio::spawn(http::serve(listener, Arc::clone(&handler), shutdown.clone()));

    let reconcile = ReconcilerConfig::new(config.poll_interval());
    let outcome = tokio::task::spawn_blocking(move || Bootstrapper::new(config, factory).run()).await;

    let app = match outcome {
        Ok(Ok(app)) => Some(app),
        Ok(Err(e)) => {
            tracing::error!(step = e.step().as_str(), error = %e, "Controller setup failed");
            if let Err(e) = handler.set_error(e) {
                tracing::error!(error = %e, "Failed to record setup failure");
            }
            None
        }
        Err(e) => {
            tracing::error!(error = %e, "Controller setup task aborted");
            if let Err(e) = handler.set_error(e) {
                tracing::error!(error = %e, "Failed to record setup failure");
            }
            None
        }
    };

    match app {
        Some(app) => {
            if let Err(e) = handler.set_handler(app.router) {
                tracing::error!(error = %e, "Failed to install API router");
                shutdown.wait().await;
                return join_server(server).await;
            }
            let gc = app.producers.start_gc(shutdown.clone());
            tracing::info!(port, "Server started");

            match Reconciler::start(app.checker, reconcile) {
                Some(reconciler) => {
                    shutdown.wait().await;
                    match reconciler.shutdown().await {
                        Ok(summary) => tracing::info!(
                            attempts = summary.attempts,
                            failures = summary.failures,
                            "Reconciliation stopped"
                        ),
                        Err(e) => tracing::error!(error = %e, "Reconciliation task failed"),
                    }
                }
                None => {
                    tracing::info!("Periodic poll disabled");
                    shutdown.wait().await;
                }
            }
            if let Err(e) = gc.await {
                tracing::error!(error = %e, "Producer cache GC task failed");
            }
        }
        None => {
            tracing::warn!(port, "Simple error server running...");
            shutdown.wait().await;
        }
    }

    join_server(server).await
}

async fn join_server(server: JoinHandle<io::Result<()>>) -> io::Result<()> {
    match server.await {
        Ok(result) => result,
        Err(e) => Err(io::Error::other(e)),
    }
}
