//! HTTP listener setup.
//!
//! # Responsibilities
//! - Serve the API port from process start, before bootstrap finishes
//! - Send every request through the setup handler
//! - Wire up middleware (request ID, tracing)
//! - Stop accepting and drain on shutdown

use std::io;
use std::sync::Arc;

use axum::Router;
use tokio::net::TcpListener;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::http::request::{UuidRequestId, X_REQUEST_ID};
use crate::lifecycle::setup::{self, SetupHandler};
use crate::lifecycle::Shutdown;

/// Outer router: every path falls through to the setup handler.
pub fn build_router(handler: Arc<SetupHandler>) -> Router {
    Router::new()
        .fallback(setup::dispatch)
        .with_state(handler)
        .layer(PropagateRequestIdLayer::new(X_REQUEST_ID))
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::new(X_REQUEST_ID, UuidRequestId))
}

/// Serve `listener` until `shutdown` fires.
pub async fn serve(
    listener: TcpListener,
    handler: Arc<SetupHandler>,
    shutdown: Shutdown,
) -> Result<(), io::Error> {
    let addr = listener.local_addr()?;
    tracing::info!(address = %addr, "HTTP server starting");

    axum::serve(listener, build_router(handler))
        .with_graceful_shutdown(async move { shutdown.wait().await })
        .await?;

    tracing::info!("HTTP server stopped");
    Ok(())
}
