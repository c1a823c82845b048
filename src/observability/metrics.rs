//! Metrics collection and exposition.
//!
//! # Metrics
//! - `controller_api_requests_total` (counter): API requests by route, method, status
//! - `controller_api_request_duration_seconds` (histogram): API latency by route
//! - `controller_reconcile_total` (counter): reconciliation passes by outcome
//! - `controller_reconcile_duration_seconds` (histogram): pass duration
//!
//! # Design Decisions
//! - Recording goes through the global `metrics` recorder; without an
//!   installed exporter it is a no-op
//! - The Prometheus exporter listens on the configured metrics host

use std::net::SocketAddr;
use std::time::Duration;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Handle used by subsystems to record metrics.
#[derive(Debug, Clone, Copy, Default)]
pub struct Reporter;

impl Reporter {
    pub fn new() -> Self {
        Self
    }

    pub fn record_api_request(&self, route: &str, method: &str, status: u16, elapsed: Duration) {
        metrics::counter!(
            "controller_api_requests_total",
            "route" => route.to_string(),
            "method" => method.to_string(),
            "status" => status.to_string()
        )
        .increment(1);
        metrics::histogram!(
            "controller_api_request_duration_seconds",
            "route" => route.to_string()
        )
        .record(elapsed.as_secs_f64());
    }

    pub fn record_check(&self, ok: bool, elapsed: Duration) {
        let outcome = if ok { "success" } else { "failure" };
        metrics::counter!("controller_reconcile_total", "outcome" => outcome).increment(1);
        metrics::histogram!("controller_reconcile_duration_seconds").record(elapsed.as_secs_f64());
    }
}

/// Install the Prometheus exporter on `metrics_host`.
///
/// Must be called from within the Tokio runtime. A host that is not a socket
/// address leaves metrics in-process only.
pub fn init_metrics(metrics_host: &str) {
    let addr: SocketAddr = match metrics_host.parse() {
        Ok(addr) => addr,
        Err(_) => {
            tracing::warn!(metrics_host = %metrics_host, "Metrics host is not a socket address, exporter disabled");
            return;
        }
    };

    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}
