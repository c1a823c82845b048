//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the controller.
//! All types derive Serde traits for deserialization from config files.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Root configuration for the controller.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ControllerConfig {
    /// Storage backend settings.
    pub database: DatabaseConfig,

    /// Port the API listener binds to.
    pub api_port: u16,

    /// Token sidecars present to the control API.
    pub control_token: String,

    /// Key used to seal tenant credentials (exactly 16 bytes).
    pub secret_key: String,

    /// Metrics exporter address (e.g., "127.0.0.1:9125").
    pub metrics_host: String,

    /// Reconciliation interval in milliseconds. Zero disables polling.
    pub poll_interval_ms: u64,

    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Path to the NGINX configuration template.
    pub nginx_template: PathBuf,

    /// Upper bound on a single registry lookup, in seconds.
    pub registry_timeout_secs: u64,

    /// Idle time after which a tenant producer is collected, in seconds.
    pub producer_idle_secs: u64,

    /// API request timeout in seconds.
    pub request_timeout_secs: u64,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig::default(),
            api_port: 8080,
            control_token: String::new(),
            secret_key: String::new(),
            metrics_host: String::new(),
            poll_interval_ms: 60_000,
            log_level: "info".to_string(),
            nginx_template: PathBuf::from("./nginx/nginx.conf.tmpl"),
            registry_timeout_secs: 5,
            producer_idle_secs: 600,
            request_timeout_secs: 30,
        }
    }
}

impl ControllerConfig {
    /// The reconciliation interval as a duration.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn registry_timeout(&self) -> Duration {
        Duration::from_secs(self.registry_timeout_secs)
    }

    pub fn producer_idle(&self) -> Duration {
        Duration::from_secs(self.producer_idle_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Storage backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Backend kind ("memory" or "cloudant").
    #[serde(rename = "type")]
    pub kind: String,

    pub username: String,

    pub password: String,

    /// Database host. A bare host name must parse as `https://<host>`.
    pub host: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            kind: "memory".to_string(),
            username: String::new(),
            password: String::new(),
            host: String::new(),
        }
    }
}
