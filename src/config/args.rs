//! Command-line and environment overrides.

use std::path::PathBuf;

use clap::Parser;

use crate::config::loader::{load_config, ConfigError};
use crate::config::schema::ControllerConfig;

#[derive(Debug, Default, Parser)]
#[command(name = "proxy-controller")]
#[command(about = "Control plane for sidecar proxy configuration", version)]
pub struct CliArgs {
    /// TOML configuration file. Flags override values read from it.
    #[arg(short, long, env = "CONTROLLER_CONFIG")]
    pub config: Option<PathBuf>,

    /// Database type (memory, cloudant)
    #[arg(long, env = "DATABASE_TYPE")]
    pub database_type: Option<String>,

    #[arg(long, env = "DATABASE_USERNAME")]
    pub database_username: Option<String>,

    #[arg(long, env = "DATABASE_PASSWORD", hide_env_values = true)]
    pub database_password: Option<String>,

    #[arg(long, env = "DATABASE_HOST")]
    pub database_host: Option<String>,

    /// API listener port
    #[arg(long, env = "API_PORT")]
    pub api_port: Option<u16>,

    #[arg(long, env = "CONTROL_TOKEN", hide_env_values = true)]
    pub control_token: Option<String>,

    /// Secret key (16 bytes)
    #[arg(long, env = "SECRET_KEY", hide_env_values = true)]
    pub secret_key: Option<String>,

    /// Metrics exporter address
    #[arg(long, env = "METRICS_HOST")]
    pub metrics_host: Option<String>,

    /// Reconciliation interval in milliseconds (0 disables polling)
    #[arg(long, env = "POLL_INTERVAL_MS")]
    pub poll_interval_ms: Option<u64>,

    #[arg(long, env = "LOG_LEVEL")]
    pub log_level: Option<String>,

    #[arg(long, env = "NGINX_TEMPLATE")]
    pub nginx_template: Option<PathBuf>,
}

impl CliArgs {
    /// Resolve the effective configuration: file (or defaults), then flags.
    pub fn into_config(self) -> Result<ControllerConfig, ConfigError> {
        let base = match &self.config {
            Some(path) => load_config(path)?,
            None => ControllerConfig::default(),
        };
        Ok(self.apply(base))
    }

    fn apply(self, mut config: ControllerConfig) -> ControllerConfig {
        if let Some(v) = self.database_type {
            config.database.kind = v;
        }
        if let Some(v) = self.database_username {
            config.database.username = v;
        }
        if let Some(v) = self.database_password {
            config.database.password = v;
        }
        if let Some(v) = self.database_host {
            config.database.host = v;
        }
        if let Some(v) = self.api_port {
            config.api_port = v;
        }
        if let Some(v) = self.control_token {
            config.control_token = v;
        }
        if let Some(v) = self.secret_key {
            config.secret_key = v;
        }
        if let Some(v) = self.metrics_host {
            config.metrics_host = v;
        }
        if let Some(v) = self.poll_interval_ms {
            config.poll_interval_ms = v;
        }
        if let Some(v) = self.log_level {
            config.log_level = v;
        }
        if let Some(v) = self.nginx_template {
            config.nginx_template = v;
        }
        config
    }
}
