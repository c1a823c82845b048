//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (ports, key lengths)
//! - Check backend-specific requirements (cloudant credentials)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ControllerConfig → Result<(), Vec<ValidationError>>
//! - Runs as the first bootstrap step, after the listener is already up

use thiserror::Error;
use url::Url;

use crate::config::schema::ControllerConfig;

/// Required length of the secret key, in bytes.
pub const SECRET_KEY_LEN: usize = 16;

/// Supported values for `database.type`.
pub const DATABASE_KINDS: &[&str] = &["memory", "cloudant"];

/// A single failed validation rule.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

fn require_non_empty(errors: &mut Vec<ValidationError>, field: &'static str, value: &str) {
    if value.trim().is_empty() {
        errors.push(ValidationError::new(field, "must not be empty"));
    }
}

/// Validate a loaded configuration.
pub fn validate_config(config: &ControllerConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let kind = config.database.kind.as_str();
    require_non_empty(&mut errors, "database.type", kind);
    if !kind.is_empty() && !DATABASE_KINDS.contains(&kind) {
        errors.push(ValidationError::new(
            "database.type",
            format!("invalid database type {kind:?}"),
        ));
    }

    if kind == "cloudant" {
        require_non_empty(&mut errors, "database.username", &config.database.username);
        require_non_empty(&mut errors, "database.password", &config.database.password);
        require_non_empty(&mut errors, "database.host", &config.database.host);
        if let Some(Err(e)) = normalize_database_host(&config.database.host) {
            errors.push(ValidationError::new(
                "database.host",
                format!("invalid host {:?}: {e}", config.database.host),
            ));
        }
    }

    if config.api_port == 0 {
        errors.push(ValidationError::new("api_port", "must be in range 1-65535"));
    }

    require_non_empty(&mut errors, "control_token", &config.control_token);
    require_non_empty(&mut errors, "secret_key", &config.secret_key);
    require_non_empty(&mut errors, "metrics_host", &config.metrics_host);

    let secret_len = config.secret_key.len();
    if !config.secret_key.is_empty() && secret_len != SECRET_KEY_LEN {
        errors.push(ValidationError::new(
            "secret_key",
            format!("must have a length of {SECRET_KEY_LEN} bytes, got {secret_len}"),
        ));
    }

    if config.nginx_template.as_os_str().is_empty() {
        errors.push(ValidationError::new("nginx_template", "must not be empty"));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Normalize a database host into an absolute URL, defaulting to HTTPS.
///
/// Returns `None` for an empty host.
pub fn normalize_database_host(host: &str) -> Option<Result<Url, url::ParseError>> {
    let host = host.trim();
    if host.is_empty() {
        return None;
    }
    if host.contains("://") {
        Some(Url::parse(host))
    } else {
        Some(Url::parse(&format!("https://{host}")))
    }
}
