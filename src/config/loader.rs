//! Configuration loading from disk.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::config::schema::ControllerConfig;

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Load configuration from a TOML file.
///
/// Only syntax is checked here. Semantic validation runs during bootstrap so
/// that an invalid configuration is reported over HTTP instead of exiting.
pub fn load_config(path: &Path) -> Result<ControllerConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_config(path, &content)
}

fn parse_config(path: &Path, content: &str) -> Result<ControllerConfig, ConfigError> {
    toml::from_str(content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_file_keeps_defaults() {
        let content = r#"
            api_port = 9000
            poll_interval_ms = 0

            [database]
            type = "cloudant"
            host = "db.example.com"
        "#;
        let config = parse_config(Path::new("controller.toml"), content).unwrap();
        assert_eq!(config.api_port, 9000);
        assert_eq!(config.poll_interval_ms, 0);
        assert_eq!(config.database.kind, "cloudant");
        assert_eq!(config.log_level, "info");
        assert_eq!(config.registry_timeout_secs, 5);
    }

    #[test]
    fn test_parse_error_names_file() {
        let err = parse_config(Path::new("broken.toml"), "api_port = \"x\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert!(err.to_string().contains("broken.toml"));
    }

    #[test]
    fn test_missing_file() {
        let err = load_config(Path::new("/nonexistent/controller.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
