//! Sidecar proxy configuration generation.
//!
//! # Data Flow
//! ```text
//! template file (loaded once at bootstrap)
//!     + tenant catalog (checker)
//!     + tenant rules (proxyconfig manager)
//!     → generator.rs (render upstreams & locations)
//!     → any `io::Write` sink (HTTP response body, file)
//! ```

pub mod generator;

use std::io::Write;
use std::path::PathBuf;

use thiserror::Error;

use crate::storage::StorageError;

pub use generator::NginxGenerator;

#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("failed to load template {path}: {source}")]
    TemplateIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("template {path} is missing the {placeholder} placeholder")]
    TemplatePlaceholder {
        path: PathBuf,
        placeholder: &'static str,
    },
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error("failed to write configuration: {0}")]
    Write(#[from] std::io::Error),
}

/// Renders proxy configuration for one tenant into a sink.
///
/// On error the sink may hold partial output. Rendering the same id twice
/// with no state change in between produces equivalent content.
pub trait Generator: Send + Sync {
    fn generate(&self, sink: &mut dyn Write, id: &str) -> Result<(), GenerateError>;
}
