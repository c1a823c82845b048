//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, optional)
//!     → loader.rs (parse & deserialize)
//!     → args.rs (flag / environment overrides)
//!     → ControllerConfig (immutable)
//!     → validation.rs (first bootstrap step)
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded
//! - All fields have defaults to allow minimal configs
//! - Validation is deferred to bootstrap so failures surface over HTTP

pub mod args;
pub mod loader;
pub mod schema;
pub mod validation;

pub use args::CliArgs;
pub use loader::ConfigError;
pub use schema::{ControllerConfig, DatabaseConfig};
pub use validation::{validate_config, ValidationError};
