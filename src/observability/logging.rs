//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the tracing subscriber once per process
//! - Map the configured log level onto an `EnvFilter`
//!
//! # Design Decisions
//! - `RUST_LOG` takes precedence over configuration
//! - An unknown level falls back to `debug` rather than failing startup

use tracing::Level;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Level used when the configured one cannot be parsed.
pub const FALLBACK_LEVEL: Level = Level::DEBUG;

/// Parse a configured log level, falling back to [`FALLBACK_LEVEL`].
///
/// Returns the level and whether the configured value was usable.
pub fn parse_level(configured: &str) -> (Level, bool) {
    match configured.trim().parse::<Level>() {
        Ok(level) => (level, true),
        Err(_) => (FALLBACK_LEVEL, false),
    }
}

/// Default filter directives for a level.
pub fn default_directives(level: Level) -> String {
    let level = level.as_str().to_ascii_lowercase();
    format!("proxy_controller={level},tower_http={level}")
}

/// Install the global subscriber.
pub fn init(configured_level: &str) {
    let (level, recognized) = parse_level(configured_level);

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_directives(level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    if !recognized {
        tracing::warn!(
            configured = %configured_level,
            fallback = %FALLBACK_LEVEL,
            "Unrecognized log level"
        );
    }
    tracing::info!(level = %level, "Logging initialized");
}
