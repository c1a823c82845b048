//! Control plane for per-tenant sidecar proxy configuration.

pub mod api;
pub mod checker;
pub mod config;
pub mod http;
pub mod lifecycle;
pub mod nginx;
pub mod notification;
pub mod observability;
pub mod proxyconfig;
pub mod reconcile;
pub mod registry;
pub mod storage;

pub use config::ControllerConfig;
pub use lifecycle::{run, Shutdown};
