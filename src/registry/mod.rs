//! Service registry clients.
//!
//! # Responsibilities
//! - Fetch the instances a tenant has registered
//! - Bound every lookup so a reconciliation pass cannot hang
//!
//! # Design Decisions
//! - Object-safe trait (boxed futures) so bootstrap can choose the client
//! - Instances are returned as `(service, endpoint)` pairs; the checker owns
//!   the catalog shape

pub mod http;

use std::future::Future;
use std::pin::Pin;

use thiserror::Error;

use crate::storage::{Endpoint, RegistryEndpoint};

pub use http::HttpRegistry;

/// A registered instance: owning service name and its endpoint.
pub type Instance = (String, Endpoint);

pub type RegistryFuture<'a> =
    Pin<Box<dyn Future<Output = Result<Vec<Instance>, RegistryError>> + Send + 'a>>;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("failed to build registry client: {0}")]
    Client(#[source] reqwest::Error),
    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("registry at {url} returned status {status}")]
    Status { url: String, status: u16 },
    #[error("registry lookup at {url} timed out")]
    Timeout { url: String },
}

/// Source of truth for the instances registered by a tenant.
pub trait Registry: Send + Sync {
    fn instances<'a>(&'a self, endpoint: &'a RegistryEndpoint) -> RegistryFuture<'a>;
}
