//! Tenant catalog and rules persistence.
//!
//! # Data Flow
//! ```text
//! Registry instances ──▶ checker ──▶ Catalog (per-tenant service catalog)
//! Tenant API ──▶ proxyconfig manager ──▶ Rules (per-tenant proxy config)
//!
//! Both stores are read by the NGINX generator.
//! ```
//!
//! # Design Decisions
//! - Stores are trait objects so bootstrap picks the backend at runtime
//! - Reads return owned values; no lock is held across an await point
//! - Only the in-memory backend ships; other kinds fail bootstrap

pub mod memory;
pub mod types;

use std::sync::Arc;

use thiserror::Error;

pub use memory::MemoryStore;
pub use types::{Endpoint, LoadBalance, RegistryEndpoint, Service, ServiceCatalog, TenantConfig, VersionRule};

/// Errors reported by a storage backend.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StorageError {
    #[error("tenant {0} not found")]
    NotFound(String),
    #[error("tenant {0} already exists")]
    Conflict(String),
    #[error("unsupported database type {0:?}")]
    UnsupportedBackend(String),
}

/// Per-tenant service catalogs.
pub trait Catalog: Send + Sync {
    fn create(&self, catalog: ServiceCatalog) -> Result<(), StorageError>;
    fn read(&self, tenant_id: &str) -> Result<ServiceCatalog, StorageError>;
    fn update(&self, catalog: ServiceCatalog) -> Result<(), StorageError>;
    fn delete(&self, tenant_id: &str) -> Result<(), StorageError>;
    /// Tenant ids in ascending order.
    fn list(&self) -> Result<Vec<String>, StorageError>;
}

/// Per-tenant proxy configuration.
pub trait Rules: Send + Sync {
    fn create(&self, config: TenantConfig) -> Result<(), StorageError>;
    fn read(&self, tenant_id: &str) -> Result<TenantConfig, StorageError>;
    fn update(&self, config: TenantConfig) -> Result<(), StorageError>;
    fn delete(&self, tenant_id: &str) -> Result<(), StorageError>;
    fn list(&self) -> Result<Vec<String>, StorageError>;
}

/// The pair of stores constructed by the storage bootstrap step.
#[derive(Clone)]
pub struct Storage {
    pub catalog: Arc<dyn Catalog>,
    pub rules: Arc<dyn Rules>,
}

impl Storage {
    /// Two independent in-memory stores.
    pub fn memory() -> Self {
        Self {
            catalog: Arc::new(MemoryStore::<ServiceCatalog>::new()),
            rules: Arc::new(MemoryStore::<TenantConfig>::new()),
        }
    }

    /// Build the stores for a configured database type.
    pub fn for_kind(kind: &str) -> Result<Self, StorageError> {
        match kind {
            "memory" => Ok(Self::memory()),
            other => Err(StorageError::UnsupportedBackend(other.to_string())),
        }
    }
}
