//! Catalog consistency checking.
//!
//! # Responsibilities
//! - Register and deregister tenant catalogs
//! - Re-read each tenant's registry and rebuild its service catalog
//! - Persist and announce catalogs that drifted from the registry
//!
//! # Design Decisions
//! - One tenant failing does not stop the pass for the others
//! - Every registry lookup is bounded by a timeout
//! - The pass returns an error when any tenant failed, so the caller logs it

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::time;

use crate::notification::{Notification, TenantProducerCache};
use crate::proxyconfig::ProxyConfigManager;
use crate::registry::{Registry, RegistryError};
use crate::storage::{Catalog, ServiceCatalog, StorageError};

#[derive(Debug, Error)]
pub enum CheckError {
    #[error("failed to enumerate tenants: {0}")]
    Enumerate(#[source] StorageError),
    #[error("tenant {tenant}: {source}")]
    Storage {
        tenant: String,
        #[source]
        source: StorageError,
    },
    #[error("tenant {tenant}: registry lookup failed: {source}")]
    Registry {
        tenant: String,
        #[source]
        source: RegistryError,
    },
    #[error("{} tenants failed consistency check; first: {}", .0.len(), first_failure(.0))]
    Multiple(Vec<CheckError>),
}

fn first_failure(errors: &[CheckError]) -> String {
    errors.first().map(ToString::to_string).unwrap_or_default()
}

/// One consistency pass over downstream proxy configuration.
///
/// `selector` restricts the pass to the given tenants; `None` checks all.
pub trait ConsistencyCheck: Send + Sync {
    fn check(
        &self,
        selector: Option<&[String]>,
    ) -> impl Future<Output = Result<(), CheckError>> + Send;
}

pub struct Checker {
    catalog: Arc<dyn Catalog>,
    proxy_config: Arc<ProxyConfigManager>,
    registry: Arc<dyn Registry>,
    producers: Arc<TenantProducerCache>,
    registry_timeout: Duration,
}

impl Checker {
    pub fn new(
        catalog: Arc<dyn Catalog>,
        proxy_config: Arc<ProxyConfigManager>,
        registry: Arc<dyn Registry>,
        producers: Arc<TenantProducerCache>,
        registry_timeout: Duration,
    ) -> Self {
        Self {
            catalog,
            proxy_config,
            registry,
            producers,
            registry_timeout,
        }
    }

    /// Start tracking a tenant with an empty catalog.
    pub fn register(&self, tenant_id: &str) -> Result<(), StorageError> {
        self.catalog.create(ServiceCatalog::empty(tenant_id))
    }

    pub fn deregister(&self, tenant_id: &str) -> Result<(), StorageError> {
        self.catalog.delete(tenant_id)
    }

    /// The last catalog recorded for a tenant.
    pub fn catalog(&self, tenant_id: &str) -> Result<ServiceCatalog, StorageError> {
        self.catalog.read(tenant_id)
    }

    /// Returns whether the stored catalog changed.
    async fn check_tenant(&self, tenant_id: &str) -> Result<bool, CheckError> {
        let storage_err = |source| CheckError::Storage {
            tenant: tenant_id.to_string(),
            source,
        };
        let registry_err = |source| CheckError::Registry {
            tenant: tenant_id.to_string(),
            source,
        };

        let tenant = self.proxy_config.get(tenant_id).map_err(storage_err)?;
        let lookup = self.registry.instances(&tenant.registry);
        let instances = match time::timeout(self.registry_timeout, lookup).await {
            Ok(result) => result.map_err(registry_err)?,
            Err(_) => {
                return Err(registry_err(RegistryError::Timeout {
                    url: tenant.registry.url.clone(),
                }))
            }
        };

        let fresh = ServiceCatalog::from_instances(tenant_id, instances);
        let current = self.catalog.read(tenant_id).map_err(storage_err)?;
        if current == fresh {
            return Ok(false);
        }

        tracing::debug!(
            tenant = %tenant_id,
            services = fresh.services.len(),
            "Catalog drifted from registry"
        );
        self.catalog.update(fresh).map_err(storage_err)?;
        self.producers.publish(tenant_id, Notification::CatalogChanged);
        Ok(true)
    }
}

impl ConsistencyCheck for Checker {
    async fn check(&self, selector: Option<&[String]>) -> Result<(), CheckError> {
        let tenants = match selector {
            Some(ids) => ids.to_vec(),
            None => self.catalog.list().map_err(CheckError::Enumerate)?,
        };

        let mut failures = Vec::new();
        let mut changed = 0usize;
        for tenant_id in &tenants {
            match self.check_tenant(tenant_id).await {
                Ok(true) => changed += 1,
                Ok(false) => {}
                Err(e) => {
                    tracing::warn!(tenant = %tenant_id, error = %e, "Tenant consistency check failed");
                    failures.push(e);
                }
            }
        }

        tracing::debug!(
            tenants = tenants.len(),
            changed,
            failed = failures.len(),
            "Consistency check finished"
        );

        match failures.len() {
            0 => Ok(()),
            1 => Err(failures.remove(0)),
            _ => Err(CheckError::Multiple(failures)),
        }
    }
}
