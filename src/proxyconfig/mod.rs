//! Tenant proxy configuration management.

use std::sync::Arc;

use crate::notification::{Notification, TenantProducerCache};
use crate::storage::{Rules, StorageError, TenantConfig};

/// Reads and writes tenant proxy configuration, announcing every change.
pub struct ProxyConfigManager {
    rules: Arc<dyn Rules>,
    producers: Arc<TenantProducerCache>,
}

impl ProxyConfigManager {
    pub fn new(rules: Arc<dyn Rules>, producers: Arc<TenantProducerCache>) -> Self {
        Self { rules, producers }
    }

    pub fn create(&self, config: TenantConfig) -> Result<(), StorageError> {
        let id = config.id.clone();
        self.rules.create(config)?;
        self.producers.publish(&id, Notification::RulesChanged);
        Ok(())
    }

    pub fn get(&self, tenant_id: &str) -> Result<TenantConfig, StorageError> {
        self.rules.read(tenant_id)
    }

    /// Replace an existing tenant's configuration.
    pub fn set(&self, config: TenantConfig) -> Result<(), StorageError> {
        let id = config.id.clone();
        self.rules.update(config)?;
        self.producers.publish(&id, Notification::RulesChanged);
        Ok(())
    }

    pub fn delete(&self, tenant_id: &str) -> Result<(), StorageError> {
        self.rules.delete(tenant_id)?;
        self.producers.remove(tenant_id);
        Ok(())
    }

    pub fn list(&self) -> Result<Vec<String>, StorageError> {
        self.rules.list()
    }
}
