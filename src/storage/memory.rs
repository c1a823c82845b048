//! In-memory storage backend.

use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use crate::storage::types::{ServiceCatalog, TenantConfig};
use crate::storage::{Catalog, Rules, StorageError};

/// A thread-safe keyed store of tenant records.
#[derive(Debug)]
pub struct MemoryStore<T> {
    inner: Arc<DashMap<String, T>>,
}

impl<T> Clone for MemoryStore<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> Default for MemoryStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> MemoryStore<T> {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(DashMap::new()),
        }
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl<T: Clone> MemoryStore<T> {
    fn insert_new(&self, key: String, value: T) -> Result<(), StorageError> {
        match self.inner.entry(key) {
            Entry::Occupied(entry) => Err(StorageError::Conflict(entry.key().clone())),
            Entry::Vacant(entry) => {
                entry.insert(value);
                Ok(())
            }
        }
    }

    fn get(&self, key: &str) -> Result<T, StorageError> {
        self.inner
            .get(key)
            .map(|r| r.value().clone())
            .ok_or_else(|| StorageError::NotFound(key.to_string()))
    }

    fn replace(&self, key: &str, value: T) -> Result<(), StorageError> {
        match self.inner.get_mut(key) {
            Some(mut slot) => {
                *slot = value;
                Ok(())
            }
            None => Err(StorageError::NotFound(key.to_string())),
        }
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.inner
            .remove(key)
            .map(|_| ())
            .ok_or_else(|| StorageError::NotFound(key.to_string()))
    }

    fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.inner.iter().map(|r| r.key().clone()).collect();
        keys.sort();
        keys
    }
}

impl Catalog for MemoryStore<ServiceCatalog> {
    fn create(&self, catalog: ServiceCatalog) -> Result<(), StorageError> {
        self.insert_new(catalog.tenant_id.clone(), catalog)
    }

    fn read(&self, tenant_id: &str) -> Result<ServiceCatalog, StorageError> {
        self.get(tenant_id)
    }

    fn update(&self, catalog: ServiceCatalog) -> Result<(), StorageError> {
        let key = catalog.tenant_id.clone();
        self.replace(&key, catalog)
    }

    fn delete(&self, tenant_id: &str) -> Result<(), StorageError> {
        self.remove(tenant_id)
    }

    fn list(&self) -> Result<Vec<String>, StorageError> {
        Ok(self.keys())
    }
}

impl Rules for MemoryStore<TenantConfig> {
    fn create(&self, config: TenantConfig) -> Result<(), StorageError> {
        self.insert_new(config.id.clone(), config)
    }

    fn read(&self, tenant_id: &str) -> Result<TenantConfig, StorageError> {
        self.get(tenant_id)
    }

    fn update(&self, config: TenantConfig) -> Result<(), StorageError> {
        let key = config.id.clone();
        self.replace(&key, config)
    }

    fn delete(&self, tenant_id: &str) -> Result<(), StorageError> {
        self.remove(tenant_id)
    }

    fn list(&self) -> Result<Vec<String>, StorageError> {
        Ok(self.keys())
    }
}
