//! Stored tenant data.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A reachable instance of a service.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Endpoint {
    /// `host:port` of the instance.
    pub address: String,
    /// Registry tags; a version tag selects the upstream the instance joins.
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Service {
    pub name: String,
    pub endpoints: Vec<Endpoint>,
}

/// Services known for one tenant, as last observed in its registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceCatalog {
    pub tenant_id: String,
    pub services: Vec<Service>,
}

impl ServiceCatalog {
    pub fn empty(tenant_id: impl Into<String>) -> Self {
        Self {
            tenant_id: tenant_id.into(),
            services: Vec::new(),
        }
    }

    /// Build a catalog from `(service, endpoint)` pairs.
    ///
    /// Services and endpoints are sorted so two catalogs built from the same
    /// instances compare equal regardless of registry ordering.
    pub fn from_instances<I>(tenant_id: impl Into<String>, instances: I) -> Self
    where
        I: IntoIterator<Item = (String, Endpoint)>,
    {
        let mut grouped: BTreeMap<String, Vec<Endpoint>> = BTreeMap::new();
        for (service, endpoint) in instances {
            grouped.entry(service).or_default().push(endpoint);
        }

        let services = grouped
            .into_iter()
            .map(|(name, mut endpoints)| {
                for endpoint in &mut endpoints {
                    endpoint.tags.sort();
                }
                endpoints.sort();
                endpoints.dedup();
                Service { name, endpoints }
            })
            .collect();

        Self {
            tenant_id: tenant_id.into(),
            services,
        }
    }

    pub fn service(&self, name: &str) -> Option<&Service> {
        self.services.iter().find(|s| s.name == name)
    }
}

/// Where the checker finds a tenant's service registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryEndpoint {
    pub url: String,
    #[serde(default)]
    pub token: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadBalance {
    #[default]
    RoundRobin,
    LeastConn,
    IpHash,
}

/// Routes a service's default traffic to instances carrying a version tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionRule {
    pub service: String,
    pub default_version: String,
}

/// Proxy configuration for one tenant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenantConfig {
    pub id: String,
    pub registry: RegistryEndpoint,
    #[serde(default)]
    pub load_balance: LoadBalance,
    #[serde(default)]
    pub versions: Vec<VersionRule>,
}

impl TenantConfig {
    pub fn version_rule(&self, service: &str) -> Option<&VersionRule> {
        self.versions.iter().find(|rule| rule.service == service)
    }
}
