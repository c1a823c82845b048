//! Tenant change notifications.
//!
//! # Responsibilities
//! - Keep one producer per tenant that has pending configuration changes
//! - Publish catalog / rules change events to that tenant's sidecars
//! - Collect producers that have been idle past their TTL
//!
//! # Design Decisions
//! - Producers are created lazily on first publish
//! - GC runs on its own task and stops with the process `Shutdown`

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant};

use crate::lifecycle::Shutdown;

/// Kind of change announced to a tenant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notification {
    CatalogChanged,
    RulesChanged,
}

impl Notification {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::CatalogChanged => "catalog_changed",
            Self::RulesChanged => "rules_changed",
        }
    }
}

#[derive(Debug)]
struct Producer {
    last_used: Instant,
    published: u64,
}

/// Cache of per-tenant notification producers.
#[derive(Debug)]
pub struct TenantProducerCache {
    producers: DashMap<String, Producer>,
    idle_ttl: Duration,
}

impl TenantProducerCache {
    pub fn new(idle_ttl: Duration) -> Self {
        Self {
            producers: DashMap::new(),
            idle_ttl,
        }
    }

    /// Publish a change event for a tenant.
    pub fn publish(&self, tenant_id: &str, notification: Notification) {
        let mut producer = self
            .producers
            .entry(tenant_id.to_string())
            .or_insert_with(|| {
                tracing::debug!(tenant = %tenant_id, "Creating tenant producer");
                Producer {
                    last_used: Instant::now(),
                    published: 0,
                }
            });
        producer.last_used = Instant::now();
        producer.published += 1;

        tracing::info!(
            tenant = %tenant_id,
            event = notification.as_str(),
            sequence = producer.published,
            "Tenant notified"
        );
    }

    /// Events published through the tenant's current producer.
    pub fn published(&self, tenant_id: &str) -> u64 {
        self.producers
            .get(tenant_id)
            .map(|p| p.published)
            .unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.producers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.producers.is_empty()
    }

    /// Drop a tenant's producer immediately.
    pub fn remove(&self, tenant_id: &str) {
        self.producers.remove(tenant_id);
    }

    /// Remove producers idle for longer than the TTL as of `now`.
    pub fn evict_idle(&self, now: Instant) -> usize {
        let before = self.producers.len();
        self.producers
            .retain(|_, producer| now.saturating_duration_since(producer.last_used) < self.idle_ttl);
        before - self.producers.len()
    }

    /// Start collecting idle producers until `shutdown` fires.
    pub fn start_gc(self: &Arc<Self>, shutdown: Shutdown) -> JoinHandle<()> {
        let cache = Arc::clone(self);
        let sweep = (self.idle_ttl / 2).max(Duration::from_secs(1));

        tokio::spawn(async move {
            tracing::info!(sweep_secs = sweep.as_secs(), "Producer cache GC starting");
            let mut ticker = time::interval(sweep);
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let evicted = cache.evict_idle(Instant::now());
                        if evicted > 0 {
                            tracing::debug!(evicted, remaining = cache.len(), "Evicted idle producers");
                        }
                    }
                    _ = shutdown.wait() => {
                        tracing::info!("Producer cache GC received shutdown signal, exiting loop");
                        break;
                    }
                }
            }
        })
    }
}
