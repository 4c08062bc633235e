//! Per-region API client cache.
//!
//! Each engine owns one cache. A region's client is built on first use and
//! reused for every later query; entries are never evicted. Moka's
//! `get_with` runs the constructor at most once per key even when several
//! region tasks miss the same key at the same moment (duplicate regions in
//! the caller's list), so no extra locking is needed here.

use moka::sync::Cache;
use std::sync::Arc;

/// Builds a client bound to one region
pub type ClientFactory<A> = Arc<dyn Fn(&str) -> Arc<A> + Send + Sync>;

pub struct RegionClientCache<A: ?Sized + Send + Sync + 'static> {
    clients: Cache<String, Arc<A>>,
    factory: ClientFactory<A>,
}

impl<A: ?Sized + Send + Sync + 'static> Clone for RegionClientCache<A> {
    fn clone(&self) -> Self {
        Self {
            clients: self.clients.clone(),
            factory: Arc::clone(&self.factory),
        }
    }
}

impl<A: ?Sized + Send + Sync + 'static> RegionClientCache<A> {
    /// Create an empty cache sized for `capacity_hint` regions
    pub fn new(capacity_hint: usize, factory: ClientFactory<A>) -> Self {
        Self {
            clients: Cache::builder()
                .initial_capacity(capacity_hint)
                .build(),
            factory,
        }
    }

    /// Return the client for `region`, constructing it on first use.
    pub fn get_or_create(&self, region: &str) -> Arc<A> {
        if let Some(client) = self.clients.get(region) {
            trace_trace!("client cache hit for region {}", region);
            return client;
        }

        self.clients.get_with(region.to_string(), || {
            trace_debug!("client cache miss, building client for region {}", region);
            (self.factory)(region)
        })
    }

    /// Place a ready-made client for `region`, replacing any existing one
    pub fn insert(&self, region: &str, client: Arc<A>) {
        self.clients.insert(region.to_string(), client);
    }

    pub fn contains(&self, region: &str) -> bool {
        self.clients.contains_key(region)
    }
}
