//! Store Registry
//!
//! Binds a client identity to the store it should use. A client is
//! identified by its socket address: the peer of a TCP connection, or the
//! source address and port of a UDP datagram.
//!
//! - [`StoreScope::Shared`]: every client gets a handle to the same store,
//!   which lives as long as the registry.
//! - [`StoreScope::PerClient`]: each client gets its own store on first
//!   contact. [`StoreRegistry::release`] drops it when the client leaves.
//!
//! A datagram peer never signals that it has left unless it sends QUIT, so
//! per-client entries also record when they were last used and
//! [`StoreRegistry::evict_idle`] drops the ones that have gone quiet.

use crate::config::StoreScope;
use crate::storage::SharedStore;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::time::{Duration, Instant};

/// A private store and the last time its client used it.
#[derive(Debug)]
struct ClientEntry {
    store: SharedStore,
    last_seen: Instant,
}

/// Maps clients to stores according to a [`StoreScope`].
#[derive(Debug)]
pub struct StoreRegistry {
    scope: StoreScope,
    /// The process-wide store, used under `StoreScope::Shared`
    shared: SharedStore,
    /// Live per-client stores, used under `StoreScope::PerClient`
    clients: Mutex<HashMap<SocketAddr, ClientEntry>>,
}

impl StoreRegistry {
    pub fn new(scope: StoreScope) -> Self {
        Self {
            scope,
            shared: SharedStore::new(),
            clients: Mutex::new(HashMap::new()),
        }
    }

    pub fn scope(&self) -> StoreScope {
        self.scope
    }

    /// Returns the store `client` should use, creating it if needed.
    ///
    /// Under `PerClient` this also marks the client as seen now.
    pub fn acquire(&self, client: SocketAddr) -> SharedStore {
        match self.scope {
            StoreScope::Shared => self.shared.clone(),
            StoreScope::PerClient => {
                let now = Instant::now();
                let mut clients = self.clients.lock();
                let entry = clients.entry(client).or_insert_with(|| ClientEntry {
                    store: SharedStore::new(),
                    last_seen: now,
                });
                entry.last_seen = now;
                entry.store.clone()
            }
        }
    }

    /// Forgets `client`'s private store. Returns true if one was dropped.
    ///
    /// The shared store is never released.
    pub fn release(&self, client: &SocketAddr) -> bool {
        match self.scope {
            StoreScope::Shared => false,
            StoreScope::PerClient => self.clients.lock().remove(client).is_some(),
        }
    }

    /// Drops every private store not acquired within `max_idle`.
    /// Returns how many were dropped.
    pub fn evict_idle(&self, max_idle: Duration) -> usize {
        let now = Instant::now();
        let mut clients = self.clients.lock();
        let before = clients.len();
        clients.retain(|_, entry| now.duration_since(entry.last_seen) < max_idle);
        before - clients.len()
    }

    /// Number of clients currently holding a private store.
    pub fn client_count(&self) -> usize {
        self.clients.lock().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(port: u16) -> SocketAddr {
        SocketAddr::from(([127, 0, 0, 1], port))
    }

    #[test]
    fn test_shared_scope() {
        let registry = StoreRegistry::new(StoreScope::Shared);

        let a = registry.acquire(addr(1000));
        let b = registry.acquire(addr(2000));
        assert!(a.same_store(&b));

        assert!(!registry.release(&addr(1000)));
        assert!(a.same_store(&registry.acquire(addr(3000))));
        assert_eq!(registry.client_count(), 0);
    }

    #[test]
    fn test_per_client_scope() {
        let registry = StoreRegistry::new(StoreScope::PerClient);

        let a = registry.acquire(addr(1000));
        let b = registry.acquire(addr(2000));
        assert!(!a.same_store(&b));
        assert!(a.same_store(&registry.acquire(addr(1000))));
        assert_eq!(registry.client_count(), 2);

        a.insert("key", "value");
        assert!(registry.release(&addr(1000)));
        assert!(!registry.release(&addr(1000)));

        let fresh = registry.acquire(addr(1000));
        assert!(fresh.is_empty());
    }

    #[test]
    fn test_one_shot_clients_are_evicted() {
        let registry = StoreRegistry::new(StoreScope::PerClient);

        for port in 1..=1000 {
            registry.acquire(addr(port));
        }
        assert_eq!(registry.client_count(), 1000);

        // Nothing is idle for an hour yet
        assert_eq!(registry.evict_idle(Duration::from_secs(3600)), 0);

        std::thread::sleep(Duration::from_millis(20));
        assert_eq!(registry.evict_idle(Duration::from_millis(10)), 1000);
        assert_eq!(registry.client_count(), 0);
    }

    #[test]
    fn test_acquire_refreshes_last_seen() {
        let registry = StoreRegistry::new(StoreScope::PerClient);

        registry.acquire(addr(1000));
        registry.acquire(addr(2000));
        std::thread::sleep(Duration::from_millis(60));
        registry.acquire(addr(1000));

        assert_eq!(registry.evict_idle(Duration::from_millis(40)), 1);
        assert_eq!(registry.client_count(), 1);
        assert!(!registry.release(&addr(2000)));
        assert!(registry.release(&addr(1000)));
    }

    #[test]
    fn test_shared_store_never_evicted() {
        let registry = StoreRegistry::new(StoreScope::Shared);
        registry.acquire(addr(1000)).insert("key", "value");

        assert_eq!(registry.evict_idle(Duration::ZERO), 0);
        assert_eq!(registry.acquire(addr(2000)).len(), 1);
    }
}
