//! Registry of live client connections.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;

use super::client::{ClientHandle, ClientId};

/// Shared registry of every connected client.
///
/// A single registry-wide `parking_lot::Mutex` guards the map so that a
/// snapshot never observes a half-applied join or leave. The lock is held for
/// one map operation at a time and never across a delivery.
pub struct ClientRegistry {
    clients: Mutex<BTreeMap<ClientId, ClientHandle>>,
    next_id: AtomicU64,
}

impl ClientRegistry {
    pub fn new() -> Self {
        Self {
            clients: Mutex::new(BTreeMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Allocate a fresh identifier. Identifiers are never handed out twice.
    pub fn next_id(&self) -> ClientId {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    /// Register a client. An existing entry under the same id is replaced.
    pub fn register(&self, id: ClientId, handle: ClientHandle) {
        self.clients.lock().insert(id, handle);
    }

    /// Remove a client. No-op if it is not registered.
    pub fn unregister(&self, id: ClientId) {
        self.clients.lock().remove(&id);
    }

    /// Remove a client only if `handle` is the one currently registered.
    ///
    /// Returns `true` if an entry was removed.
    pub fn unregister_handle(&self, id: ClientId, handle: &ClientHandle) -> bool {
        let mut clients = self.clients.lock();
        match clients.get(&id) {
            Some(current) if current.same_client(handle) => {
                clients.remove(&id);
                true
            }
            _ => false,
        }
    }

    /// Point-in-time copy of every registered client, ordered by id.
    pub fn snapshot(&self) -> Vec<(ClientId, ClientHandle)> {
        self.clients
            .lock()
            .iter()
            .map(|(id, handle)| (*id, handle.clone()))
            .collect()
    }

    #[cfg(test)]
    pub fn contains(&self, id: ClientId) -> bool {
        self.clients.lock().contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.clients.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.lock().is_empty()
    }
}

impl Default for ClientRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;

    use super::*;

    #[test]
    fn ids_are_unique() {
        let registry = ClientRegistry::new();
        let a = registry.next_id();
        let b = registry.next_id();
        assert_ne!(a, b);
    }

    #[test]
    fn register_and_unregister() {
        let registry = ClientRegistry::new();
        let (handle, _rx) = ClientHandle::channel();
        let id = registry.next_id();

        registry.register(id, handle);
        assert!(registry.contains(id));
        assert_eq!(registry.len(), 1);

        registry.unregister(id);
        assert!(!registry.contains(id));
        assert!(registry.is_empty());

        // Removing again is a no-op.
        registry.unregister(id);
        assert!(registry.is_empty());
    }

    #[test]
    fn register_existing_id_overwrites() {
        let registry = ClientRegistry::new();
        let (old, _old_rx) = ClientHandle::channel();
        let (new, _new_rx) = ClientHandle::channel();

        registry.register(7, old);
        registry.register(7, new.clone());

        let snapshot = registry.snapshot();
        assert_eq!(snapshot.len(), 1);
        assert!(snapshot[0].1.same_client(&new));
    }

    #[test]
    fn unregister_handle_ignores_stale_handle() {
        let registry = ClientRegistry::new();
        let (old, _old_rx) = ClientHandle::channel();
        let (new, _new_rx) = ClientHandle::channel();

        registry.register(3, old.clone());
        registry.register(3, new.clone());

        assert!(!registry.unregister_handle(3, &old));
        assert!(registry.contains(3));

        assert!(registry.unregister_handle(3, &new));
        assert!(!registry.contains(3));
    }

    #[test]
    fn snapshot_excludes_later_joins() {
        let registry = ClientRegistry::new();
        let (first, _rx1) = ClientHandle::channel();
        registry.register(registry.next_id(), first);

        let snapshot = registry.snapshot();

        let (second, _rx2) = ClientHandle::channel();
        registry.register(registry.next_id(), second);

        assert_eq!(snapshot.len(), 1);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn snapshot_is_ordered_by_id() {
        let registry = ClientRegistry::new();
        for id in [5, 1, 3] {
            let (handle, _rx) = ClientHandle::channel();
            registry.register(id, handle);
        }
        let ids: Vec<ClientId> = registry.snapshot().into_iter().map(|(id, _)| id).collect();
        assert_eq!(ids, vec![1, 3, 5]);
    }

    #[test]
    fn concurrent_joins_and_leaves_settle() {
        let registry = Arc::new(ClientRegistry::new());

        let workers: Vec<_> = (0..8)
            .map(|_| {
                let registry = Arc::clone(&registry);
                thread::spawn(move || {
                    for _ in 0..100 {
                        let (handle, _rx) = ClientHandle::channel();
                        let id = registry.next_id();
                        registry.register(id, handle);
                        let _ = registry.snapshot();
                        registry.unregister(id);
                    }
                })
            })
            .collect();

        for worker in workers {
            worker.join().unwrap();
        }
        assert!(registry.is_empty());
    }
}
