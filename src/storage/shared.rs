//! Shared Store Handle
//!
//! `SharedStore` is a cheaply cloneable handle to one [`Store`] behind a
//! single mutex. Every operation takes that one lock for its whole duration,
//! so inserts, removals, lookups and listings on the same store are mutually
//! exclusive and no update can be lost or observed half-done.
//!
//! The same handle type is used whether the store is private to one session
//! or shared across every client. A private store simply never sees
//! contention.
//!
//! ```text
//! ┌──────────┐  ┌──────────┐  ┌──────────┐
//! │ worker 1 │  │ worker 2 │  │ worker N │
//! └────┬─────┘  └────┬─────┘  └────┬─────┘
//!      └─────────────┼─────────────┘
//!                    ▼
//!          ┌───────────────────┐
//!          │  Mutex<Store>     │
//!          └───────────────────┘
//! ```

use crate::storage::store::{InsertOutcome, KeysOutcome, LookupOutcome, RemoveOutcome, Store};
use parking_lot::Mutex;
use std::sync::Arc;

/// A thread-safe handle to a [`Store`].
///
/// Clones refer to the same store.
#[derive(Debug, Clone, Default)]
pub struct SharedStore {
    inner: Arc<Mutex<Store>>,
}

impl SharedStore {
    /// Creates a handle to a new, empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs `f` with exclusive access to the store.
    ///
    /// Use this when several operations must observe the same state.
    pub fn with<R>(&self, f: impl FnOnce(&mut Store) -> R) -> R {
        let mut store = self.inner.lock();
        f(&mut store)
    }

    pub fn insert(&self, key: &str, value: &str) -> InsertOutcome {
        self.with(|store| store.insert(key, value))
    }

    pub fn lookup(&self, key: &str) -> LookupOutcome {
        self.with(|store| store.lookup(key))
    }

    pub fn remove(&self, key: &str) -> RemoveOutcome {
        self.with(|store| store.remove(key))
    }

    pub fn list_keys(&self) -> KeysOutcome {
        self.with(|store| store.list_keys())
    }

    pub fn len(&self) -> usize {
        self.with(|store| store.len())
    }

    pub fn is_empty(&self) -> bool {
        self.with(|store| store.is_empty())
    }

    /// Returns true if both handles point at the same store.
    pub fn same_store(&self, other: &SharedStore) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_clones_share_state() {
        let store = SharedStore::new();
        let other = store.clone();

        store.insert("key", "value");
        assert_eq!(other.lookup("key"), LookupOutcome::Found("value".to_string()));
        assert!(store.same_store(&other));
        assert!(!store.same_store(&SharedStore::new()));
    }

    #[test]
    fn test_concurrent_distinct_inserts() {
        let store = SharedStore::new();
        let mut handles = vec![];

        // 16 writers x 16 keys = 256 distinct keys
        for i in 0..16 {
            let store = store.clone();
            handles.push(thread::spawn(move || {
                for j in 0..16 {
                    let key = format!("k{}x{}", i, j);
                    assert_eq!(store.insert(&key, "v"), InsertOutcome::Success);
                    let _ = store.list_keys();
                }
            }));
        }

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(store.len(), 256);
        for i in 0..16 {
            for j in 0..16 {
                let key = format!("k{}x{}", i, j);
                assert_eq!(store.lookup(&key), LookupOutcome::Found("v".to_string()));
            }
        }
    }

    #[test]
    fn test_concurrent_same_key_single_winner() {
        let store = SharedStore::new();
        let mut handles = vec![];

        for i in 0..32 {
            let store = store.clone();
            handles.push(thread::spawn(move || store.insert("race", &format!("v{}", i))));
        }

        let winners = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|outcome| *outcome == InsertOutcome::Success)
            .count();

        assert_eq!(winners, 1);
        assert_eq!(store.len(), 1);
    }
}
