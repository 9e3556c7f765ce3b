//! Write Coordination Module
//!
//! Strategies for isolating the read-modify-write sequences of `set`, `add`
//! and `replace` on a single storage key.

use std::collections::HashSet;
use std::sync::{Condvar, Mutex, MutexGuard};

use tracing::trace;

/// Marker for values held for the duration of a guarded operation.
///
/// Dropping the lease releases whatever the strategy acquired.
pub trait Lease {}

impl<T> Lease for T {}

// == Write Coordinator Trait ==
/// Decides how concurrent writers to the same storage key are isolated.
pub trait WriteCoordinator: Send + Sync {
    /// Acquires exclusive access to `storage_key` until the lease is dropped.
    fn acquire<'a>(&'a self, storage_key: &str) -> Box<dyn Lease + 'a>;
}

// == Unguarded ==
/// Performs no coordination. Concurrent writers on one key may race.
#[derive(Debug, Default, Clone, Copy)]
pub struct Unguarded;

impl WriteCoordinator for Unguarded {
    fn acquire<'a>(&'a self, _storage_key: &str) -> Box<dyn Lease + 'a> {
        Box::new(())
    }
}

// == Keyed Locks ==
/// Process-local mutual exclusion per storage key.
#[derive(Debug, Default)]
pub struct KeyedLocks {
    held: Mutex<HashSet<String>>,
    released: Condvar,
}

impl KeyedLocks {
    /// Creates an empty lock table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true while some caller holds `storage_key`.
    pub fn is_held(&self, storage_key: &str) -> bool {
        self.table().contains(storage_key)
    }

    fn table(&self) -> MutexGuard<'_, HashSet<String>> {
        // The set is only mutated by insert/remove, so it is consistent even
        // after a panic in another holder.
        self.held.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl WriteCoordinator for KeyedLocks {
    fn acquire<'a>(&'a self, storage_key: &str) -> Box<dyn Lease + 'a> {
        let mut held = self.table();
        while held.contains(storage_key) {
            trace!(storage_key, "waiting for key guard");
            held = self
                .released
                .wait(held)
                .unwrap_or_else(|poisoned| poisoned.into_inner());
        }
        held.insert(storage_key.to_string());

        Box::new(KeyLease {
            owner: self,
            storage_key: storage_key.to_string(),
        })
    }
}

struct KeyLease<'a> {
    owner: &'a KeyedLocks,
    storage_key: String,
}

impl Drop for KeyLease<'_> {
    fn drop(&mut self) {
        self.owner.table().remove(&self.storage_key);
        self.owner.released.notify_all();
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_unguarded_never_blocks() {
        let coordinator = Unguarded;
        let _first = coordinator.acquire("key");
        let _second = coordinator.acquire("key");
    }

    #[test]
    fn test_lease_releases_on_drop() {
        let locks = KeyedLocks::new();
        {
            let _lease = locks.acquire("key");
            assert!(locks.is_held("key"));
        }
        assert!(!locks.is_held("key"));
    }

    #[test]
    fn test_distinct_keys_do_not_conflict() {
        let locks = KeyedLocks::new();
        let _a = locks.acquire("a");
        let _b = locks.acquire("b");
        assert!(locks.is_held("a"));
        assert!(locks.is_held("b"));
    }

    #[test]
    fn test_same_key_is_exclusive() {
        let locks = Arc::new(KeyedLocks::new());
        let inside = Arc::new(AtomicUsize::new(0));
        let max_inside = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let locks = Arc::clone(&locks);
                let inside = Arc::clone(&inside);
                let max_inside = Arc::clone(&max_inside);
                thread::spawn(move || {
                    let _lease = locks.acquire("shared");
                    let now = inside.fetch_add(1, Ordering::SeqCst) + 1;
                    max_inside.fetch_max(now, Ordering::SeqCst);
                    thread::sleep(Duration::from_millis(5));
                    inside.fetch_sub(1, Ordering::SeqCst);
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(max_inside.load(Ordering::SeqCst), 1);
        assert!(!locks.is_held("shared"));
    }
}
