//! Per-resource async locks with FIFO fairness.
//!
//! The registry hands out one `tokio::sync::Mutex` per resource ID (queue
//! or board). Tokio mutexes queue their waiters in arrival order and drop a
//! canceled waiter out of the queue without ever granting it the lock,
//! which is exactly the admission contract mutations need: first-come
//! first-served per queue, and a caller that gives up while waiting has no
//! effect.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

/// Registry of per-ID locks. Cloning shares the registry.
#[derive(Clone, Default)]
pub struct LockRegistry {
    // Sync mutex: held only for map lookup/insert, never across an await.
    locks: Arc<std::sync::Mutex<HashMap<Uuid, Arc<Mutex<()>>>>>,
}

impl LockRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn entry(&self, id: Uuid) -> Arc<Mutex<()>> {
        let mut map = self
            .locks
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        // A strong count of 1 means the map holds the only reference: no
        // guard out, no waiter parked. Dropping such entries keeps the
        // registry proportional to live contention, not lifetime traffic.
        map.retain(|entry_id, lock| *entry_id == id || Arc::strong_count(lock) > 1);
        map.entry(id).or_insert_with(|| Arc::new(Mutex::new(()))).clone()
    }

    /// Acquire the lock for one resource, waiting in FIFO order.
    pub async fn acquire(&self, id: Uuid) -> OwnedMutexGuard<()> {
        self.entry(id).lock_owned().await
    }

    /// Acquire locks for two resources in ascending ID order, so every
    /// caller takes any pair in the same sequence and pairs cannot
    /// deadlock. Returns one guard when both IDs are the same resource.
    pub async fn acquire_pair(&self, a: Uuid, b: Uuid) -> Vec<OwnedMutexGuard<()>> {
        if a == b {
            return vec![self.acquire(a).await];
        }
        let (first, second) = if a < b { (a, b) } else { (b, a) };
        let first_guard = self.acquire(first).await;
        let second_guard = self.acquire(second).await;
        vec![first_guard, second_guard]
    }

    /// Number of resources with a live entry (held, contended, or not yet
    /// pruned). Diagnostic only.
    pub fn len(&self) -> usize {
        self.locks
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn test_same_id_excludes() {
        let registry = LockRegistry::new();
        let id = Uuid::new_v4();

        let guard = registry.acquire(id).await;

        let registry2 = registry.clone();
        let contender = tokio::spawn(async move {
            let _g = registry2.acquire(id).await;
        });

        // Give the contender a chance to run; it must still be parked.
        tokio::task::yield_now().await;
        assert!(!contender.is_finished());

        drop(guard);
        contender.await.unwrap();
    }

    #[tokio::test]
    async fn test_different_ids_do_not_contend() {
        let registry = LockRegistry::new();
        let _a = registry.acquire(Uuid::new_v4()).await;
        let _b = registry.acquire(Uuid::new_v4()).await;
        assert_eq!(registry.len(), 2);
    }

    #[tokio::test]
    async fn test_waiters_are_served_in_arrival_order() {
        let registry = LockRegistry::new();
        let id = Uuid::new_v4();
        let order = Arc::new(std::sync::Mutex::new(Vec::new()));

        let gate = registry.acquire(id).await;

        let mut handles = Vec::new();
        for n in 0..5 {
            let registry = registry.clone();
            let order = order.clone();
            handles.push(tokio::spawn(async move {
                let _g = registry.acquire(id).await;
                order.lock().unwrap().push(n);
            }));
            // Park each waiter before spawning the next so arrival order
            // is deterministic.
            tokio::task::yield_now().await;
        }

        drop(gate);
        for handle in handles {
            handle.await.unwrap();
        }
        assert_eq!(*order.lock().unwrap(), vec![0, 1, 2, 3, 4]);
    }

    #[tokio::test]
    async fn test_pair_collapses_duplicate_ids() {
        let registry = LockRegistry::new();
        let id = Uuid::new_v4();
        let guards = registry.acquire_pair(id, id).await;
        assert_eq!(guards.len(), 1);
    }

    #[tokio::test]
    async fn test_pair_ordering_prevents_deadlock() {
        let registry = LockRegistry::new();
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let done = Arc::new(AtomicUsize::new(0));

        // Two tasks taking the same pair in opposite argument order; with
        // ascending acquisition both always finish.
        let mut handles = Vec::new();
        for (x, y) in [(a, b), (b, a)] {
            let registry = registry.clone();
            let done = done.clone();
            handles.push(tokio::spawn(async move {
                for _ in 0..100 {
                    let _guards = registry.acquire_pair(x, y).await;
                }
                done.fetch_add(1, Ordering::SeqCst);
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }
        assert_eq!(done.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_idle_entries_are_pruned() {
        let registry = LockRegistry::new();
        let stale = Uuid::new_v4();
        drop(registry.acquire(stale).await);

        // Held entries survive pruning; the released one does not.
        let held = Uuid::new_v4();
        let _guard = registry.acquire(held).await;
        assert_eq!(registry.len(), 1);
    }

    #[tokio::test]
    async fn test_abandoned_waiter_never_acquires() {
        let registry = LockRegistry::new();
        let id = Uuid::new_v4();

        let guard = registry.acquire(id).await;

        let registry2 = registry.clone();
        let abandoned = tokio::spawn(async move {
            let _g = registry2.acquire(id).await;
            unreachable!("aborted waiter must not acquire");
        });
        tokio::task::yield_now().await;
        abandoned.abort();
        assert!(abandoned.await.unwrap_err().is_cancelled());

        // The abandoned waiter left the queue; the next one gets through.
        drop(guard);
        let _next = registry.acquire(id).await;
    }
}
