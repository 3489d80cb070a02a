//! Deadlock-free multi-key locking over fabricated paths (spec.md §4.2).
//!
//! Every operation that touches more than one path (MOVE, COPY) locks
//! all of its paths at once, always in sorted order, so two concurrent
//! multi-path operations can never hold-and-wait on each other in
//! opposite orders. Each key's wait queue is a chain of "tail promise"
//! gates: acquiring a key means waiting on whichever `Notify` the
//! previous holder left behind, then installing a fresh one for the
//! next waiter.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, Notify};

use crate::path::Path;

#[derive(Default)]
struct Gates {
    tails: HashMap<Path, Arc<Notify>>,
}

/// Holds guards for every path locked by one operation. Dropping it
/// releases all of them, in reverse acquisition order.
pub struct LockGuard {
    notifies: Vec<Arc<Notify>>,
}

impl Drop for LockGuard {
    fn drop(&mut self) {
        for n in self.notifies.drain(..).rev() {
            n.notify_one();
        }
    }
}

#[derive(Default)]
pub struct PathLock {
    gates: Mutex<Gates>,
}

impl PathLock {
    pub fn new() -> PathLock {
        PathLock::default()
    }

    /// Lock every path in `paths`, sorted first so that no two callers
    /// can ever acquire the same two keys in opposite orders. Paths
    /// that repeat (MOVE to a path that equals the source's child, for
    /// instance) are deduplicated so a single call can't wait on itself.
    pub async fn lock_all(&self, paths: &[Path]) -> LockGuard {
        let mut sorted: Vec<Path> = paths.to_vec();
        sorted.sort_by(|a, b| a.display_path().cmp(&b.display_path()));
        sorted.dedup();

        let mut held = Vec::with_capacity(sorted.len());
        for path in &sorted {
            held.push(self.acquire(path).await);
        }
        LockGuard { notifies: held }
    }

    pub async fn lock_one(&self, path: &Path) -> LockGuard {
        self.lock_all(std::slice::from_ref(path)).await
    }

    /// Wait for the current tail at `path` (if any), then install a
    /// fresh `Notify` as the new tail and return *that* fresh gate —
    /// releasing it is what wakes the next waiter in line. Must never
    /// re-read the map afterward: a concurrent acquirer may have since
    /// replaced the tail, and returning its gate instead of our own
    /// would wake the wrong waiter and break mutual exclusion.
    async fn acquire(&self, path: &Path) -> Arc<Notify> {
        let fresh = Arc::new(Notify::new());
        let prev = {
            let mut gates = self.gates.lock().await;
            gates.tails.insert(path.clone(), fresh.clone())
        };
        if let Some(prev) = prev {
            prev.notified().await;
        }
        fresh
    }
}
