//! Per-resource cross-process locking.
//!
//! Mutating operations serialize on a per-resource lock held in an external
//! coordination store. The store is modeled as a capability trait so
//! deployments can plug in a hierarchical-node service; the in-process
//! implementation provided here carries the same semantics for a single
//! process and for tests.

use crate::{Error, Result};
use std::collections::HashSet;
use std::sync::{Arc, Condvar, Mutex};
use std::time::{Duration, Instant};

/// A store of named locks with cross-process acquire/release semantics.
pub trait LockStore: Send + Sync {
    /// Try to acquire the lock at `path`, waiting up to `timeout`.
    fn acquire(&self, path: &str, timeout: Duration) -> bool;

    /// Release the lock at `path`.
    fn release(&self, path: &str);
}

/// Scoped holder of an acquired lock; releases on drop, including unwinds.
pub struct LockGuard {
    store: Arc<dyn LockStore>,
    path: String,
}

impl std::fmt::Debug for LockGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LockGuard").field("path", &self.path).finish()
    }
}

impl Drop for LockGuard {
    fn drop(&mut self) {
        self.store.release(&self.path);
    }
}

/// Acquire the lock at `path`, failing with `LockTimeout` on expiry.
pub fn lock(store: &Arc<dyn LockStore>, path: &str, timeout: Duration) -> Result<LockGuard> {
    if store.acquire(path, timeout) {
        Ok(LockGuard { store: Arc::clone(store), path: path.to_string() })
    } else {
        Err(Error::LockTimeout(path.to_string()))
    }
}

/// In-process lock store backed by a mutex-guarded set and a condvar.
#[derive(Default)]
pub struct LocalLockStore {
    held: Mutex<HashSet<String>>,
    released: Condvar,
}

impl LocalLockStore {
    /// Create an empty lock store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl LockStore for LocalLockStore {
    fn acquire(&self, path: &str, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut held = self.held.lock().unwrap();
        loop {
            if !held.contains(path) {
                held.insert(path.to_string());
                return true;
            }
            let remaining = match deadline.checked_duration_since(Instant::now()) {
                Some(remaining) if !remaining.is_zero() => remaining,
                _ => return false,
            };
            let (guard, result) = self.released.wait_timeout(held, remaining).unwrap();
            held = guard;
            if result.timed_out() && held.contains(path) {
                return false;
            }
        }
    }

    fn release(&self, path: &str) {
        let mut held = self.held.lock().unwrap();
        held.remove(path);
        self.released.notify_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_acquire_and_release() {
        let store: Arc<dyn LockStore> = Arc::new(LocalLockStore::new());
        {
            let _guard =
                lock(&store, "/repository/resource", Duration::from_millis(100)).unwrap();
            // held: a second acquire times out
            assert!(!store.acquire("/repository/resource", Duration::from_millis(10)));
        }
        // guard dropped: acquirable again
        assert!(store.acquire("/repository/resource", Duration::from_millis(10)));
        store.release("/repository/resource");
    }

    #[test]
    fn test_timeout_error() {
        let store: Arc<dyn LockStore> = Arc::new(LocalLockStore::new());
        let _guard = lock(&store, "/a", Duration::from_millis(100)).unwrap();
        let err = lock(&store, "/a", Duration::from_millis(10)).unwrap_err();
        assert!(matches!(err, Error::LockTimeout(_)));
    }

    #[test]
    fn test_independent_paths() {
        let store: Arc<dyn LockStore> = Arc::new(LocalLockStore::new());
        let _a = lock(&store, "/a", Duration::from_millis(10)).unwrap();
        let _b = lock(&store, "/b", Duration::from_millis(10)).unwrap();
    }

    #[test]
    fn test_release_on_panic() {
        let store: Arc<dyn LockStore> = Arc::new(LocalLockStore::new());
        let cloned = Arc::clone(&store);
        let handle = thread::spawn(move || {
            let _guard = lock(&cloned, "/a", Duration::from_millis(10)).unwrap();
            panic!("unwinding with the lock held");
        });
        assert!(handle.join().is_err());
        assert!(store.acquire("/a", Duration::from_millis(100)));
        store.release("/a");
    }

    #[test]
    fn test_handoff_between_threads() {
        let store: Arc<dyn LockStore> = Arc::new(LocalLockStore::new());
        let guard = lock(&store, "/a", Duration::from_millis(10)).unwrap();
        let cloned = Arc::clone(&store);
        let waiter = thread::spawn(move || cloned.acquire("/a", Duration::from_millis(500)));
        thread::sleep(Duration::from_millis(50));
        drop(guard);
        assert!(waiter.join().unwrap());
    }
}
