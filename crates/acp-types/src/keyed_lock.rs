//! per-entity logical locking
//!
//! generalizes spec's "single-threaded event loop or a mutex keyed on
//! agentId" to a threaded implementation: callers serialize mutations on
//! the same entity id while mutations on distinct ids proceed concurrently.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard, OwnedMutexGuard};

pub struct KeyedLock<K> {
    locks: Mutex<HashMap<K, Arc<Mutex<()>>>>,
}

impl<K: Eq + Hash + Clone> KeyedLock<K> {
    pub fn new() -> Self {
        Self {
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// acquire the lock for `key`, creating it on first use. held until the
    /// returned guard is dropped.
    pub async fn lock(&self, key: K) -> OwnedMutexGuard<()> {
        let entry = {
            let mut locks = self.locks.lock().await;
            locks.entry(key).or_insert_with(|| Arc::new(Mutex::new(()))).clone()
        };
        entry.lock_owned().await
    }
}

impl<K: Eq + Hash + Clone> Default for KeyedLock<K> {
    fn default() -> Self {
        Self::new()
    }
}

/// local alias kept for call sites that only need a borrowed guard in one scope
pub type LocalGuard<'a> = MutexGuard<'a, ()>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test]
    async fn serializes_same_key() {
        let lock: KeyedLock<String> = KeyedLock::new();
        let counter = Arc::new(AtomicU32::new(0));
        let mut handles = vec![];
        for _ in 0..16 {
            let counter = counter.clone();
            let guard = lock.lock("agent-1".to_string()).await;
            handles.push(tokio::spawn(async move {
                let before = counter.fetch_add(1, Ordering::SeqCst);
                assert_eq!(before, 0, "overlapping critical section");
                drop(guard);
                counter.fetch_sub(1, Ordering::SeqCst);
            }));
        }
        for h in handles {
            h.await.unwrap();
        }
    }

    #[tokio::test]
    async fn distinct_keys_do_not_block() {
        let lock: KeyedLock<String> = KeyedLock::new();
        let g1 = lock.lock("a".to_string()).await;
        let g2 = tokio::time::timeout(std::time::Duration::from_millis(50), lock.lock("b".to_string())).await;
        assert!(g2.is_ok());
        drop(g1);
    }
}
