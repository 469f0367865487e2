//! Per-key mutation locks
//!
//! Serializes writers of the same key while leaving different keys independent.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;

use tokio::sync::{Mutex, OwnedMutexGuard};

pub struct KeyedLocks<K> {
    locks: Mutex<HashMap<K, Arc<Mutex<()>>>>,
}

impl<K> Default for KeyedLocks<K> {
    fn default() -> Self {
        Self {
            locks: Mutex::new(HashMap::new()),
        }
    }
}

impl<K: Eq + Hash + Clone> KeyedLocks<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `key`; released when the guard drops
    pub async fn lock(&self, key: &K) -> OwnedMutexGuard<()> {
        let slot = {
            let mut locks = self.locks.lock().await;
            // Drop slots nobody holds or waits on
            locks.retain(|k, slot| k == key || Arc::strong_count(slot) > 1);
            locks.entry(key.clone()).or_default().clone()
        };
        slot.lock_owned().await
    }

    /// Number of keys currently tracked
    pub async fn tracked(&self) -> usize {
        self.locks.lock().await.len()
    }
}
