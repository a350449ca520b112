//! Keyed locks for stampede protection
//!
//! One lock per cache key: the first caller to acquire it populates the
//! cache while every other concurrent caller for the same key blocks on the
//! same lock, bounded by its own wait budget. Guards release on drop, so the
//! lock is freed on every exit path including a failing compute.

use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use remember_core::{RememberError, Result};
use tokio::sync::Mutex as AsyncMutex;
use tokio::time::timeout;

/// RAII guard for an acquired keyed lock. Dropping it releases the lock.
pub struct KeyLock {
    _held: Box<dyn Any + Send>,
}

impl KeyLock {
    /// Wrap whatever token the backing store uses to hold the lock.
    pub fn new(held: impl Any + Send) -> Self {
        Self {
            _held: Box::new(held),
        }
    }
}

impl std::fmt::Debug for KeyLock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyLock").finish_non_exhaustive()
    }
}

/// In-process registry of per-key async locks.
#[derive(Debug, Default)]
pub struct LockRegistry {
    locks: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

impl LockRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquire the lock for `key`, waiting at most `wait`.
    ///
    /// Fails with [`RememberError::LockTimeout`] when the holder does not
    /// release within `wait`; the timeout is never retried here.
    pub async fn acquire(&self, key: &str, wait: Duration) -> Result<KeyLock> {
        let slot = {
            let mut locks = self.locks.lock();
            // Prune locks nobody holds or waits on anymore.
            locks.retain(|_, slot| Arc::strong_count(slot) > 1);
            Arc::clone(
                locks
                    .entry(key.to_string())
                    .or_insert_with(|| Arc::new(AsyncMutex::new(()))),
            )
        };

        match timeout(wait, slot.lock_owned()).await {
            Ok(guard) => Ok(KeyLock::new(guard)),
            Err(_) => Err(RememberError::LockTimeout {
                key: key.to_string(),
                wait,
            }),
        }
    }

    /// Number of keys currently tracked.
    pub fn len(&self) -> usize {
        self.locks.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.lock().is_empty()
    }
}
