use std::{sync::{Arc, Mutex, MutexGuard}, time::{Duration, Instant}};

use crate::Result;

/// A single lazily-filled value, optionally expiring `ttl` after it was stored.
#[derive(Debug)]
pub(crate) struct CacheSlot<T> {
    ttl: Option<Duration>,
    slot: Mutex<Option<(Instant, Arc<T>)>>,
}

impl<T> CacheSlot<T> {
    pub(crate) fn new(ttl: Option<Duration>) -> Self {
        Self { ttl, slot: Mutex::new(None) }
    }

    fn lock(&self) -> MutexGuard<'_, Option<(Instant, Arc<T>)>> {
        self.slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn is_fresh(&self, stored: Instant) -> bool {
        self.ttl.is_none_or(|ttl| stored.elapsed() < ttl)
    }

    /// Return the cached value, or compute and store it. The lock is held
    /// while computing, so concurrent callers wait for one computation.
    pub(crate) fn get_or_try_init(&self, init: impl FnOnce() -> Result<T>) -> Result<Arc<T>> {
        let mut guard = self.lock();
        if let Some((stored, value)) = guard.as_ref() {
            if self.is_fresh(*stored) { return Ok(Arc::clone(value)) }
        }
        let value = Arc::new(init()?);
        *guard = Some((Instant::now(), Arc::clone(&value)));
        Ok(value)
    }

    /// Store a value computed elsewhere.
    pub(crate) fn set(&self, value: Arc<T>) {
        *self.lock() = Some((Instant::now(), value));
    }

    pub(crate) fn clear(&self) {
        *self.lock() = None;
    }
}
