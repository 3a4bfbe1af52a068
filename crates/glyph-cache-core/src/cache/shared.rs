//! Thread-safe wrapper around [`CacheStore`]
//!
//! One mutex guards the whole store and is held across lookup-or-create, so
//! two threads asking for the same missing key still produce a single entry.

use std::sync::{Arc, Mutex, MutexGuard};

use super::store::{CacheStats, CacheStore, EntryHandle};
use super::CacheOps;
use crate::error::{CacheError, CacheResult};

pub struct SharedCacheStore<O: CacheOps> {
    inner: Arc<Mutex<CacheStore<O>>>,
}

impl<O: CacheOps> Clone for SharedCacheStore<O> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<O: CacheOps> SharedCacheStore<O> {
    pub fn new(ops: O, capacity: usize) -> CacheResult<Self, O::Error> {
        Ok(Self::from_store(CacheStore::new(ops, capacity)?))
    }

    pub fn from_store(store: CacheStore<O>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(store)),
        }
    }

    pub fn acquire_or_create(
        &self,
        key: O::Key,
        context: &mut O::Context<'_>,
    ) -> CacheResult<EntryHandle, O::Error> {
        self.lock()?.acquire_or_create(key, context)
    }

    /// Run `f` on the value behind `handle` while the store is locked
    pub fn with_value<R>(
        &self,
        handle: &EntryHandle,
        f: impl FnOnce(&O::Value) -> R,
    ) -> CacheResult<R, O::Error> {
        let store = self.lock()?;
        store.get(handle).map(f).ok_or(CacheError::StaleHandle)
    }

    pub fn release(&self, handle: EntryHandle) -> CacheResult<(), O::Error> {
        self.lock()?.release(handle);
        Ok(())
    }

    /// Acquire, read and release under a single lock
    pub fn fetch<R>(
        &self,
        key: O::Key,
        context: &mut O::Context<'_>,
        f: impl FnOnce(&O::Value) -> R,
    ) -> CacheResult<R, O::Error> {
        let mut store = self.lock()?;
        let handle = store.acquire_or_create(key, context)?;
        let result = store.get(&handle).map(f);
        store.release(handle);
        result.ok_or(CacheError::StaleHandle)
    }

    pub fn stats(&self) -> CacheResult<CacheStats, O::Error> {
        Ok(self.lock()?.stats())
    }

    pub fn len(&self) -> CacheResult<usize, O::Error> {
        Ok(self.lock()?.len())
    }

    fn lock(&self) -> CacheResult<MutexGuard<'_, CacheStore<O>>, O::Error> {
        self.inner.lock().map_err(|e| CacheError::LockPoisoned {
            message: e.to_string(),
        })
    }
}
