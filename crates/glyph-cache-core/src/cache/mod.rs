//! Generic fixed-capacity cache with reference counting and LRU eviction
//!
//! Entries are created on first lookup through a [`CacheOps`] implementation,
//! pinned while a caller holds an [`EntryHandle`], and evicted least-recently-used
//! first once nobody references them.

pub mod shared;
pub mod store;

pub use shared::SharedCacheStore;
pub use store::{CacheStats, CacheStore, EntryHandle};

use std::cmp::Ordering;

/// Capability interface a cache store is parametrized over
///
/// `compare` must be a strict total order over keys: the store keeps its index
/// sorted by it and binary-searches on every lookup.
pub trait CacheOps {
    type Key;
    type Value;
    type Error;
    /// Borrowed state handed to `create` on a miss
    type Context<'a>
    where
        Self: 'a;

    fn compare(&self, lhs: &Self::Key, rhs: &Self::Key) -> Ordering;

    fn create(
        &self,
        key: &Self::Key,
        context: &mut Self::Context<'_>,
    ) -> Result<Self::Value, Self::Error>;

    /// Release whatever the value owns. Called on eviction, drop and teardown.
    fn destroy(&self, _key: &Self::Key, _value: Self::Value) {}
}
