//! Single-threaded cache store

use std::collections::BTreeMap;
use std::fmt;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};

use tracing::{debug, trace, warn};

use super::CacheOps;
use crate::error::{CacheError, CacheResult};

/// Generations are unique across every store in the process, so a handle
/// from one store never matches a slot of another.
static NEXT_GENERATION: AtomicU64 = AtomicU64::new(0);

/// Opaque reference to a resident entry
///
/// The entry is pinned until the handle is passed back to
/// [`CacheStore::release`]. Handles cannot be cloned, so each one is released
/// exactly once.
#[must_use = "entry handles must be released back to the cache"]
#[derive(Debug, PartialEq, Eq)]
pub struct EntryHandle {
    slot: usize,
    generation: u64,
}

/// Counters accumulated over the lifetime of a store
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub creations: u64,
    pub evictions: u64,
}

impl CacheStats {
    pub fn hit_ratio(&self) -> f64 {
        let lookups = self.hits + self.misses;
        if lookups == 0 {
            0.0
        } else {
            self.hits as f64 / lookups as f64
        }
    }
}

struct Entry<K, V> {
    key: K,
    value: V,
    ref_count: usize,
    /// Recency tick, stamped on creation and on every hit
    last_used: u64,
    generation: u64,
}

/// Fixed-capacity keyed store
///
/// Entries live in a slot arena. `index` holds the occupied slots sorted by
/// [`CacheOps::compare`], and `idle` maps the recency tick of every
/// unreferenced entry to its slot, so the eviction victim is always the first
/// idle entry.
pub struct CacheStore<O: CacheOps> {
    ops: O,
    slots: Vec<Option<Entry<O::Key, O::Value>>>,
    free: Vec<usize>,
    index: Vec<usize>,
    idle: BTreeMap<u64, usize>,
    capacity: usize,
    tick: u64,
    stats: CacheStats,
}

impl<O: CacheOps> CacheStore<O> {
    /// Create a store holding at most `capacity` entries
    pub fn new(ops: O, capacity: usize) -> CacheResult<Self, O::Error> {
        if capacity == 0 {
            return Err(CacheError::Allocation {
                capacity,
                reason: "capacity must be non-zero".to_string(),
            });
        }

        let mut slots = Vec::new();
        let mut index = Vec::new();
        slots
            .try_reserve_exact(capacity)
            .and_then(|_| index.try_reserve_exact(capacity))
            .map_err(|e| CacheError::Allocation {
                capacity,
                reason: e.to_string(),
            })?;

        Ok(Self::from_storage(ops, capacity, slots, index))
    }

    /// Create a store whose slot storage is allocated up front
    ///
    /// Allocation failure aborts like any other `Vec` growth.
    pub fn with_capacity(ops: O, capacity: NonZeroUsize) -> Self {
        let capacity = capacity.get();
        Self::from_storage(ops, capacity, Vec::with_capacity(capacity), Vec::with_capacity(capacity))
    }

    fn from_storage(
        ops: O,
        capacity: usize,
        slots: Vec<Option<Entry<O::Key, O::Value>>>,
        index: Vec<usize>,
    ) -> Self {
        debug!("Created cache store with {} slots", capacity);

        Self {
            ops,
            slots,
            free: Vec::new(),
            index,
            idle: BTreeMap::new(),
            capacity,
            tick: 0,
            stats: CacheStats::default(),
        }
    }

    pub fn ops(&self) -> &O {
        &self.ops
    }

    /// Look up `key`, creating its entry on a miss
    ///
    /// On a miss at full capacity the least-recently-used unreferenced entry
    /// makes room, but only once creation has succeeded: a failed creation
    /// leaves the store exactly as it was.
    pub fn acquire_or_create(
        &mut self,
        key: O::Key,
        context: &mut O::Context<'_>,
    ) -> CacheResult<EntryHandle, O::Error> {
        if let Ok(pos) = self.search(&key) {
            let slot = self.index[pos];
            trace!("Cache hit in slot {}", slot);
            return self.pin(slot).ok_or(CacheError::StaleHandle);
        }

        self.stats.misses += 1;

        let victim = if self.len() >= self.capacity {
            match self.lru_victim() {
                Some(slot) => Some(slot),
                None => {
                    warn!("Cache full: all {} entries are referenced", self.capacity);
                    return Err(CacheError::CapacityExhausted {
                        capacity: self.capacity,
                    });
                }
            }
        } else {
            None
        };

        let value = self
            .ops
            .create(&key, context)
            .map_err(CacheError::Creation)?;
        self.stats.creations += 1;

        if let Some(slot) = victim {
            self.evict(slot);
        }

        Ok(self.insert(key, value))
    }

    /// Look up `key` without creating it
    pub fn acquire(&mut self, key: &O::Key) -> Option<EntryHandle> {
        match self.search(key) {
            Ok(pos) => {
                let slot = self.index[pos];
                self.pin(slot)
            }
            Err(_) => {
                self.stats.misses += 1;
                None
            }
        }
    }

    /// Value behind a live handle
    pub fn get(&self, handle: &EntryHandle) -> Option<&O::Value> {
        self.entry(handle).map(|entry| &entry.value)
    }

    /// Key behind a live handle
    pub fn key(&self, handle: &EntryHandle) -> Option<&O::Key> {
        self.entry(handle).map(|entry| &entry.key)
    }

    /// Drop one reference. The entry stays resident and becomes evictable at zero.
    pub fn release(&mut self, handle: EntryHandle) {
        let Some(Some(entry)) = self.slots.get_mut(handle.slot) else {
            warn!("Released a handle to an empty slot {}", handle.slot);
            return;
        };
        if entry.generation != handle.generation || entry.ref_count == 0 {
            warn!("Released a stale handle for slot {}", handle.slot);
            return;
        }

        entry.ref_count -= 1;
        if entry.ref_count == 0 {
            self.idle.insert(entry.last_used, handle.slot);
        }
    }

    /// Remove the entry for `key` if nobody references it
    pub fn drop_entry(&mut self, key: &O::Key) -> bool {
        let Ok(pos) = self.search(key) else {
            return false;
        };
        let slot = self.index[pos];
        match self.slots[slot].as_ref() {
            Some(entry) if entry.ref_count == 0 => {
                self.evict(slot);
                true
            }
            _ => false,
        }
    }

    /// Remove every unreferenced entry
    pub fn drop_all(&mut self) -> usize {
        let idle: Vec<usize> = self.idle.values().copied().collect();
        for &slot in &idle {
            self.evict(slot);
        }
        idle.len()
    }

    /// Evict the current least-recently-used entry, if any is unreferenced
    pub fn evict_one(&mut self) -> bool {
        match self.lru_victim() {
            Some(slot) => {
                self.evict(slot);
                true
            }
            None => false,
        }
    }

    /// Change the slot count, evicting unreferenced entries to fit
    ///
    /// Fails without touching the store when referenced entries alone exceed
    /// the new capacity.
    pub fn set_capacity(&mut self, capacity: usize) -> CacheResult<(), O::Error> {
        if capacity == 0 {
            return Err(CacheError::Allocation {
                capacity,
                reason: "capacity must be non-zero".to_string(),
            });
        }

        let referenced = self.len() - self.idle.len();
        if referenced > capacity {
            return Err(CacheError::CapacityExhausted { capacity });
        }

        if capacity > self.capacity {
            let additional = capacity - self.slots.len().min(capacity);
            self.slots
                .try_reserve_exact(additional)
                .and_then(|_| self.index.try_reserve_exact(capacity - self.index.len()))
                .map_err(|e| CacheError::Allocation {
                    capacity,
                    reason: e.to_string(),
                })?;
        }

        while self.len() > capacity && self.evict_one() {}
        debug!("Cache capacity changed from {} to {}", self.capacity, capacity);
        self.capacity = capacity;
        Ok(())
    }

    /// Tear the store down, destroying every resident entry
    ///
    /// Outstanding handles become dangling; callers must have released them.
    pub fn destroy(self) {
        let referenced = self.len() - self.idle.len();
        if referenced > 0 {
            warn!("Destroying cache with {} referenced entries", referenced);
        }
        drop(self);
    }

    pub fn contains(&self, key: &O::Key) -> bool {
        self.search(key).is_ok()
    }

    /// Current reference count for `key`, if resident
    pub fn ref_count(&self, key: &O::Key) -> Option<usize> {
        let pos = self.search(key).ok()?;
        self.slots[self.index[pos]]
            .as_ref()
            .map(|entry| entry.ref_count)
    }

    /// Resident keys in index order
    pub fn keys(&self) -> impl Iterator<Item = &O::Key> + '_ {
        self.index
            .iter()
            .filter_map(|&slot| self.slots[slot].as_ref().map(|entry| &entry.key))
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn free_slots(&self) -> usize {
        self.capacity.saturating_sub(self.len())
    }

    pub fn stats(&self) -> CacheStats {
        self.stats
    }

    fn search(&self, key: &O::Key) -> Result<usize, usize> {
        self.index.binary_search_by(|&slot| match &self.slots[slot] {
            Some(entry) => self.ops.compare(&entry.key, key),
            // The index only refers to occupied slots
            None => std::cmp::Ordering::Less,
        })
    }

    fn entry(&self, handle: &EntryHandle) -> Option<&Entry<O::Key, O::Value>> {
        match self.slots.get(handle.slot) {
            Some(Some(entry)) if entry.generation == handle.generation => Some(entry),
            _ => None,
        }
    }

    fn next_tick(&mut self) -> u64 {
        self.tick += 1;
        self.tick
    }

    fn pin(&mut self, slot: usize) -> Option<EntryHandle> {
        let tick = self.next_tick();
        let entry = self.slots.get_mut(slot)?.as_mut()?;
        if entry.ref_count == 0 {
            self.idle.remove(&entry.last_used);
        }
        entry.ref_count += 1;
        entry.last_used = tick;
        self.stats.hits += 1;

        Some(EntryHandle {
            slot,
            generation: entry.generation,
        })
    }

    fn lru_victim(&self) -> Option<usize> {
        self.idle.values().next().copied()
    }

    fn insert(&mut self, key: O::Key, value: O::Value) -> EntryHandle {
        let pos = match self.search(&key) {
            Ok(pos) | Err(pos) => pos,
        };
        let generation = NEXT_GENERATION.fetch_add(1, AtomicOrdering::Relaxed);
        let entry = Entry {
            key,
            value,
            ref_count: 1,
            last_used: self.next_tick(),
            generation,
        };

        let slot = match self.free.pop() {
            Some(slot) => {
                self.slots[slot] = Some(entry);
                slot
            }
            None => {
                self.slots.push(Some(entry));
                self.slots.len() - 1
            }
        };
        self.index.insert(pos, slot);
        trace!("Cache miss filled slot {}", slot);

        EntryHandle { slot, generation }
    }

    fn evict(&mut self, slot: usize) {
        let pos = match &self.slots[slot] {
            Some(entry) => self.search(&entry.key),
            None => return,
        };
        if let Ok(pos) = pos {
            self.index.remove(pos);
        }

        if let Some(entry) = self.slots[slot].take() {
            self.idle.remove(&entry.last_used);
            self.free.push(slot);
            self.stats.evictions += 1;
            debug!("Evicted cache slot {} (last used at tick {})", slot, entry.last_used);
            self.ops.destroy(&entry.key, entry.value);
        }
    }
}

impl<O: CacheOps> Drop for CacheStore<O> {
    fn drop(&mut self) {
        self.index.clear();
        self.idle.clear();
        for entry in self.slots.drain(..).flatten() {
            self.ops.destroy(&entry.key, entry.value);
        }
    }
}

impl<O: CacheOps> fmt::Debug for CacheStore<O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheStore")
            .field("len", &self.len())
            .field("capacity", &self.capacity)
            .field("idle", &self.idle.len())
            .field("stats", &self.stats)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cmp::Ordering;
    use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};
    use std::sync::Arc;

    #[derive(Debug, thiserror::Error, PartialEq)]
    #[error("creation refused for {0}")]
    struct Refused(u32);

    #[derive(Default)]
    struct Counters {
        created: AtomicUsize,
        destroyed: AtomicUsize,
    }

    struct TestOps {
        counters: Arc<Counters>,
    }

    struct TestContext {
        fail: bool,
    }

    impl CacheOps for TestOps {
        type Key = u32;
        type Value = String;
        type Error = Refused;
        type Context<'a> = TestContext where Self: 'a;

        fn compare(&self, lhs: &u32, rhs: &u32) -> Ordering {
            lhs.cmp(rhs)
        }

        fn create(&self, key: &u32, context: &mut TestContext) -> Result<String, Refused> {
            if context.fail {
                return Err(Refused(*key));
            }
            self.counters.created.fetch_add(1, AtomicOrdering::SeqCst);
            Ok(format!("value-{}", key))
        }

        fn destroy(&self, _key: &u32, _value: String) {
            self.counters.destroyed.fetch_add(1, AtomicOrdering::SeqCst);
        }
    }

    fn store(capacity: usize) -> (CacheStore<TestOps>, Arc<Counters>) {
        let counters = Arc::new(Counters::default());
        let ops = TestOps { counters: Arc::clone(&counters) };
        (CacheStore::new(ops, capacity).unwrap(), counters)
    }

    fn ok() -> TestContext {
        TestContext { fail: false }
    }

    fn touch(store: &mut CacheStore<TestOps>, key: u32) {
        let handle = store.acquire_or_create(key, &mut ok()).unwrap();
        store.release(handle);
    }

    #[test]
    fn test_zero_capacity_is_allocation_error() {
        let ops = TestOps { counters: Arc::default() };
        let result = CacheStore::new(ops, 0);
        assert!(matches!(result, Err(CacheError::Allocation { capacity: 0, .. })));
    }

    #[test]
    fn test_with_capacity_preallocates() {
        let ops = TestOps { counters: Arc::default() };
        let mut store = CacheStore::with_capacity(ops, NonZeroUsize::new(2).unwrap());
        assert_eq!(store.capacity(), 2);
        assert_eq!(store.free_slots(), 2);

        for key in [1, 2, 3] {
            touch(&mut store, key);
        }
        assert_eq!(store.len(), 2);
        assert!(!store.contains(&1));
    }

    #[test]
    fn test_single_creation_per_key() {
        let (mut store, counters) = store(4);

        let first = store.acquire_or_create(7, &mut ok()).unwrap();
        let second = store.acquire_or_create(7, &mut ok()).unwrap();
        store.release(first);
        store.release(second);
        touch(&mut store, 7);

        assert_eq!(counters.created.load(AtomicOrdering::SeqCst), 1);
        assert_eq!(store.len(), 1);
        assert_eq!(store.stats().misses, 1);
        assert_eq!(store.stats().hits, 2);
    }

    #[test]
    fn test_handle_reads_value() {
        let (mut store, _) = store(2);
        let handle = store.acquire_or_create(3, &mut ok()).unwrap();
        assert_eq!(store.get(&handle).map(String::as_str), Some("value-3"));
        assert_eq!(store.key(&handle), Some(&3));
        store.release(handle);
    }

    #[test]
    fn test_refcount_returns_to_zero() {
        let (mut store, _) = store(2);
        let handles: Vec<_> = (0..5)
            .map(|_| store.acquire_or_create(1, &mut ok()).unwrap())
            .collect();
        assert_eq!(store.ref_count(&1), Some(5));

        for handle in handles {
            store.release(handle);
        }
        assert_eq!(store.ref_count(&1), Some(0));
        assert!(store.evict_one());
        assert!(!store.contains(&1));
    }

    #[test]
    fn test_release_keeps_entry_warm() {
        let (mut store, counters) = store(2);
        touch(&mut store, 9);
        assert!(store.contains(&9));
        assert_eq!(counters.destroyed.load(AtomicOrdering::SeqCst), 0);
    }

    #[test]
    fn test_capacity_exhausted_when_all_referenced() {
        let (mut store, counters) = store(2);
        let a = store.acquire_or_create(1, &mut ok()).unwrap();
        let b = store.acquire_or_create(2, &mut ok()).unwrap();

        let result = store.acquire_or_create(3, &mut ok());
        assert!(matches!(result, Err(CacheError::CapacityExhausted { capacity: 2 })));
        assert_eq!(store.len(), 2);
        assert_eq!(counters.created.load(AtomicOrdering::SeqCst), 2);

        store.release(a);
        let c = store.acquire_or_create(3, &mut ok()).unwrap();
        assert!(!store.contains(&1));
        assert!(store.contains(&2));
        store.release(b);
        store.release(c);
    }

    #[test]
    fn test_lru_evicts_oldest() {
        let (mut store, _) = store(3);
        touch(&mut store, 10);
        touch(&mut store, 20);
        touch(&mut store, 30);

        touch(&mut store, 40);
        assert!(!store.contains(&10));
        assert!(store.contains(&20));
        assert!(store.contains(&30));
        assert!(store.contains(&40));
    }

    #[test]
    fn test_lru_with_two_slots() {
        let (mut store, _) = store(2);
        touch(&mut store, 10);
        touch(&mut store, 20);
        touch(&mut store, 30);
        assert!(!store.contains(&10));

        touch(&mut store, 40);
        assert!(!store.contains(&20));
        assert_eq!(store.keys().copied().collect::<Vec<_>>(), vec![30, 40]);
    }

    #[test]
    fn test_hit_refreshes_recency() {
        let (mut store, _) = store(2);
        touch(&mut store, 1);
        touch(&mut store, 2);
        touch(&mut store, 1);

        touch(&mut store, 3);
        assert!(store.contains(&1));
        assert!(!store.contains(&2));
    }

    #[test]
    fn test_referenced_entry_skipped_by_eviction() {
        let (mut store, _) = store(2);
        let pinned = store.acquire_or_create(1, &mut ok()).unwrap();
        touch(&mut store, 2);

        touch(&mut store, 3);
        assert!(store.contains(&1));
        assert!(!store.contains(&2));
        store.release(pinned);
    }

    #[test]
    fn test_failed_creation_leaves_store_unchanged() {
        let (mut store, counters) = store(2);
        touch(&mut store, 1);
        touch(&mut store, 2);

        let result = store.acquire_or_create(3, &mut TestContext { fail: true });
        assert!(matches!(result, Err(CacheError::Creation(Refused(3)))));
        assert!(store.contains(&1));
        assert!(store.contains(&2));
        assert!(!store.contains(&3));
        assert_eq!(store.stats().evictions, 0);
        assert_eq!(counters.destroyed.load(AtomicOrdering::SeqCst), 0);
    }

    #[test]
    fn test_acquire_without_create() {
        let (mut store, _) = store(2);
        assert!(store.acquire(&5).is_none());
        touch(&mut store, 5);

        let handle = store.acquire(&5).unwrap();
        assert_eq!(store.ref_count(&5), Some(1));
        store.release(handle);
    }

    #[test]
    fn test_drop_entry_respects_references() {
        let (mut store, counters) = store(2);
        let handle = store.acquire_or_create(4, &mut ok()).unwrap();
        assert!(!store.drop_entry(&4));

        store.release(handle);
        assert!(store.drop_entry(&4));
        assert!(!store.drop_entry(&4));
        assert_eq!(counters.destroyed.load(AtomicOrdering::SeqCst), 1);
    }

    #[test]
    fn test_drop_all_only_idle() {
        let (mut store, _) = store(4);
        touch(&mut store, 1);
        touch(&mut store, 2);
        let pinned = store.acquire_or_create(3, &mut ok()).unwrap();

        assert_eq!(store.drop_all(), 2);
        assert_eq!(store.len(), 1);
        assert!(store.contains(&3));
        store.release(pinned);
    }

    #[test]
    fn test_set_capacity_shrinks_lru_first() {
        let (mut store, _) = store(4);
        for key in 1..=4 {
            touch(&mut store, key);
        }

        store.set_capacity(2).unwrap();
        assert_eq!(store.capacity(), 2);
        assert_eq!(store.keys().copied().collect::<Vec<_>>(), vec![3, 4]);
    }

    #[test]
    fn test_set_capacity_rejects_below_referenced() {
        let (mut store, _) = store(3);
        let a = store.acquire_or_create(1, &mut ok()).unwrap();
        let b = store.acquire_or_create(2, &mut ok()).unwrap();

        assert!(matches!(
            store.set_capacity(1),
            Err(CacheError::CapacityExhausted { capacity: 1 })
        ));
        assert_eq!(store.capacity(), 3);
        store.release(a);
        store.release(b);
    }

    #[test]
    fn test_slot_reuse_invalidates_old_generation() {
        let (mut store, _) = store(1);
        let handle = store.acquire_or_create(1, &mut ok()).unwrap();
        let stale = EntryHandle { slot: handle.slot, generation: handle.generation };
        store.release(handle);

        touch(&mut store, 2);
        assert!(store.get(&stale).is_none());
        // Releasing a stale handle must not touch the new occupant
        store.release(stale);
        assert_eq!(store.ref_count(&2), Some(0));
    }

    #[test]
    fn test_foreign_handle_is_rejected() {
        let (mut first, _) = store(2);
        let (mut second, _) = store(2);
        let foreign = first.acquire_or_create(1, &mut ok()).unwrap();
        let own = second.acquire_or_create(1, &mut ok()).unwrap();

        assert!(second.get(&foreign).is_none());
        second.release(foreign);
        assert_eq!(second.ref_count(&1), Some(1));
        assert_eq!(first.ref_count(&1), Some(1));
        second.release(own);
    }

    #[test]
    fn test_teardown_destroys_everything() {
        let (mut store, counters) = store(4);
        touch(&mut store, 1);
        touch(&mut store, 2);
        let _leaked = store.acquire_or_create(3, &mut ok()).unwrap();

        store.destroy();
        assert_eq!(counters.destroyed.load(AtomicOrdering::SeqCst), 3);
    }

    #[test]
    fn test_index_stays_sorted() {
        let (mut store, _) = store(8);
        for key in [5, 1, 9, 3, 7] {
            touch(&mut store, key);
        }
        assert_eq!(store.keys().copied().collect::<Vec<_>>(), vec![1, 3, 5, 7, 9]);
        assert_eq!(store.free_slots(), 3);
    }
}
