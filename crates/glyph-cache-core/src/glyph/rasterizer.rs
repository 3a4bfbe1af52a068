//! Rasterizer capability consumed by the glyph cache

use std::cmp::Ordering;
use std::convert::Infallible;
use std::num::NonZeroUsize;

use tracing::warn;

use crate::cache::{CacheOps, CacheStore};
use crate::constants::DEFAULT_CHARMAP_CACHE_SIZE;
use crate::error::RasterizerError;
use crate::glyph::MetricsMode;

/// Identifies a font face inside a [`FontContext`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FaceId(pub u64);

/// Scalable metrics of a loaded glyph, in 26.6 fixed point
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScalableMetrics {
    pub width: i32,
    pub height: i32,
    pub hori_bearing_x: i32,
    pub hori_bearing_y: i32,
    pub hori_advance: i32,
}

/// Placement of a rendered glyph bitmap, in pixels
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BitmapPlacement {
    pub width: u32,
    pub rows: u32,
    pub left: i32,
    /// Distance from the baseline to the top row
    pub top: i32,
}

/// Output of [`Rasterizer::load_glyph`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadedGlyph {
    pub metrics: ScalableMetrics,
    /// Horizontal advance vector, 26.6 fixed point
    pub advance_x: i32,
    /// Only filled when loading in bitmap mode
    pub bitmap: Option<BitmapPlacement>,
}

/// A font face able to map code points and report glyph metrics
///
/// Loading never produces pixel data; only placement and metrics are read.
pub trait Rasterizer {
    fn face_id(&self) -> FaceId;

    /// Glyph index for a code point, 0 when the face has no mapping
    fn char_index(&self, code_point: u32) -> u32;

    fn set_pixel_size(&mut self, pixel_size: u32) -> Result<(), RasterizerError>;

    fn load_glyph(
        &mut self,
        glyph_index: u32,
        mode: MetricsMode,
    ) -> Result<LoadedGlyph, RasterizerError>;
}

/// Charmap lookups as cache entries, keyed by (face, code point)
#[derive(Debug, Clone, Copy, Default)]
pub struct CharmapOps;

impl CacheOps for CharmapOps {
    type Key = (FaceId, u32);
    type Value = u32;
    type Error = Infallible;
    type Context<'a> = &'a dyn Rasterizer where Self: 'a;

    fn compare(&self, lhs: &(FaceId, u32), rhs: &(FaceId, u32)) -> Ordering {
        lhs.cmp(rhs)
    }

    fn create(&self, key: &(FaceId, u32), face: &mut &dyn Rasterizer) -> Result<u32, Infallible> {
        Ok(face.char_index(key.1))
    }
}

/// Memoized code point to glyph index lookups, shared by every face of a context
///
/// Bounded like the glyph caches in front of it: the least recently used
/// mapping is dropped once the cache is full.
#[derive(Debug)]
pub struct CharmapCache {
    store: CacheStore<CharmapOps>,
}

impl Default for CharmapCache {
    fn default() -> Self {
        Self::new()
    }
}

impl CharmapCache {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHARMAP_CACHE_SIZE)
    }

    pub fn with_capacity(capacity: NonZeroUsize) -> Self {
        Self {
            store: CacheStore::with_capacity(CharmapOps, capacity),
        }
    }

    pub fn lookup<R: Rasterizer>(&mut self, face: &R, code_point: u32) -> u32 {
        let mut face: &dyn Rasterizer = face;
        let key = (face.face_id(), code_point);
        match self.store.acquire_or_create(key, &mut face) {
            Ok(handle) => {
                let glyph_index = self.store.get(&handle).copied();
                self.store.release(handle);
                glyph_index.unwrap_or_else(|| face.char_index(code_point))
            }
            Err(e) => {
                warn!("Charmap cache bypassed for U+{:04X}: {}", code_point, e);
                face.char_index(code_point)
            }
        }
    }

    /// Forget every mapping of one face, e.g. when it is unloaded
    pub fn forget_face(&mut self, face_id: FaceId) {
        let keys: Vec<_> = self
            .store
            .keys()
            .filter(|(face, _)| *face == face_id)
            .copied()
            .collect();
        for key in &keys {
            self.store.drop_entry(key);
        }
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.store.capacity()
    }

    pub fn hits(&self) -> u64 {
        self.store.stats().hits
    }

    pub fn misses(&self) -> u64 {
        self.store.stats().misses
    }

    pub fn evictions(&self) -> u64 {
        self.store.stats().evictions
    }
}

/// Rasterizer state shared by all fonts, passed explicitly to every lookup
#[derive(Debug, Default)]
pub struct FontContext {
    pub charmap: CharmapCache,
    next_face_id: u64,
}

impl FontContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_charmap_capacity(capacity: NonZeroUsize) -> Self {
        Self {
            charmap: CharmapCache::with_capacity(capacity),
            next_face_id: 0,
        }
    }

    /// Hand out a face id unique within this context
    pub fn allocate_face_id(&mut self) -> FaceId {
        let id = FaceId(self.next_face_id);
        self.next_face_id += 1;
        id
    }
}
