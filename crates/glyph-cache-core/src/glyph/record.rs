//! Cache callbacks for glyph metrics records

use std::cmp::Ordering;
use std::marker::PhantomData;

use tracing::{debug, error};

use crate::cache::CacheOps;
use crate::error::RasterizerError;
use crate::glyph::rasterizer::{CharmapCache, Rasterizer};
use crate::glyph::{GlyphKey, GlyphMetrics, MetricsMode};

/// Borrowed state needed to create a glyph record on a cache miss
pub struct GlyphLoadContext<'a, R> {
    pub face: &'a mut R,
    pub charmap: &'a mut CharmapCache,
}

/// [`CacheOps`] for (code point, pixel size) → [`GlyphMetrics`]
pub struct GlyphCacheOps<R> {
    mode: MetricsMode,
    _face: PhantomData<fn(&mut R)>,
}

impl<R> GlyphCacheOps<R> {
    pub fn new(mode: MetricsMode) -> Self {
        Self {
            mode,
            _face: PhantomData,
        }
    }

    pub fn mode(&self) -> MetricsMode {
        self.mode
    }
}

impl<R: Rasterizer> CacheOps for GlyphCacheOps<R> {
    type Key = GlyphKey;
    type Value = GlyphMetrics;
    type Error = RasterizerError;
    type Context<'a> = GlyphLoadContext<'a, R> where Self: 'a;

    fn compare(&self, lhs: &GlyphKey, rhs: &GlyphKey) -> Ordering {
        lhs.compare(rhs)
    }

    fn create(
        &self,
        key: &GlyphKey,
        context: &mut GlyphLoadContext<'_, R>,
    ) -> Result<GlyphMetrics, RasterizerError> {
        let glyph_index = context.charmap.lookup(&*context.face, key.code_point());

        context.face.set_pixel_size(key.pixel_size())?;
        let loaded = context
            .face
            .load_glyph(glyph_index, self.mode)
            .map_err(|e| {
                error!("Failed to load glyph {} for U+{:04X}: {}", glyph_index, key.code_point(), e);
                e
            })?;

        debug!(
            "Loaded glyph {} for U+{:04X} at {}px",
            glyph_index,
            key.code_point(),
            key.pixel_size()
        );
        GlyphMetrics::from_loaded(glyph_index, &loaded, self.mode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::CacheStore;
    use crate::dummy_rasterizer::{DummyGlyph, DummyRasterizer};
    use crate::error::CacheError;
    use crate::glyph::FaceId;

    fn store(capacity: usize) -> CacheStore<GlyphCacheOps<DummyRasterizer>> {
        CacheStore::new(GlyphCacheOps::new(MetricsMode::Outline), capacity).unwrap()
    }

    #[test]
    fn test_create_loads_at_key_size() {
        let mut face = DummyRasterizer::new(FaceId(0));
        let mut charmap = CharmapCache::new();
        let mut cache = store(4);

        let key = GlyphKey::new('A' as u32, 24);
        let mut context = GlyphLoadContext { face: &mut face, charmap: &mut charmap };
        let handle = cache.acquire_or_create(key, &mut context).unwrap();
        let metrics = *cache.get(&handle).unwrap();
        cache.release(handle);

        assert_eq!(metrics.glyph_index, face.char_index('A' as u32));
        assert_eq!(face.pixel_size(), 24);
        assert_eq!(face.loads(), &[(metrics.glyph_index, 24)]);
    }

    #[test]
    fn test_same_code_point_different_sizes_are_distinct() {
        let mut face = DummyRasterizer::new(FaceId(0));
        let mut charmap = CharmapCache::new();
        let mut cache = store(4);

        for size in [12, 16, 12] {
            let mut context = GlyphLoadContext { face: &mut face, charmap: &mut charmap };
            let handle = cache.acquire_or_create(GlyphKey::new('g' as u32, size), &mut context).unwrap();
            cache.release(handle);
        }

        assert_eq!(cache.len(), 2);
        assert_eq!(face.loads().len(), 2);
        assert_eq!(charmap.misses(), 1);
    }

    #[test]
    fn test_load_failure_surfaces_as_creation_error() {
        let mut face = DummyRasterizer::new(FaceId(0))
            .with_glyph('q' as u32, DummyGlyph::new(8, 8, 8, 0, 8))
            .failing_on('q' as u32);
        let mut charmap = CharmapCache::new();
        let mut cache = store(4);

        let mut context = GlyphLoadContext { face: &mut face, charmap: &mut charmap };
        let result = cache.acquire_or_create(GlyphKey::new('q' as u32, 16), &mut context);
        assert!(matches!(result, Err(CacheError::Creation(RasterizerError::GlyphLoad { .. }))));
        assert!(cache.is_empty());
    }

    #[test]
    fn test_unmapped_code_point_is_placeholder() {
        let mut face = DummyRasterizer::new(FaceId(0));
        let mut charmap = CharmapCache::new();
        let mut cache = store(4);

        let mut context = GlyphLoadContext { face: &mut face, charmap: &mut charmap };
        let handle = cache
            .acquire_or_create(GlyphKey::new(0x1F600, 16), &mut context)
            .unwrap();
        let metrics = *cache.get(&handle).unwrap();
        cache.release(handle);

        assert_eq!(metrics.glyph_index, 0);
        assert!(metrics.is_placeholder);
    }

    #[test]
    fn test_invalid_pixel_size() {
        let mut face = DummyRasterizer::new(FaceId(0));
        let mut charmap = CharmapCache::new();
        let mut cache = store(4);

        let mut context = GlyphLoadContext { face: &mut face, charmap: &mut charmap };
        let result = cache.acquire_or_create(GlyphKey::new('A' as u32, 0), &mut context);
        assert!(matches!(
            result,
            Err(CacheError::Creation(RasterizerError::InvalidPixelSize(0)))
        ));
    }
}
