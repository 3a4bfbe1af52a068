// src/config.rs
use crate::constants::{DEFAULT_OUTLINE_CACHE_SIZE, GLYPH_CACHE_SIZE_FACTOR};
use crate::glyph::MetricsMode;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GlyphCacheConfig {
    /// Number of outlines the rasterizer keeps around; the glyph cache is sized from it
    pub outline_cache_size: usize,
    pub metrics_mode: MetricsMode,
}

impl Default for GlyphCacheConfig {
    fn default() -> Self {
        Self {
            outline_cache_size: DEFAULT_OUTLINE_CACHE_SIZE,
            metrics_mode: MetricsMode::configured(),
        }
    }
}

impl GlyphCacheConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_outline_cache_size(mut self, size: usize) -> Self {
        self.outline_cache_size = size;
        self
    }

    pub fn with_metrics_mode(mut self, mode: MetricsMode) -> Self {
        self.metrics_mode = mode;
        self
    }

    /// Slot count of the glyph metrics cache
    pub fn glyph_capacity(&self) -> usize {
        self.outline_cache_size.saturating_mul(GLYPH_CACHE_SIZE_FACTOR)
    }
}
