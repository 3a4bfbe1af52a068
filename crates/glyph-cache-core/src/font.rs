//! Font adapter: resolves glyph metrics for a text renderer
//!
//! Wraps the glyph cache of one face. Every lookup copies the cached metrics
//! out and releases its handle before returning, so callers never hold
//! references into the cache.

use tracing::{debug, error};

use crate::cache::{CacheStats, CacheStore};
use crate::config::GlyphCacheConfig;
use crate::constants::{DEFAULT_PIXEL_SIZE, END_OF_STRING, FIRST_PRINTABLE};
use crate::error::{CacheError, FontError, FontResult, GlyphResult, LookupError};
use crate::glyph::metrics::signed;
use crate::glyph::{
    FontContext, GlyphCacheOps, GlyphKey, GlyphLoadContext, GlyphMetrics, Rasterizer,
};

/// Font weight variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FontWeight {
    #[default]
    Normal,
    Bold,
}

/// Font slant variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FontSlant {
    #[default]
    Normal,
    Italic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FontDescription {
    pub pixel_size: u32,
    pub weight: FontWeight,
    pub slant: FontSlant,
}

impl Default for FontDescription {
    fn default() -> Self {
        Self {
            pixel_size: DEFAULT_PIXEL_SIZE,
            weight: FontWeight::Normal,
            slant: FontSlant::Normal,
        }
    }
}

impl FontDescription {
    pub fn new(pixel_size: u32) -> Self {
        Self {
            pixel_size,
            ..Self::default()
        }
    }

    pub fn with_weight(mut self, weight: FontWeight) -> Self {
        self.weight = weight;
        self
    }

    pub fn with_slant(mut self, slant: FontSlant) -> Self {
        self.slant = slant;
        self
    }

    pub fn is_italic(&self) -> bool {
        self.slant == FontSlant::Italic
    }
}

/// One face plus its glyph metrics cache
pub struct GlyphFont<R: Rasterizer> {
    face: R,
    description: FontDescription,
    cache: CacheStore<GlyphCacheOps<R>>,
}

impl<R: Rasterizer> GlyphFont<R> {
    /// Build the font and its glyph cache
    ///
    /// Cache construction failure is the only fatal error of this layer.
    pub fn new(face: R, description: FontDescription, config: &GlyphCacheConfig) -> FontResult<Self> {
        if description.pixel_size == 0 {
            return Err(FontError::Configuration {
                field: "pixel_size".to_string(),
                value: "0".to_string(),
            });
        }

        let ops = GlyphCacheOps::new(config.metrics_mode);
        let cache = CacheStore::new(ops, config.glyph_capacity()).map_err(|e| {
            error!("Glyph cache creation failed: {}", e);
            FontError::CacheCreation(e)
        })?;

        debug!(
            "Created font {:?} with {} glyph slots in {:?} mode",
            description,
            cache.capacity(),
            config.metrics_mode
        );

        Ok(Self {
            face,
            description,
            cache,
        })
    }

    /// Metrics for `code_point`, given the code point that follows it
    ///
    /// `next_code_point` is [`END_OF_STRING`] for the last glyph of a string.
    /// Control characters resolve to zeroed metrics without touching the cache.
    pub fn resolve_glyph(
        &mut self,
        context: &mut FontContext,
        code_point: u32,
        next_code_point: u32,
    ) -> GlyphResult<GlyphMetrics> {
        if code_point < FIRST_PRINTABLE {
            return Ok(GlyphMetrics::zeroed());
        }

        let key = GlyphKey::new(code_point, self.description.pixel_size);
        let mut load = GlyphLoadContext {
            face: &mut self.face,
            charmap: &mut context.charmap,
        };
        let handle = self.cache.acquire_or_create(key, &mut load).map_err(|source| {
            error!("Glyph lookup failed for U+{:04X}: {}", code_point, source);
            LookupError { code_point, source }
        })?;

        let cached = self.cache.get(&handle).copied();
        self.cache.release(handle);
        let mut metrics = cached.ok_or(LookupError {
            code_point,
            source: CacheError::StaleHandle,
        })?;

        // Last italic glyph extends to its ink so it is not clipped at line end
        if self.description.is_italic() && next_code_point == END_OF_STRING {
            metrics.advance_width = signed(metrics.box_width).saturating_add(metrics.offset_x);
        }

        Ok(metrics)
    }

    /// Resolve every character of `text`, feeding each lookup its successor
    pub fn resolve_text(
        &mut self,
        context: &mut FontContext,
        text: &str,
    ) -> Vec<(char, GlyphResult<GlyphMetrics>)> {
        let mut chars = text.chars().peekable();
        let mut resolved = Vec::new();
        while let Some(ch) = chars.next() {
            let next = chars.peek().map_or(END_OF_STRING, |&c| c as u32);
            resolved.push((ch, self.resolve_glyph(context, ch as u32, next)));
        }
        resolved
    }

    /// Switch to another pixel size; glyphs cached at other sizes stay resident
    pub fn set_pixel_size(&mut self, pixel_size: u32) -> FontResult<()> {
        if pixel_size == 0 {
            return Err(FontError::Configuration {
                field: "pixel_size".to_string(),
                value: pixel_size.to_string(),
            });
        }
        self.description.pixel_size = pixel_size;
        Ok(())
    }

    pub fn description(&self) -> &FontDescription {
        &self.description
    }

    pub fn face(&self) -> &R {
        &self.face
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    pub fn cached_glyphs(&self) -> usize {
        self.cache.len()
    }

    pub fn cache_capacity(&self) -> usize {
        self.cache.capacity()
    }

    /// Drop every cached glyph
    pub fn clear_cache(&mut self) -> usize {
        self.cache.drop_all()
    }
}
