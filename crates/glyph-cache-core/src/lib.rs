//! Glyph Cache Core - rasterizer-agnostic glyph metrics cache
//!
//! This crate provides a generic fixed-capacity cache with reference counting
//! and LRU eviction, and its instantiation for glyph metrics keyed by
//! (code point, pixel size). Font engines plug in through the
//! [`Rasterizer`] trait.

pub mod cache;
pub mod config;
pub mod constants;
pub mod dummy_rasterizer;
pub mod error;
pub mod font;
pub mod glyph;

// Re-export main types
pub use cache::{CacheOps, CacheStats, CacheStore, EntryHandle, SharedCacheStore};
pub use config::GlyphCacheConfig;
pub use constants::END_OF_STRING;
pub use error::{
    CacheError, CacheResult, FontError, FontResult, GlyphResult, LookupError, RasterizerError,
};
pub use font::{FontDescription, FontSlant, FontWeight, GlyphFont};
pub use glyph::{
    BitmapPlacement, CharmapCache, FaceId, FontContext, GlyphCacheOps, GlyphKey, GlyphMetrics,
    LoadedGlyph, MetricsMode, Rasterizer, ScalableMetrics,
};
