//! glyphcache - glyph metrics cache for text renderers
//!
//! This crate bundles:
//! - a generic reference-counted LRU cache store
//! - its glyph metrics instantiation keyed by code point and pixel size
//! - a font adapter resolving metrics for text renderers
//! - a fontdue rasterizer backend

pub use glyph_cache_core::*;
pub use glyph_cache_fontdue::{
    default_search_paths, find_font_files, first_system_font, FontdueRasterizer,
};
