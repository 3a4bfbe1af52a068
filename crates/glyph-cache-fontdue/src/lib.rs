//! Glyph Cache fontdue - fontdue backend for glyph-cache-core
//!
//! Implements the [`Rasterizer`](glyph_cache_core::Rasterizer) trait on top of
//! `fontdue`, and locates system fonts to feed it.

pub mod discovery;
pub mod rasterizer;

pub use discovery::{default_search_paths, find_font_files, first_system_font, preferred_font};
pub use rasterizer::FontdueRasterizer;
