//! Glyph instantiation of the generic cache
//!
//! Keys are (code point, pixel size) pairs, values are [`GlyphMetrics`]
//! computed by a [`Rasterizer`] on first use.

pub mod key;
pub mod metrics;
pub mod rasterizer;
pub mod record;

pub use key::GlyphKey;
pub use metrics::{f26dot6_to_int, GlyphMetrics, MetricsMode};
pub use rasterizer::{
    BitmapPlacement, CharmapCache, CharmapOps, FaceId, FontContext, LoadedGlyph, Rasterizer, ScalableMetrics,
};
pub use record::{GlyphCacheOps, GlyphLoadContext};
