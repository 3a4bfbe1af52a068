//! Glyph metrics and their derivation from rasterizer output

use crate::constants::{BITS_PER_PIXEL, PLACEHOLDER_GLYPH_INDEX};
use crate::error::RasterizerError;
use crate::glyph::rasterizer::LoadedGlyph;

/// Where glyph dimensions come from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricsMode {
    /// Scalable outline metrics
    Outline,
    /// Placement of the rendered bitmap
    Bitmap,
}

impl MetricsMode {
    /// Mode selected at build time through the `bitmap-metrics` feature
    pub const fn configured() -> Self {
        if cfg!(feature = "bitmap-metrics") {
            MetricsMode::Bitmap
        } else {
            MetricsMode::Outline
        }
    }
}

impl Default for MetricsMode {
    fn default() -> Self {
        Self::configured()
    }
}

/// Per-glyph layout metrics, in whole pixels
///
/// Plain value type: callers always receive copies, never references into the
/// cache.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GlyphMetrics {
    /// Pen advance after drawing the glyph
    pub advance_width: i32,
    pub box_width: u32,
    pub box_height: u32,
    pub offset_x: i32,
    /// Bottom of the box relative to the baseline
    pub offset_y: i32,
    pub bits_per_pixel: u8,
    /// The font has no mapping for the code point and its fallback glyph was used
    pub is_placeholder: bool,
    pub glyph_index: u32,
}

/// Convert a 26.6 fixed point value to whole pixels (floor)
pub const fn f26dot6_to_int(value: i32) -> i32 {
    value >> 6
}

impl GlyphMetrics {
    pub const fn zeroed() -> Self {
        Self {
            advance_width: 0,
            box_width: 0,
            box_height: 0,
            offset_x: 0,
            offset_y: 0,
            bits_per_pixel: 0,
            is_placeholder: false,
            glyph_index: 0,
        }
    }

    /// Build cache metrics from a freshly loaded glyph
    pub fn from_loaded(
        glyph_index: u32,
        glyph: &LoadedGlyph,
        mode: MetricsMode,
    ) -> Result<Self, RasterizerError> {
        let mut metrics = match mode {
            MetricsMode::Outline => {
                let scalable = &glyph.metrics;
                Self {
                    advance_width: f26dot6_to_int(scalable.hori_advance),
                    box_width: pixels(f26dot6_to_int(scalable.width)),
                    box_height: pixels(f26dot6_to_int(scalable.height)),
                    offset_x: f26dot6_to_int(scalable.hori_bearing_x),
                    offset_y: f26dot6_to_int(scalable.hori_bearing_y.saturating_sub(scalable.height)),
                    ..Self::zeroed()
                }
            }
            MetricsMode::Bitmap => {
                let bitmap = glyph
                    .bitmap
                    .as_ref()
                    .ok_or(RasterizerError::MissingBitmap { glyph_index })?;
                Self {
                    advance_width: f26dot6_to_int(glyph.advance_x),
                    box_width: bitmap.width,
                    box_height: bitmap.rows,
                    offset_x: bitmap.left,
                    offset_y: bitmap.top.saturating_sub(signed(bitmap.rows)),
                    ..Self::zeroed()
                }
            }
        };

        metrics.bits_per_pixel = BITS_PER_PIXEL;
        metrics.is_placeholder = glyph_index == PLACEHOLDER_GLYPH_INDEX;
        metrics.glyph_index = glyph_index;
        Ok(metrics)
    }
}

fn pixels(value: i32) -> u32 {
    u32::try_from(value).unwrap_or(0)
}

/// Clamp a pixel extent into the signed range
pub(crate) fn signed(value: u32) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}
