//! fontdue-backed rasterizer

use std::path::Path;

use fontdue::{Font, FontSettings};
use glyph_cache_core::{
    BitmapPlacement, FaceId, LoadedGlyph, MetricsMode, Rasterizer, RasterizerError,
    ScalableMetrics,
};
use tracing::debug;

/// One fontdue face
///
/// Glyph loads only compute metrics; pixel coverage is never rasterized.
pub struct FontdueRasterizer {
    face_id: FaceId,
    font: Font,
    pixel_size: f32,
}

impl FontdueRasterizer {
    pub fn from_bytes(face_id: FaceId, data: &[u8], pixel_size: u32) -> Result<Self, RasterizerError> {
        let settings = FontSettings {
            scale: pixel_size as f32,
            ..Default::default()
        };
        let font = Font::from_bytes(data, settings).map_err(|e| RasterizerError::FontData {
            reason: e.to_string(),
        })?;

        debug!("Loaded face {:?} with {} glyphs", face_id, font.glyph_count());
        Ok(Self {
            face_id,
            font,
            pixel_size: pixel_size as f32,
        })
    }

    pub fn from_file(
        face_id: FaceId,
        path: impl AsRef<Path>,
        pixel_size: u32,
    ) -> Result<Self, RasterizerError> {
        let path = path.as_ref();
        let data = std::fs::read(path).map_err(|e| RasterizerError::FontData {
            reason: format!("{}: {}", path.display(), e),
        })?;
        Self::from_bytes(face_id, &data, pixel_size)
    }

    pub fn glyph_count(&self) -> u16 {
        self.font.glyph_count()
    }

    pub fn font(&self) -> &Font {
        &self.font
    }
}

fn to_f26dot6(value: f32) -> i32 {
    (value * 64.0).round() as i32
}

fn clamp_pixels(value: usize) -> u32 {
    u32::try_from(value).unwrap_or(u32::MAX)
}

impl Rasterizer for FontdueRasterizer {
    fn face_id(&self) -> FaceId {
        self.face_id
    }

    fn char_index(&self, code_point: u32) -> u32 {
        char::from_u32(code_point)
            .map(|ch| u32::from(self.font.lookup_glyph_index(ch)))
            .unwrap_or(0)
    }

    fn set_pixel_size(&mut self, pixel_size: u32) -> Result<(), RasterizerError> {
        if pixel_size == 0 {
            return Err(RasterizerError::InvalidPixelSize(pixel_size));
        }
        self.pixel_size = pixel_size as f32;
        Ok(())
    }

    fn load_glyph(
        &mut self,
        glyph_index: u32,
        mode: MetricsMode,
    ) -> Result<LoadedGlyph, RasterizerError> {
        let index = u16::try_from(glyph_index)
            .ok()
            .filter(|&index| index < self.font.glyph_count())
            .ok_or_else(|| RasterizerError::GlyphLoad {
                glyph_index,
                reason: format!("face has {} glyphs", self.font.glyph_count()),
            })?;

        let metrics = self.font.metrics_indexed(index, self.pixel_size);
        let bounds = metrics.bounds;

        Ok(LoadedGlyph {
            metrics: ScalableMetrics {
                width: to_f26dot6(bounds.width),
                height: to_f26dot6(bounds.height),
                hori_bearing_x: to_f26dot6(bounds.xmin),
                hori_bearing_y: to_f26dot6(bounds.ymin + bounds.height),
                hori_advance: to_f26dot6(metrics.advance_width),
            },
            advance_x: to_f26dot6(metrics.advance_width),
            bitmap: match mode {
                MetricsMode::Bitmap => Some(BitmapPlacement {
                    width: clamp_pixels(metrics.width),
                    rows: clamp_pixels(metrics.height),
                    left: metrics.xmin,
                    top: metrics
                        .ymin
                        .saturating_add(i32::try_from(metrics.height).unwrap_or(i32::MAX)),
                }),
                MetricsMode::Outline => None,
            },
        })
    }
}
