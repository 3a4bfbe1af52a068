//! Dummy rasterizer for testing the glyph cache without a font engine

use std::cell::Cell;
use std::collections::{HashMap, HashSet};

use crate::error::RasterizerError;
use crate::glyph::metrics::signed;
use crate::glyph::{BitmapPlacement, FaceId, LoadedGlyph, MetricsMode, Rasterizer, ScalableMetrics};

/// Pixel metrics of a programmed glyph, independent of the pixel size
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DummyGlyph {
    pub advance: i32,
    pub width: u32,
    pub height: u32,
    pub bearing_x: i32,
    pub bearing_y: i32,
}

impl DummyGlyph {
    pub fn new(advance: i32, width: u32, height: u32, bearing_x: i32, bearing_y: i32) -> Self {
        Self {
            advance,
            width,
            height,
            bearing_x,
            bearing_y,
        }
    }

    /// Generic glyph proportions derived from the pixel size
    fn scaled(pixel_size: u32) -> Self {
        let size = signed(pixel_size);
        let three_quarters = (i64::from(size) * 3 / 4) as i32;
        Self {
            advance: size / 2,
            width: (pixel_size / 2).saturating_sub(1),
            height: (u64::from(pixel_size) * 3 / 4) as u32,
            bearing_x: 1,
            bearing_y: three_quarters - size / 8,
        }
    }
}

/// Dummy rasterizer - records operations for testing
///
/// Printable ASCII maps to glyph indices `code_point - 0x1F`; anything else is
/// unmapped (index 0) unless programmed with [`DummyRasterizer::with_glyph`].
pub struct DummyRasterizer {
    face_id: FaceId,
    pixel_size: u32,
    charmap: HashMap<u32, u32>,
    glyphs: HashMap<u32, DummyGlyph>,
    failing: HashSet<u32>,
    next_index: u32,
    loads: Vec<(u32, u32)>,
    char_lookups: Cell<usize>,
}

impl DummyRasterizer {
    pub fn new(face_id: FaceId) -> Self {
        let charmap = (0x20..0x7F).map(|cp| (cp, cp - 0x1F)).collect();
        DummyRasterizer {
            face_id,
            pixel_size: 0,
            charmap,
            glyphs: HashMap::new(),
            failing: HashSet::new(),
            next_index: 0x80,
            loads: Vec::new(),
            char_lookups: Cell::new(0),
        }
    }

    /// Map `code_point` to a fixed glyph, keeping its existing index if mapped
    pub fn with_glyph(mut self, code_point: u32, glyph: DummyGlyph) -> Self {
        let index = match self.charmap.get(&code_point) {
            Some(&index) => index,
            None => {
                let index = self.next_index;
                self.next_index += 1;
                self.charmap.insert(code_point, index);
                index
            }
        };
        self.glyphs.insert(index, glyph);
        self
    }

    /// Make every load of the glyph behind `code_point` fail
    pub fn failing_on(mut self, code_point: u32) -> Self {
        let index = self.char_index(code_point);
        self.failing.insert(index);
        self
    }

    pub fn unmap(mut self, code_point: u32) -> Self {
        self.charmap.remove(&code_point);
        self
    }

    pub fn pixel_size(&self) -> u32 {
        self.pixel_size
    }

    /// (glyph index, pixel size) of every load, in order
    pub fn loads(&self) -> &[(u32, u32)] {
        &self.loads
    }

    pub fn char_lookups(&self) -> usize {
        self.char_lookups.get()
    }

    /// Clear recorded operations
    pub fn clear(&mut self) {
        self.loads.clear();
        self.char_lookups.set(0);
    }
}

fn to_f26dot6(pixels: i32) -> i32 {
    pixels.saturating_mul(64)
}

impl Rasterizer for DummyRasterizer {
    fn face_id(&self) -> FaceId {
        self.face_id
    }

    fn char_index(&self, code_point: u32) -> u32 {
        self.char_lookups.set(self.char_lookups.get() + 1);
        self.charmap.get(&code_point).copied().unwrap_or(0)
    }

    fn set_pixel_size(&mut self, pixel_size: u32) -> Result<(), RasterizerError> {
        if pixel_size == 0 {
            return Err(RasterizerError::InvalidPixelSize(pixel_size));
        }
        self.pixel_size = pixel_size;
        Ok(())
    }

    fn load_glyph(
        &mut self,
        glyph_index: u32,
        mode: MetricsMode,
    ) -> Result<LoadedGlyph, RasterizerError> {
        if self.failing.contains(&glyph_index) {
            return Err(RasterizerError::GlyphLoad {
                glyph_index,
                reason: "injected failure".to_string(),
            });
        }
        self.loads.push((glyph_index, self.pixel_size));

        let glyph = self
            .glyphs
            .get(&glyph_index)
            .copied()
            .unwrap_or_else(|| DummyGlyph::scaled(self.pixel_size));

        Ok(LoadedGlyph {
            metrics: ScalableMetrics {
                width: to_f26dot6(signed(glyph.width)),
                height: to_f26dot6(signed(glyph.height)),
                hori_bearing_x: to_f26dot6(glyph.bearing_x),
                hori_bearing_y: to_f26dot6(glyph.bearing_y),
                hori_advance: to_f26dot6(glyph.advance),
            },
            advance_x: to_f26dot6(glyph.advance),
            bitmap: match mode {
                MetricsMode::Bitmap => Some(BitmapPlacement {
                    width: glyph.width,
                    rows: glyph.height,
                    left: glyph.bearing_x,
                    top: glyph.bearing_y,
                }),
                MetricsMode::Outline => None,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ascii_is_mapped() {
        let face = DummyRasterizer::new(FaceId(1));
        assert_eq!(face.char_index(' ' as u32), 1);
        assert_eq!(face.char_index('~' as u32), 0x5F);
        assert_eq!(face.char_index(0x4E00), 0);
        assert_eq!(face.char_lookups(), 3);
    }

    #[test]
    fn test_programmed_glyph_gets_new_index() {
        let face = DummyRasterizer::new(FaceId(1)).with_glyph(0x4E00, DummyGlyph::new(16, 15, 15, 0, 13));
        assert_eq!(face.char_index(0x4E00), 0x80);
    }

    #[test]
    fn test_load_records_size_and_mode() {
        let mut face = DummyRasterizer::new(FaceId(1));
        face.set_pixel_size(20).unwrap();

        let outline = face.load_glyph(34, MetricsMode::Outline).unwrap();
        assert!(outline.bitmap.is_none());
        assert_eq!(outline.metrics.hori_advance, 10 * 64);

        let bitmap = face.load_glyph(34, MetricsMode::Bitmap).unwrap();
        assert_eq!(bitmap.bitmap.map(|b| b.rows), Some(15));
        assert_eq!(face.loads(), &[(34, 20), (34, 20)]);

        face.clear();
        assert!(face.loads().is_empty());
    }

    #[test]
    fn test_huge_pixel_size_saturates() {
        let mut face = DummyRasterizer::new(FaceId(1));
        face.set_pixel_size(u32::MAX / 2).unwrap();
        let glyph = face.load_glyph(34, MetricsMode::Outline).unwrap();
        assert_eq!(glyph.metrics.height, i32::MAX);
        assert_eq!(glyph.advance_x, i32::MAX);
    }

    #[test]
    fn test_injected_failure() {
        let mut face = DummyRasterizer::new(FaceId(1)).failing_on('A' as u32);
        face.set_pixel_size(12).unwrap();
        let index = face.char_index('A' as u32);
        assert!(matches!(
            face.load_glyph(index, MetricsMode::Outline),
            Err(RasterizerError::GlyphLoad { .. })
        ));
        assert!(face.loads().is_empty());
    }
}
