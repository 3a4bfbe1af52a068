use std::cmp::Ordering;

/// Cache key for one glyph at one pixel size
///
/// Ordered by code point, then pixel size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GlyphKey {
    code_point: u32,
    pixel_size: u32,
}

impl GlyphKey {
    pub const fn new(code_point: u32, pixel_size: u32) -> Self {
        Self {
            code_point,
            pixel_size,
        }
    }

    pub fn code_point(&self) -> u32 {
        self.code_point
    }

    pub fn pixel_size(&self) -> u32 {
        self.pixel_size
    }

    pub fn compare(&self, other: &Self) -> Ordering {
        self.code_point
            .cmp(&other.code_point)
            .then_with(|| self.pixel_size.cmp(&other.pixel_size))
    }
}

impl PartialOrd for GlyphKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.compare(other))
    }
}

impl Ord for GlyphKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.compare(other)
    }
}
