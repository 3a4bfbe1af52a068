// src/constants.rs

use std::num::NonZeroUsize;

/// Slots reserved for scalable outlines; the glyph cache holds twice as many entries
pub const DEFAULT_OUTLINE_CACHE_SIZE: usize = 256;
pub const GLYPH_CACHE_SIZE_FACTOR: usize = 2;

/// Memoized (face, code point) to glyph index mappings per font context
pub const DEFAULT_CHARMAP_CACHE_SIZE: NonZeroUsize = match NonZeroUsize::new(1024) {
    Some(size) => size,
    None => panic!("charmap cache size must be non-zero"),
};

/// Code points below this are control characters and never reach the cache
pub const FIRST_PRINTABLE: u32 = 0x20;

/// Lookahead value marking the last glyph of a string
pub const END_OF_STRING: u32 = 0;

pub const BITS_PER_PIXEL: u8 = 8;

/// Glyph index rasterizers report for unmapped code points
pub const PLACEHOLDER_GLYPH_INDEX: u32 = 0;

pub const DEFAULT_PIXEL_SIZE: u32 = 16;
