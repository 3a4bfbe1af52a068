// src/error.rs
use thiserror::Error;

/// Failures reported by the generic cache store
///
/// `E` is the error type of the store's creation callback.
#[derive(Error, Debug)]
pub enum CacheError<E> {
    #[error("Cache allocation failed for {capacity} slots: {reason}")]
    Allocation { capacity: usize, reason: String },

    #[error("All {capacity} cache entries are in use")]
    CapacityExhausted { capacity: usize },

    #[error("Entry creation failed: {0}")]
    Creation(#[source] E),

    #[error("Cache lock poisoned: {message}")]
    LockPoisoned { message: String },

    #[error("Entry handle does not refer to a resident entry")]
    StaleHandle,
}

impl<E> CacheError<E> {
    /// Whether the failure only affects the current lookup
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, CacheError::Allocation { .. })
    }
}

pub type CacheResult<T, E> = Result<T, CacheError<E>>;

/// Errors raised by a rasterizer while loading glyph metrics
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RasterizerError {
    #[error("Invalid pixel size: {0}")]
    InvalidPixelSize(u32),

    #[error("Failed to load glyph {glyph_index}: {reason}")]
    GlyphLoad { glyph_index: u32, reason: String },

    #[error("Glyph {glyph_index} has no bitmap placement")]
    MissingBitmap { glyph_index: u32 },

    #[error("Invalid font data: {reason}")]
    FontData { reason: String },
}

/// Glyph metrics could not be resolved for a code point
#[derive(Error, Debug)]
#[error("Glyph lookup failed for U+{code_point:04X}: {source}")]
pub struct LookupError {
    pub code_point: u32,
    #[source]
    pub source: CacheError<RasterizerError>,
}

/// Errors raised while setting up a font
#[derive(Error, Debug)]
pub enum FontError {
    #[error("Failed to create glyph cache: {0}")]
    CacheCreation(#[source] CacheError<RasterizerError>),

    #[error("Invalid font configuration: {field} = {value}")]
    Configuration { field: String, value: String },
}

pub type GlyphResult<T> = Result<T, LookupError>;
pub type FontResult<T> = Result<T, FontError>;
