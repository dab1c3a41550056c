//! Error types for image access

use thiserror::Error;

/// Errors that can occur while reading or writing image bytes
#[derive(Error, Debug)]
pub enum ImageError {
    /// A decode would read past the end of the image. Read paths usually
    /// degrade to 0 on this; see [`crate::image::load_map`].
    #[error("decode of {width} bytes at 0x{address:X} exceeds image length 0x{length:X}")]
    DecodeOutOfRange {
        /// Start of the attempted read
        address: u64,
        /// Bytes the format occupies
        width: usize,
        /// Image length
        length: usize,
    },

    /// An encode would write past the end of the image. Always fatal to the
    /// write: an out-of-range target means the definition is corrupt.
    #[error("encode of {width} bytes at 0x{address:X} exceeds image length 0x{length:X}")]
    EncodeOutOfRange {
        /// Start of the attempted write
        address: u64,
        /// Bytes the format occupies
        width: usize,
        /// Image length
        length: usize,
    },

    /// A cell's computed target range falls outside the image
    #[error("cell address 0x{address:X} (+{width} bytes) is outside the image (length 0x{length:X})")]
    AddressOutOfRange {
        /// Computed cell address
        address: u64,
        /// Cell size in bytes
        width: usize,
        /// Image length
        length: usize,
    },

    /// Unknown format tag on a write path. Decodes fall back to a 1-byte
    /// read; encodes must not guess a width next to live data.
    #[error("format tag '{0}' is not supported for writing")]
    UnsupportedFormat(String),

    /// The raw value cannot be represented as an integer at all
    #[error("cannot encode non-finite raw value {0}")]
    NotFinite(f64),

    /// Cell writes need an X axis to resolve column addressing
    #[error("map '{0}' has no X axis; cell writes are not possible")]
    NoXAxis(String),

    /// Row/column outside the map's grid
    #[error("cell ({row}, {col}) is outside the {rows}x{cols} grid")]
    CellOutOfBounds {
        /// Requested row
        row: usize,
        /// Requested column
        col: usize,
        /// Grid row count
        rows: usize,
        /// Grid column count
        cols: usize,
    },
}
