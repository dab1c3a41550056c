//! # BinTune Core Library
//!
//! Core functionality for the BinTune firmware calibration editor.

#![warn(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

//!
//! This library provides:
//! - Definition records for maps, axes, and checksum blocks (XDF-style)
//! - A binary codec for scalar values inside a raw firmware image
//! - Conversion formula evaluation (raw <-> physical units)
//! - Map loading and cell-by-cell editing
//! - Checksum recomputation over defined byte ranges
//! - An editing session that owns the image buffer and drives saves
//!
//! The definition file parser and the presentation layer live outside this
//! crate; definitions arrive as already-resolved records (all types are
//! serde-deserializable so a host can feed them from JSON).
//!
//! ## Example
//!
//! ```rust,ignore
//! use bintune_core::{session::TuneSession, xdf::DefinitionSet};
//!
//! let definitions: DefinitionSet = serde_json::from_str(&json)?;
//! let mut session = TuneSession::open_file(definitions, "stock.bin")?;
//!
//! // Edit one cell of the first map (row 2, column 3)
//! let stored = session.edit_cell(0, 2, 3, 14.7)?;
//! println!("image now holds {stored}");
//!
//! // Backup, recompute checksums, persist
//! session.save_to("stock.bin")?;
//! ```

pub mod checksum;
pub mod formula;
pub mod image;
pub mod session;
pub mod xdf;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::checksum::{ChecksumAlgorithm, ChecksumError};
    pub use crate::image::{
        load_map, CellUpdate, Endianness, ImageError, LoadedMap, ValueFormat,
    };
    pub use crate::session::{SessionError, TuneSession};
    pub use crate::xdf::{ChecksumDefinition, DefinitionSet, MapAxis, MapDefinition};
}

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
