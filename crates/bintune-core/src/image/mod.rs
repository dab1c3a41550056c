//! Binary image access
//!
//! Everything that touches raw firmware bytes: the format catalog, the
//! scalar codec, the map loader, and the cell writer. The image buffer is
//! always passed in by the caller; this module never retains a copy.

mod codec;
mod error;
mod format;
mod loader;
mod writer;

pub use codec::{decode, decode_tag, encode, encode_tag};
pub use error::ImageError;
pub use format::{width_of_tag, Endianness, ValueFormat};
pub use loader::{load_map, LoadedMap};
pub use writer::{apply_bulk, write_cell, CellUpdate};
