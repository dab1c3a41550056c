//! Editing session
//!
//! A [`TuneSession`] exclusively owns the image buffer and the loaded maps
//! for one open firmware file. All edits flow through `&mut self`, which
//! models the single-writer contract directly: at most one edit is in
//! flight, and the buffer is never shared.
//!
//! Saving follows the safe order: back up the previous on-disk bytes first,
//! then recompute every checksum block, then persist. A failure during
//! checksum recomputation leaves the on-disk file untouched.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::checksum::{self, ChecksumError};
use crate::image::{self, CellUpdate, ImageError, LoadedMap};
use crate::xdf::DefinitionSet;

/// Errors from session-level operations
#[derive(Error, Debug)]
pub enum SessionError {
    /// File read/write failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A cell edit failed
    #[error(transparent)]
    Image(#[from] ImageError),

    /// Checksum recomputation failed; the save was aborted
    #[error(transparent)]
    Checksum(#[from] ChecksumError),

    /// Map index outside the loaded set
    #[error("no map at index {0}")]
    NoSuchMap(usize),
}

/// One open firmware image plus its loaded maps
pub struct TuneSession {
    definitions: DefinitionSet,
    image: Vec<u8>,
    maps: Vec<LoadedMap>,
    modified: bool,
}

impl TuneSession {
    /// Open a session over an image already read into memory.
    ///
    /// Every map definition is loaded immediately; loading is best-effort,
    /// so a definition pointing past the image still yields a (zeroed) map.
    pub fn open(definitions: DefinitionSet, image: Vec<u8>) -> Self {
        let maps = definitions
            .maps
            .iter()
            .map(|def| image::load_map(def, &image))
            .collect();

        tracing::debug!(
            maps = definitions.maps.len(),
            checksums = definitions.checksums.len(),
            image_len = image.len(),
            "session opened"
        );

        Self {
            definitions,
            image,
            maps,
            modified: false,
        }
    }

    /// Open a session by reading the image from disk.
    pub fn open_file<P: AsRef<Path>>(
        definitions: DefinitionSet,
        path: P,
    ) -> Result<Self, SessionError> {
        let image = fs::read(path)?;
        Ok(Self::open(definitions, image))
    }

    /// All loaded maps, in definition order
    pub fn maps(&self) -> &[LoadedMap] {
        &self.maps
    }

    /// One loaded map by index
    pub fn map(&self, index: usize) -> Option<&LoadedMap> {
        self.maps.get(index)
    }

    /// The raw image bytes (read-only; edits go through the cell API)
    pub fn image(&self) -> &[u8] {
        &self.image
    }

    /// Whether any edit has landed since open or the last save
    pub fn is_modified(&self) -> bool {
        self.modified
    }

    /// Edit one cell of one map.
    ///
    /// Returns the physical value actually stored after clamping/rounding,
    /// which is also what the in-memory map now shows.
    pub fn edit_cell(
        &mut self,
        map_index: usize,
        row: usize,
        col: usize,
        new_physical: f64,
    ) -> Result<f64, SessionError> {
        let map = self
            .maps
            .get_mut(map_index)
            .ok_or(SessionError::NoSuchMap(map_index))?;

        let stored = image::write_cell(map, row, col, new_physical, &mut self.image)?;
        self.modified = true;
        Ok(stored)
    }

    /// Apply a value transform to a set of cells of one map.
    ///
    /// Each cell's transform input is its own current physical value.
    pub fn apply_bulk<F>(
        &mut self,
        map_index: usize,
        cells: &[(usize, usize)],
        transform: F,
    ) -> Result<Vec<CellUpdate>, SessionError>
    where
        F: FnMut(f64) -> f64,
    {
        let map = self
            .maps
            .get_mut(map_index)
            .ok_or(SessionError::NoSuchMap(map_index))?;

        let updates = image::apply_bulk(map, cells, transform, &mut self.image)?;
        if !updates.is_empty() {
            self.modified = true;
        }
        Ok(updates)
    }

    /// Recompute and write every checksum block.
    ///
    /// All-or-nothing: a bad block leaves the image unchanged.
    pub fn finalize_checksums(&mut self) -> Result<(), SessionError> {
        checksum::recompute_all(&mut self.image, &self.definitions.checksums)?;
        Ok(())
    }

    /// Save the image to `path`, keeping a `.bak` of the previous file.
    ///
    /// Order matters: the backup is written before any checksum byte is
    /// mutated, so a failure mid-save leaves a recoverable prior file.
    pub fn save_to<P: AsRef<Path>>(&mut self, path: P) -> Result<PathBuf, SessionError> {
        let path = path.as_ref();

        let backup = backup_path(path);
        if path.exists() {
            fs::copy(path, &backup)?;
            tracing::debug!(backup = %backup.display(), "backup written");
        }

        self.finalize_checksums()?;
        fs::write(path, &self.image)?;
        self.modified = false;

        Ok(backup)
    }
}

fn backup_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".bak");
    PathBuf::from(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xdf::{ChecksumDefinition, MapAxis, MapDefinition};
    use pretty_assertions::assert_eq;

    fn definitions() -> DefinitionSet {
        DefinitionSet {
            maps: vec![MapDefinition {
                title: "Fuel".to_string(),
                address: 0x10,
                value_format: "8bit".to_string(),
                forward_formula: "X / 2".to_string(),
                inverse_formula: "X * 2".to_string(),
                x_axis: Some(MapAxis {
                    name: "RPM".to_string(),
                    dimension: 4,
                    value_format: "8bit".to_string(),
                    forward_formula: "X".to_string(),
                    inverse_formula: "X".to_string(),
                    source_address: None,
                    fixed_values: vec![1000.0, 2000.0, 3000.0, 4000.0],
                }),
                y_axis: None,
            }],
            checksums: vec![ChecksumDefinition {
                title: "Main".to_string(),
                storage_address: 0x1F,
                algorithm: "SUM8".to_string(),
                start_address: 0x00,
                end_address: 0x1E,
            }],
        }
    }

    #[test]
    fn edit_updates_map_and_image_coherently() {
        let mut session = TuneSession::open(definitions(), vec![0u8; 0x20]);

        let stored = session.edit_cell(0, 0, 2, 21.0).unwrap();

        assert_eq!(stored, 21.0);
        assert_eq!(session.image()[0x12], 42);
        assert_eq!(session.map(0).unwrap().value(0, 2), Some(21.0));
        assert!(session.is_modified());
    }

    #[test]
    fn missing_map_index_is_reported() {
        let mut session = TuneSession::open(definitions(), vec![0u8; 0x20]);
        assert!(matches!(
            session.edit_cell(5, 0, 0, 1.0),
            Err(SessionError::NoSuchMap(5))
        ));
    }

    #[test]
    fn failed_edit_leaves_session_clean() {
        let mut session = TuneSession::open(definitions(), vec![0u8; 0x12]);

        // Cell (0, 3) resolves to 0x13, past the 0x12-byte image
        assert!(session.edit_cell(0, 0, 3, 1.0).is_err());
        assert!(!session.is_modified());
        assert!(session.image().iter().all(|&b| b == 0));
    }

    #[test]
    fn save_writes_backup_checksum_and_image() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tune.bin");
        fs::write(&path, vec![0xAAu8; 0x20]).unwrap();

        let mut session = TuneSession::open_file(definitions(), &path).unwrap();
        session.edit_cell(0, 0, 0, 10.0).unwrap();
        let backup = session.save_to(&path).unwrap();

        // Backup holds the pre-edit bytes
        assert_eq!(fs::read(&backup).unwrap(), vec![0xAAu8; 0x20]);

        let saved = fs::read(&path).unwrap();
        assert_eq!(saved[0x10], 20);
        // SUM8 over 0x00..=0x1E of the edited image
        let sum: u64 = saved[0x00..=0x1E].iter().map(|&b| b as u64).sum();
        assert_eq!(saved[0x1F], (sum & 0xFF) as u8);
        assert!(!session.is_modified());
    }

    #[test]
    fn bad_checksum_definition_aborts_save_before_writing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tune.bin");
        fs::write(&path, vec![0x11u8; 0x20]).unwrap();

        let mut defs = definitions();
        defs.checksums[0].end_address = 0x100; // past the image

        let mut session = TuneSession::open_file(defs, &path).unwrap();
        session.edit_cell(0, 0, 0, 10.0).unwrap();
        assert!(session.save_to(&path).is_err());

        // On-disk file is untouched by the failed save
        assert_eq!(fs::read(&path).unwrap(), vec![0x11u8; 0x20]);
    }
}
