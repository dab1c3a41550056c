//! Map loader
//!
//! Walks a map definition's geometry and builds the in-memory table:
//! decode raw bytes, apply the forward formula, store physical values.
//!
//! Loading is best-effort by design. A cell past the end of a too-small
//! image decodes as 0 with a diagnostic instead of failing the whole load,
//! so a truncated image still shows partial data. Write paths are strict
//! (see [`super::writer`]).

use serde::{Deserialize, Serialize};

use super::codec;
use super::format::width_of_tag;
use crate::formula;
use crate::xdf::{MapAxis, MapDefinition};

/// A calibration table loaded into memory.
///
/// All stored values are physical (already converted); the raw integers
/// only exist in the image buffer. `z_values` is row-major with rows equal
/// to the Y dimension and columns equal to the X dimension, always fully
/// allocated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadedMap {
    /// The definition this map was loaded from
    pub definition: MapDefinition,

    /// Column header values, physical (empty when the X axis has no data)
    pub x_axis_values: Vec<f64>,

    /// Row header values, physical (empty when the Y axis has no data)
    pub y_axis_values: Vec<f64>,

    /// Table cell values, physical, indexed `[row][col]`
    pub z_values: Vec<Vec<f64>>,
}

impl LoadedMap {
    /// Number of columns
    pub fn x_dimension(&self) -> usize {
        self.definition.x_dimension()
    }

    /// Number of rows
    pub fn y_dimension(&self) -> usize {
        self.definition.y_dimension()
    }

    /// Physical value at a cell, if the cell exists
    pub fn value(&self, row: usize, col: usize) -> Option<f64> {
        self.z_values.get(row).and_then(|r| r.get(col)).copied()
    }
}

/// Decode one cell leniently: out-of-range reads degrade to 0 so partial
/// loads stay usable.
fn decode_lenient(buffer: &[u8], address: u64, tag: &str, what: &str) -> f64 {
    match codec::decode_tag(buffer, address, tag) {
        Ok(raw) => raw,
        Err(err) => {
            tracing::warn!(%err, what, "read past end of image, using 0");
            0.0
        }
    }
}

/// Load axis header values from the image, or take the fixed ones.
fn load_axis_values(axis: &MapAxis, buffer: &[u8]) -> Vec<f64> {
    let source = match axis.source_address {
        Some(addr) if axis.dimension > 0 => addr,
        _ => return axis.fixed_values.clone(),
    };

    let cell_size = width_of_tag(&axis.value_format) as u64;
    let mut values = Vec::with_capacity(axis.dimension);

    for i in 0..axis.dimension {
        let address = source.saturating_add(i as u64 * cell_size);
        let raw = decode_lenient(buffer, address, &axis.value_format, &axis.name);
        values.push(formula::evaluate(&axis.forward_formula, raw));
    }

    values
}

/// Load a map's table data and axis headers from the image buffer.
///
/// Cells are laid out row-major and fully contiguous:
/// `address = base + (row * x_dimension + col) * cell_size`.
pub fn load_map(definition: &MapDefinition, buffer: &[u8]) -> LoadedMap {
    let x_dim = definition.x_dimension();
    let y_dim = definition.y_dimension();
    let cell_size = width_of_tag(&definition.value_format) as u64;

    let mut z_values = vec![vec![0.0f64; x_dim]; y_dim];
    for (row, row_values) in z_values.iter_mut().enumerate() {
        for (col, cell) in row_values.iter_mut().enumerate() {
            let index = (row * x_dim + col) as u64;
            let address = definition.address.saturating_add(index * cell_size);
            let raw = decode_lenient(buffer, address, &definition.value_format, &definition.title);
            *cell = formula::evaluate(&definition.forward_formula, raw);
        }
    }

    let x_axis_values = definition
        .x_axis
        .as_ref()
        .map(|axis| load_axis_values(axis, buffer))
        .unwrap_or_default();
    let y_axis_values = definition
        .y_axis
        .as_ref()
        .map(|axis| load_axis_values(axis, buffer))
        .unwrap_or_default();

    LoadedMap {
        definition: definition.clone(),
        x_axis_values,
        y_axis_values,
        z_values,
    }
}
