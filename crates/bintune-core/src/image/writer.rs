//! Map writer
//!
//! Pushes an edited physical value back into the image, one cell at a time:
//! inverse formula, address arithmetic, encode with clamping, then a
//! read-back so the in-memory table holds exactly what the bytes now say.
//!
//! The read-back is the load-bearing invariant: when an edit gets clamped
//! or rounded, the table must show the value actually stored, never the
//! value the caller asked for.

use serde::{Deserialize, Serialize};

use super::codec;
use super::error::ImageError;
use super::format::ValueFormat;
use super::loader::LoadedMap;
use crate::formula;

/// Outcome of one cell write inside a bulk edit
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CellUpdate {
    /// Row of the written cell
    pub row: usize,
    /// Column of the written cell
    pub col: usize,
    /// Physical value now represented by the stored bytes
    pub value: f64,
}

/// Resolve the byte address of a cell using the loader's layout formula.
fn cell_address(map: &LoadedMap, row: usize, col: usize, cell_size: usize) -> u64 {
    let index = (row * map.x_dimension() + col) as u64;
    map.definition
        .address
        .saturating_add(index.saturating_mul(cell_size as u64))
}

/// Write one edited cell and return the physical value actually stored.
///
/// Steps: inverse formula to raw, bounds check (the buffer and map are left
/// untouched on failure), encode with authoritative rounding/clamping, then
/// decode the just-written bytes and re-apply the forward formula. The
/// recomputed value is stored in `z_values[row][col]` and returned.
///
/// Maps without an X axis reject writes: column addressing depends on the
/// X dimension.
pub fn write_cell(
    map: &mut LoadedMap,
    row: usize,
    col: usize,
    new_physical: f64,
    buffer: &mut [u8],
) -> Result<f64, ImageError> {
    if map.definition.x_axis.is_none() {
        return Err(ImageError::NoXAxis(map.definition.title.clone()));
    }

    let rows = map.y_dimension();
    let cols = map.x_dimension();
    if row >= rows || col >= cols {
        return Err(ImageError::CellOutOfBounds {
            row,
            col,
            rows,
            cols,
        });
    }

    let tag = &map.definition.value_format;
    let format = ValueFormat::from_tag(tag)
        .ok_or_else(|| ImageError::UnsupportedFormat(tag.clone()))?;

    let raw = formula::evaluate(&map.definition.inverse_formula, new_physical);

    let cell_size = format.size_bytes();
    let address = cell_address(map, row, col, cell_size);
    if address.saturating_add(cell_size as u64) > buffer.len() as u64 {
        return Err(ImageError::AddressOutOfRange {
            address,
            width: cell_size,
            length: buffer.len(),
        });
    }

    codec::encode(buffer, address, format, raw)?;

    let stored_raw = codec::decode(buffer, address, format)?;
    let stored_physical = formula::evaluate(&map.definition.forward_formula, stored_raw);
    map.z_values[row][col] = stored_physical;

    Ok(stored_physical)
}

/// Apply a value transform to a set of cells.
///
/// The transform sees each cell's own current physical value, never a
/// batch-wide snapshot, so transforms like "add N" are order-independent.
/// Returns the per-cell outcomes in input order.
pub fn apply_bulk<F>(
    map: &mut LoadedMap,
    cells: &[(usize, usize)],
    mut transform: F,
    buffer: &mut [u8],
) -> Result<Vec<CellUpdate>, ImageError>
where
    F: FnMut(f64) -> f64,
{
    let mut updates = Vec::with_capacity(cells.len());

    for &(row, col) in cells {
        let current = map
            .value(row, col)
            .ok_or(ImageError::CellOutOfBounds {
                row,
                col,
                rows: map.y_dimension(),
                cols: map.x_dimension(),
            })?;

        let value = write_cell(map, row, col, transform(current), buffer)?;
        updates.push(CellUpdate { row, col, value });
    }

    Ok(updates)
}
