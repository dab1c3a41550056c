//! Definition records for maps, axes, and checksum blocks
//!
//! These are the already-parsed form of an XDF-style definition file.
//! Addresses are absolute byte offsets into the firmware image; formulas are
//! arithmetic expressions over one free variable `X` (see [`crate::formula`]).
//! Records are immutable after load.

use serde::{Deserialize, Serialize};

fn identity_formula() -> String {
    "X".to_string()
}

fn default_checksum_title() -> String {
    "Checksum".to_string()
}

/// Definition of one calibration table in the image
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MapDefinition {
    /// Display name, e.g. "Main Ignition Table"
    pub title: String,

    /// Byte offset of the first table cell in the image
    pub address: u64,

    /// Format tag for table cells, e.g. "8bit", "16bit_hi_lo"
    pub value_format: String,

    /// Raw -> physical conversion formula for table cells
    #[serde(default = "identity_formula")]
    pub forward_formula: String,

    /// Physical -> raw conversion formula for table cells
    #[serde(default = "identity_formula")]
    pub inverse_formula: String,

    /// Column axis; absent for 1-D tables (treated as one column)
    #[serde(default)]
    pub x_axis: Option<MapAxis>,

    /// Row axis; absent for 1-D/2-D tables (treated as one row)
    #[serde(default)]
    pub y_axis: Option<MapAxis>,
}

impl MapDefinition {
    /// Number of columns (1 when no X axis is defined)
    pub fn x_dimension(&self) -> usize {
        self.x_axis.as_ref().map(|a| a.dimension).unwrap_or(1)
    }

    /// Number of rows (1 when no Y axis is defined)
    pub fn y_dimension(&self) -> usize {
        self.y_axis.as_ref().map(|a| a.dimension).unwrap_or(1)
    }
}

/// Definition of a row or column axis
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MapAxis {
    /// Axis name, e.g. "RPM"
    pub name: String,

    /// Number of columns (X) or rows (Y); 0 is invalid input
    pub dimension: usize,

    /// Format tag for axis header values read from the image
    #[serde(default)]
    pub value_format: String,

    /// Raw -> physical conversion formula for header values
    #[serde(default = "identity_formula")]
    pub forward_formula: String,

    /// Physical -> raw conversion formula for header values
    #[serde(default = "identity_formula")]
    pub inverse_formula: String,

    /// Where the header values live in the image, if they are not fixed
    #[serde(default)]
    pub source_address: Option<u64>,

    /// Fixed header values for axes not read from the image
    #[serde(default)]
    pub fixed_values: Vec<f64>,
}

/// Definition of one checksum block
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChecksumDefinition {
    /// Display name
    #[serde(default = "default_checksum_title")]
    pub title: String,

    /// Byte offset where the computed checksum is written
    pub storage_address: u64,

    /// Algorithm tag, e.g. "SUM8", "SUM16", "CRC32"
    pub algorithm: String,

    /// First byte of the summed range
    pub start_address: u64,

    /// Last byte of the summed range (inclusive)
    pub end_address: u64,
}

/// The full content of a parsed definition file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DefinitionSet {
    /// Table definitions, in file order
    #[serde(default)]
    pub maps: Vec<MapDefinition>,

    /// Checksum block definitions, in file order
    #[serde(default)]
    pub checksums: Vec<ChecksumDefinition>,
}
