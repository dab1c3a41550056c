//! Checksum engine
//!
//! Computes integrity checksums over defined byte ranges and writes the
//! result bytes at each block's storage address. Recomputing all blocks is
//! two-phase: every definition is validated against the image before any
//! byte is mutated, so a bad block never leaves a half-written save.
//!
//! Multi-byte results are stored most significant byte first. SUM16 is a
//! plain byte sum truncated to 16 bits; CRC32 is the IEEE polynomial.

use byteorder::{BigEndian, ByteOrder};
use thiserror::Error;

use crate::xdf::ChecksumDefinition;

/// Errors that can occur while computing or writing checksums
#[derive(Error, Debug)]
pub enum ChecksumError {
    /// Algorithm tag not in the catalog
    #[error("checksum algorithm '{0}' is not supported")]
    UnsupportedAlgorithm(String),

    /// Start address after end address
    #[error("checksum '{title}': start 0x{start:X} is after end 0x{end:X}")]
    InvalidRange {
        /// Block title
        title: String,
        /// Range start
        start: u64,
        /// Range end (inclusive)
        end: u64,
    },

    /// Summed range extends past the end of the image
    #[error("checksum '{title}': range 0x{start:X}..=0x{end:X} exceeds image length 0x{length:X}")]
    RangeOutOfRange {
        /// Block title
        title: String,
        /// Range start
        start: u64,
        /// Range end (inclusive)
        end: u64,
        /// Image length
        length: usize,
    },

    /// Storage location extends past the end of the image
    #[error("checksum '{title}': storage at 0x{address:X} (+{width} bytes) exceeds image length 0x{length:X}")]
    StorageOutOfRange {
        /// Block title
        title: String,
        /// Storage address
        address: u64,
        /// Result width in bytes
        width: usize,
        /// Image length
        length: usize,
    },
}

/// Checksum algorithms recognized by the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChecksumAlgorithm {
    /// Byte sum modulo 2^8, one result byte
    Sum8,
    /// Byte sum modulo 2^16, two result bytes (big-endian)
    Sum16,
    /// IEEE CRC-32, four result bytes (big-endian)
    Crc32,
}

impl ChecksumAlgorithm {
    /// Parse an algorithm tag (case-insensitive)
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag.trim().to_lowercase().as_str() {
            "sum8" => Some(ChecksumAlgorithm::Sum8),
            "sum16" => Some(ChecksumAlgorithm::Sum16),
            "crc32" => Some(ChecksumAlgorithm::Crc32),
            _ => None,
        }
    }

    /// Width of the stored result in bytes
    pub fn result_width(&self) -> usize {
        match self {
            ChecksumAlgorithm::Sum8 => 1,
            ChecksumAlgorithm::Sum16 => 2,
            ChecksumAlgorithm::Crc32 => 4,
        }
    }
}

/// Resolve the summed range and storage slot of a block, without mutating.
fn validate(
    buffer: &[u8],
    definition: &ChecksumDefinition,
) -> Result<(ChecksumAlgorithm, usize, usize, usize), ChecksumError> {
    let algorithm = ChecksumAlgorithm::from_tag(&definition.algorithm)
        .ok_or_else(|| ChecksumError::UnsupportedAlgorithm(definition.algorithm.clone()))?;

    if definition.start_address > definition.end_address {
        return Err(ChecksumError::InvalidRange {
            title: definition.title.clone(),
            start: definition.start_address,
            end: definition.end_address,
        });
    }

    let start = usize::try_from(definition.start_address).ok();
    let end = usize::try_from(definition.end_address).ok();
    let (start, end) = match (start, end) {
        (Some(s), Some(e)) if e < buffer.len() => (s, e),
        _ => {
            return Err(ChecksumError::RangeOutOfRange {
                title: definition.title.clone(),
                start: definition.start_address,
                end: definition.end_address,
                length: buffer.len(),
            })
        }
    };

    let width = algorithm.result_width();
    let storage = usize::try_from(definition.storage_address)
        .ok()
        .filter(|s| s.checked_add(width).is_some_and(|e| e <= buffer.len()))
        .ok_or_else(|| ChecksumError::StorageOutOfRange {
            title: definition.title.clone(),
            address: definition.storage_address,
            width,
            length: buffer.len(),
        })?;

    Ok((algorithm, start, end, storage))
}

/// Compute a block's checksum bytes without writing them.
pub fn compute(buffer: &[u8], definition: &ChecksumDefinition) -> Result<Vec<u8>, ChecksumError> {
    let (algorithm, start, end, _) = validate(buffer, definition)?;
    Ok(compute_bytes(algorithm, &buffer[start..=end]))
}

fn compute_bytes(algorithm: ChecksumAlgorithm, range: &[u8]) -> Vec<u8> {
    match algorithm {
        ChecksumAlgorithm::Sum8 => {
            let sum: u64 = range.iter().map(|&b| b as u64).sum();
            vec![(sum & 0xFF) as u8]
        }
        ChecksumAlgorithm::Sum16 => {
            let sum: u64 = range.iter().map(|&b| b as u64).sum();
            let mut bytes = [0u8; 2];
            BigEndian::write_u16(&mut bytes, (sum & 0xFFFF) as u16);
            bytes.to_vec()
        }
        ChecksumAlgorithm::Crc32 => {
            let mut bytes = [0u8; 4];
            BigEndian::write_u32(&mut bytes, crc32fast::hash(range));
            bytes.to_vec()
        }
    }
}

/// Recompute one block and write its result bytes at the storage address.
///
/// Returns the bytes written. Any validation failure aborts before the
/// buffer is touched.
pub fn recompute_and_write(
    buffer: &mut [u8],
    definition: &ChecksumDefinition,
) -> Result<Vec<u8>, ChecksumError> {
    let (algorithm, start, end, storage) = validate(buffer, definition)?;
    let bytes = compute_bytes(algorithm, &buffer[start..=end]);
    buffer[storage..storage + bytes.len()].copy_from_slice(&bytes);

    tracing::debug!(
        title = %definition.title,
        storage = definition.storage_address,
        width = bytes.len(),
        "checksum written"
    );

    Ok(bytes)
}

/// Recompute every block for a save.
///
/// All definitions are validated before the first write; if any block is
/// invalid the image is left byte-for-byte unchanged.
pub fn recompute_all(
    buffer: &mut [u8],
    definitions: &[ChecksumDefinition],
) -> Result<(), ChecksumError> {
    for definition in definitions {
        validate(buffer, definition)?;
    }

    for definition in definitions {
        recompute_and_write(buffer, definition)?;
    }

    Ok(())
}
