//! Scalar value codec
//!
//! Reads and writes single raw values at byte offsets in the image buffer.
//! Decodes are lenient about unknown format tags (1-byte fallback); encodes
//! are strict, since guessing a width on a write could corrupt the cells
//! next to the target.

use byteorder::{BigEndian, ByteOrder, LittleEndian};

use super::error::ImageError;
use super::format::ValueFormat;

/// Resolve the target byte range, or report it as outside the buffer.
fn check_range(
    buffer: &[u8],
    address: u64,
    width: usize,
    writing: bool,
) -> Result<usize, ImageError> {
    let start = usize::try_from(address).ok();
    let end = start.and_then(|s| s.checked_add(width));

    match (start, end) {
        (Some(start), Some(end)) if end <= buffer.len() => Ok(start),
        _ if writing => Err(ImageError::EncodeOutOfRange {
            address,
            width,
            length: buffer.len(),
        }),
        _ => Err(ImageError::DecodeOutOfRange {
            address,
            width,
            length: buffer.len(),
        }),
    }
}

/// Read one raw value at `address` per the format.
///
/// The result is the literal stored integer, reinterpreted per the format's
/// signedness, before any conversion formula is applied.
pub fn decode(buffer: &[u8], address: u64, format: ValueFormat) -> Result<f64, ImageError> {
    let start = check_range(buffer, address, format.size_bytes(), false)?;
    let bytes = &buffer[start..];

    let value = match format {
        ValueFormat::U08 => bytes[0] as f64,
        ValueFormat::S08 => bytes[0] as i8 as f64,
        ValueFormat::U16Be => BigEndian::read_u16(bytes) as f64,
        ValueFormat::U16Le => LittleEndian::read_u16(bytes) as f64,
        ValueFormat::S16Be => BigEndian::read_i16(bytes) as f64,
        ValueFormat::U32Be => BigEndian::read_u32(bytes) as f64,
        ValueFormat::U32Le => LittleEndian::read_u32(bytes) as f64,
    };

    Ok(value)
}

/// Read one raw value by format tag.
///
/// Unknown tags degrade to a 1-byte unsigned read with a diagnostic so a
/// definition with one exotic format still loads.
pub fn decode_tag(buffer: &[u8], address: u64, tag: &str) -> Result<f64, ImageError> {
    match ValueFormat::from_tag(tag) {
        Some(format) => decode(buffer, address, format),
        None => {
            tracing::warn!(tag, address, "unknown format tag, reading as 8bit");
            decode(buffer, address, ValueFormat::U08)
        }
    }
}

/// Write one raw value at `address` per the format.
///
/// `raw` is rounded to the nearest integer and clamped to the format's
/// representable range before the bytes are split out. An out-of-range
/// target propagates as an error with the buffer untouched.
pub fn encode(
    buffer: &mut [u8],
    address: u64,
    format: ValueFormat,
    raw: f64,
) -> Result<(), ImageError> {
    if !raw.is_finite() {
        return Err(ImageError::NotFinite(raw));
    }

    let start = check_range(buffer, address, format.size_bytes(), true)?;
    let clamped = raw.round().clamp(format.raw_min(), format.raw_max());
    let bytes = &mut buffer[start..];

    match format {
        ValueFormat::U08 => bytes[0] = clamped as u8,
        ValueFormat::S08 => bytes[0] = clamped as i8 as u8,
        ValueFormat::U16Be => BigEndian::write_u16(bytes, clamped as u16),
        ValueFormat::U16Le => LittleEndian::write_u16(bytes, clamped as u16),
        ValueFormat::S16Be => BigEndian::write_i16(bytes, clamped as i16),
        ValueFormat::U32Be => BigEndian::write_u32(bytes, clamped as u32),
        ValueFormat::U32Le => LittleEndian::write_u32(bytes, clamped as u32),
    }

    Ok(())
}

/// Write one raw value by format tag.
///
/// Unlike [`decode_tag`], an unknown tag here is a hard error.
pub fn encode_tag(buffer: &mut [u8], address: u64, tag: &str, raw: f64) -> Result<(), ImageError> {
    let format =
        ValueFormat::from_tag(tag).ok_or_else(|| ImageError::UnsupportedFormat(tag.to_string()))?;
    encode(buffer, address, format, raw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn decodes_each_format() {
        let buffer = [0x01, 0x80, 0x00, 0x7B, 0x7B, 0x00, 0xFF, 0xFE];

        assert_eq!(decode(&buffer, 0, ValueFormat::U08).unwrap(), 1.0);
        assert_eq!(decode(&buffer, 1, ValueFormat::U08).unwrap(), 128.0);
        assert_eq!(decode(&buffer, 1, ValueFormat::S08).unwrap(), -128.0);
        assert_eq!(decode(&buffer, 2, ValueFormat::U16Be).unwrap(), 123.0);
        assert_eq!(decode(&buffer, 3, ValueFormat::U16Le).unwrap(), 31611.0);
        assert_eq!(decode(&buffer, 6, ValueFormat::S16Be).unwrap(), -2.0);
        assert_eq!(
            decode(&buffer, 3, ValueFormat::U32Be).unwrap(),
            0x7B7B_00FF_u32 as f64
        );
        assert_eq!(
            decode(&buffer, 3, ValueFormat::U32Le).unwrap(),
            0xFF00_7B7B_u32 as f64
        );
    }

    #[test]
    fn decode_past_end_is_an_error() {
        let buffer = [0u8; 4];
        assert!(decode(&buffer, 3, ValueFormat::U16Be).is_err());
        assert!(decode(&buffer, 4, ValueFormat::U08).is_err());
        assert!(decode(&buffer, u64::MAX, ValueFormat::U08).is_err());
        assert!(decode(&buffer, 0, ValueFormat::U32Be).is_ok());
    }

    #[test]
    fn encode_rounds_and_clamps() {
        let mut buffer = [0u8; 4];

        encode(&mut buffer, 0, ValueFormat::U08, 12.6).unwrap();
        assert_eq!(buffer[0], 13);

        encode(&mut buffer, 0, ValueFormat::U08, 300.0).unwrap();
        assert_eq!(buffer[0], 255);

        encode(&mut buffer, 0, ValueFormat::U08, -5.0).unwrap();
        assert_eq!(buffer[0], 0);

        encode(&mut buffer, 0, ValueFormat::S08, 200.0).unwrap();
        assert_eq!(buffer[0] as i8, 127);

        encode(&mut buffer, 0, ValueFormat::S08, -200.0).unwrap();
        assert_eq!(buffer[0] as i8, -128);
    }

    #[test]
    fn encode_splits_bytes_per_endianness() {
        let mut buffer = [0u8; 8];

        encode(&mut buffer, 0, ValueFormat::U16Be, 123.0).unwrap();
        assert_eq!(&buffer[0..2], &[0x00, 0x7B]);

        encode(&mut buffer, 2, ValueFormat::U16Le, 123.0).unwrap();
        assert_eq!(&buffer[2..4], &[0x7B, 0x00]);

        encode(&mut buffer, 4, ValueFormat::U32Be, 0x0102_0304 as f64).unwrap();
        assert_eq!(&buffer[4..8], &[0x01, 0x02, 0x03, 0x04]);

        encode(&mut buffer, 4, ValueFormat::U32Le, 0x0102_0304 as f64).unwrap();
        assert_eq!(&buffer[4..8], &[0x04, 0x03, 0x02, 0x01]);
    }

    #[test]
    fn encode_touches_only_its_own_bytes() {
        let mut buffer = [0xAAu8; 6];
        encode(&mut buffer, 2, ValueFormat::U16Be, 0.0).unwrap();
        assert_eq!(buffer, [0xAA, 0xAA, 0x00, 0x00, 0xAA, 0xAA]);
    }

    #[test]
    fn encode_past_end_leaves_buffer_untouched() {
        let mut buffer = [0x55u8; 4];
        let before = buffer;

        assert!(encode(&mut buffer, 3, ValueFormat::U16Be, 1.0).is_err());
        assert!(encode(&mut buffer, 10, ValueFormat::U08, 1.0).is_err());
        assert_eq!(buffer, before);
    }

    #[test]
    fn encode_rejects_non_finite_raw() {
        let mut buffer = [0u8; 2];
        assert!(matches!(
            encode(&mut buffer, 0, ValueFormat::U08, f64::NAN),
            Err(ImageError::NotFinite(_))
        ));
        assert!(matches!(
            encode(&mut buffer, 0, ValueFormat::U08, f64::INFINITY),
            Err(ImageError::NotFinite(_))
        ));
    }

    #[test]
    fn roundtrip_is_idempotent_once_clamped() {
        let mut buffer = [0u8; 4];
        for format in [
            ValueFormat::U08,
            ValueFormat::S08,
            ValueFormat::U16Be,
            ValueFormat::U16Le,
            ValueFormat::S16Be,
            ValueFormat::U32Be,
            ValueFormat::U32Le,
        ] {
            for raw in [-300.5, -1.0, 0.0, 1.4, 127.0, 254.6, 70000.2] {
                encode(&mut buffer, 0, format, raw).unwrap();
                let stored = decode(&buffer, 0, format).unwrap();
                let expected = raw.round().clamp(format.raw_min(), format.raw_max());
                assert_eq!(stored, expected, "format {:?} raw {}", format, raw);
            }
        }
    }

    #[test]
    fn unknown_tag_reads_one_byte_but_refuses_to_write() {
        let mut buffer = [0x42u8, 0x43];

        assert_eq!(decode_tag(&buffer, 0, "float_ieee_be").unwrap(), 0x42 as f64);
        assert!(matches!(
            encode_tag(&mut buffer, 0, "float_ieee_be", 1.0),
            Err(ImageError::UnsupportedFormat(_))
        ));
        assert_eq!(buffer, [0x42, 0x43]);
    }
}
