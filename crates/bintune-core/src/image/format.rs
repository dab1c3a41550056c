//! Format catalog
//!
//! Maps XDF format tags to byte width, signedness, and byte order.
//! Pure lookup, no state.

use serde::{Deserialize, Serialize};

/// Byte order of multi-byte values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Endianness {
    /// Most significant byte first
    #[default]
    Big,
    /// Least significant byte first
    Little,
}

/// Scalar storage format of a table cell or axis header value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValueFormat {
    /// Unsigned 8-bit integer ("8bit")
    U08,
    /// Signed 8-bit integer ("signed_8bit")
    S08,
    /// Unsigned 16-bit big-endian ("16bit_hi_lo")
    U16Be,
    /// Unsigned 16-bit little-endian ("16bit_lo_hi")
    U16Le,
    /// Signed 16-bit big-endian ("signed_16bit_hi_lo")
    S16Be,
    /// Unsigned 32-bit big-endian ("32bit_hi_lo_hi_lo")
    U32Be,
    /// Unsigned 32-bit little-endian ("32bit_lo_hi_lo_hi")
    U32Le,
}

impl ValueFormat {
    /// Parse a format tag (case-insensitive)
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag.trim().to_lowercase().as_str() {
            "8bit" => Some(ValueFormat::U08),
            "signed_8bit" => Some(ValueFormat::S08),
            "16bit_hi_lo" => Some(ValueFormat::U16Be),
            "16bit_lo_hi" => Some(ValueFormat::U16Le),
            "signed_16bit_hi_lo" => Some(ValueFormat::S16Be),
            "32bit_hi_lo_hi_lo" => Some(ValueFormat::U32Be),
            "32bit_lo_hi_lo_hi" => Some(ValueFormat::U32Le),
            _ => None,
        }
    }

    /// Canonical tag string for this format
    pub fn tag(&self) -> &'static str {
        match self {
            ValueFormat::U08 => "8bit",
            ValueFormat::S08 => "signed_8bit",
            ValueFormat::U16Be => "16bit_hi_lo",
            ValueFormat::U16Le => "16bit_lo_hi",
            ValueFormat::S16Be => "signed_16bit_hi_lo",
            ValueFormat::U32Be => "32bit_hi_lo_hi_lo",
            ValueFormat::U32Le => "32bit_lo_hi_lo_hi",
        }
    }

    /// Size in bytes, which is exactly the byte count touched by both
    /// decode and encode
    pub fn size_bytes(&self) -> usize {
        match self {
            ValueFormat::U08 | ValueFormat::S08 => 1,
            ValueFormat::U16Be | ValueFormat::U16Le | ValueFormat::S16Be => 2,
            ValueFormat::U32Be | ValueFormat::U32Le => 4,
        }
    }

    /// Whether the raw value is two's-complement signed
    pub fn is_signed(&self) -> bool {
        matches!(self, ValueFormat::S08 | ValueFormat::S16Be)
    }

    /// Byte order of the stored value
    pub fn endianness(&self) -> Endianness {
        match self {
            ValueFormat::U16Le | ValueFormat::U32Le => Endianness::Little,
            _ => Endianness::Big,
        }
    }

    /// Smallest representable raw value
    pub fn raw_min(&self) -> f64 {
        match self {
            ValueFormat::S08 => i8::MIN as f64,
            ValueFormat::S16Be => i16::MIN as f64,
            _ => 0.0,
        }
    }

    /// Largest representable raw value
    pub fn raw_max(&self) -> f64 {
        match self {
            ValueFormat::U08 => u8::MAX as f64,
            ValueFormat::S08 => i8::MAX as f64,
            ValueFormat::U16Be | ValueFormat::U16Le => u16::MAX as f64,
            ValueFormat::S16Be => i16::MAX as f64,
            ValueFormat::U32Be | ValueFormat::U32Le => u32::MAX as f64,
        }
    }
}

/// Byte width of a format tag for address stepping.
///
/// Unknown tags default to 1 byte with a diagnostic; this leniency is for
/// the read path only. Write paths resolve tags strictly.
pub fn width_of_tag(tag: &str) -> usize {
    match ValueFormat::from_tag(tag) {
        Some(format) => format.size_bytes(),
        None => {
            tracing::warn!(tag, "unknown format tag, assuming 1 byte");
            1
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_tags_case_insensitively() {
        assert_eq!(ValueFormat::from_tag("8bit"), Some(ValueFormat::U08));
        assert_eq!(
            ValueFormat::from_tag("16BIT_HI_LO"),
            Some(ValueFormat::U16Be)
        );
        assert_eq!(
            ValueFormat::from_tag(" Signed_16bit_Hi_Lo "),
            Some(ValueFormat::S16Be)
        );
        assert_eq!(ValueFormat::from_tag("float_ieee_be"), None);
    }

    #[test]
    fn widths_match_tag_families() {
        assert_eq!(ValueFormat::U08.size_bytes(), 1);
        assert_eq!(ValueFormat::S08.size_bytes(), 1);
        assert_eq!(ValueFormat::U16Le.size_bytes(), 2);
        assert_eq!(ValueFormat::S16Be.size_bytes(), 2);
        assert_eq!(ValueFormat::U32Be.size_bytes(), 4);
        assert_eq!(ValueFormat::U32Le.size_bytes(), 4);
    }

    #[test]
    fn raw_ranges_follow_signedness() {
        assert_eq!(ValueFormat::U08.raw_min(), 0.0);
        assert_eq!(ValueFormat::U08.raw_max(), 255.0);
        assert_eq!(ValueFormat::S08.raw_min(), -128.0);
        assert_eq!(ValueFormat::S08.raw_max(), 127.0);
        assert_eq!(ValueFormat::S16Be.raw_min(), -32768.0);
        assert_eq!(ValueFormat::S16Be.raw_max(), 32767.0);
        assert_eq!(ValueFormat::U32Le.raw_max(), 4294967295.0);
    }

    #[test]
    fn unknown_tag_width_defaults_to_one() {
        assert_eq!(width_of_tag("8bit"), 1);
        assert_eq!(width_of_tag("32bit_hi_lo_hi_lo"), 4);
        assert_eq!(width_of_tag("not_a_format"), 1);
    }

    #[test]
    fn endianness_from_tag_suffix() {
        assert_eq!(ValueFormat::U16Be.endianness(), Endianness::Big);
        assert_eq!(ValueFormat::U16Le.endianness(), Endianness::Little);
        assert_eq!(ValueFormat::U32Le.endianness(), Endianness::Little);
        assert_eq!(ValueFormat::S16Be.endianness(), Endianness::Big);
    }
}
