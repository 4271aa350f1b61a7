//! Header byte classification shared by the encoder, decoder and comparator.
//!
//! Every stored value begins with a single header byte. Its high bits pick a
//! length-encoding scheme (short inline, 1-byte, 2-/4-byte) and, for the
//! "full form", a 4-bit type code. This module only classifies bytes; it
//! never touches a reader.

/// The 14 reserved type codes from the data model (`spec.md` §3). Codes 14
/// and 15 are reserved for future use in the full form and have no variant
/// here; a full-form header carrying one falls through to [`TypeCode::from_nibble`]
/// returning `None`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum TypeCode {
    Long = 0,
    Double = 1,
    Str = 2,
    Uri = 3,
    Sequence = 4,
    Map = 5,
    BigInt = 6,
    BigDecimal = 7,
    Date = 8,
    Instant = 9,
    Keyword = 10,
    Uuid = 11,
    Blob = 12,
    TypedLiteral = 13,
}

impl TypeCode {
    pub fn from_nibble(n: u8) -> Option<TypeCode> {
        use TypeCode::*;
        Some(match n {
            0 => Long,
            1 => Double,
            2 => Str,
            3 => Uri,
            4 => Sequence,
            5 => Map,
            6 => BigInt,
            7 => BigDecimal,
            8 => Date,
            9 => Instant,
            10 => Keyword,
            11 => Uuid,
            12 => Blob,
            13 => TypedLiteral,
            _ => return None,
        })
    }

    pub fn into_nibble(self) -> u8 {
        self as u8
    }

    /// True for types whose payload is framed by a length field (everything
    /// except `Long`, `Double`, `Date`, `Instant` and `Uuid`, which are
    /// fixed-width).
    pub fn is_variable_length(self) -> bool {
        !matches!(
            self,
            TypeCode::Long | TypeCode::Double | TypeCode::Date | TypeCode::Instant | TypeCode::Uuid
        )
    }

    /// Fixed payload width in bytes, or `None` for variable-length types.
    pub fn fixed_width(self) -> Option<usize> {
        match self {
            TypeCode::Long => Some(8),
            TypeCode::Double => Some(8),
            TypeCode::Date => Some(8),
            TypeCode::Instant => Some(12),
            TypeCode::Uuid => Some(16),
            _ => None,
        }
    }
}

/// High-level shape of a header byte, named per `spec.md` §4.1's dispatch
/// algorithm. Doesn't read payload bytes; just classifies the header.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Header {
    /// `0xxxxxxx` - short string, length in the low 7 bits (0-127).
    ShortStr(u8),
    /// `10xxxxxx` - short URI, length in the low 6 bits (0-63).
    ShortUri(u8),
    /// `1100xxxx` - short keyword, length in the low 4 bits (0-15). (`spec.md`
    /// §3 describes this range as 5 bits/0-31, but its own dispatch algorithm
    /// (§4.1 step 5) masks with `0x0F` - 4 bits - to leave the `1101xxxx`
    /// sub-range free for the long form below. This implementation follows
    /// the dispatch algorithm, the operationally precise of the two.)
    ShortKeyword(u8),
    /// `1101xxxx` - a short/compact signed long, or (when this byte is the
    /// first byte of a sequence body) the homogeneous-long marker for that
    /// body; the low nibble is a byte width (realistically 1-8, since a
    /// `long` is at most 8 bytes). Same bit layout, two call sites.
    ShortLong(u8),
    /// `111Exxxx` - full form: known type code plus `ext` length flag.
    Full { type_code: TypeCode, ext: bool },
    /// `111Exxxx` with an unrecognized low nibble (14 or 15) - falls through
    /// to the user-defined decoder.
    UserDefined { ext: bool },
}

/// Classify a header byte per `spec.md` §4.1. Every byte maps to exactly one
/// variant - there is no "invalid header" case at this layer, since `110`
/// with a nibble naming a width is always a valid homogeneous-long marker or
/// short keyword, and `111` always resolves to `Full` or `UserDefined`.
pub fn classify(b0: u8) -> Header {
    if b0 & 0x80 == 0 {
        Header::ShortStr(b0)
    } else if b0 & 0x40 == 0 {
        Header::ShortUri(b0 & 0x3F)
    } else if b0 & 0xE0 == 0xE0 {
        let type_nibble = b0 & 0x0F;
        let ext = (b0 & 0x10) != 0;
        match TypeCode::from_nibble(type_nibble) {
            Some(type_code) => Header::Full { type_code, ext },
            None => Header::UserDefined { ext },
        }
    } else {
        let len = b0 & 0x0F;
        if b0 & 0x30 == 0 {
            Header::ShortKeyword(len)
        } else {
            Header::ShortLong(len)
        }
    }
}

/// The canonical type code used for comparator dispatch (`spec.md` §4.4).
/// Strings, URIs and keywords collapse string-shaped dispatch onto their own
/// type codes; everything else returns the low nibble of the header byte.
pub fn type_info(b0: u8) -> u8 {
    match classify(b0) {
        Header::ShortStr(_) => TypeCode::Str.into_nibble(),
        Header::ShortUri(_) => TypeCode::Uri.into_nibble(),
        Header::ShortKeyword(_) => TypeCode::Keyword.into_nibble(),
        Header::ShortLong(_) => TypeCode::Long.into_nibble(),
        Header::Full { type_code, .. } => type_code.into_nibble(),
        Header::UserDefined { .. } => b0 & 0x0F,
    }
}

/// Build the header byte for a short string (0-127 bytes).
pub fn short_str_header(len: u8) -> u8 {
    debug_assert!(len <= 0x7F);
    len
}

/// Build the header byte for a short URI (0-63 bytes).
pub fn short_uri_header(len: u8) -> u8 {
    debug_assert!(len <= 0x3F);
    0x80 | len
}

/// Build the header byte for a short keyword (0-15 bytes).
pub fn short_keyword_header(len: u8) -> u8 {
    debug_assert!(len <= 0x0F);
    0xC0 | len
}

/// Build a `1101xxxx` byte for a given per-element byte width (1-8),
/// whether used as a standalone short-long header or a sequence body's
/// homogeneous-long marker.
pub fn short_long_header(width: u8) -> u8 {
    debug_assert!((1..=8).contains(&width));
    0xD0 | width
}

/// Build the full-form header byte for a given type code and length flavor.
pub fn full_header(type_code: TypeCode, ext: bool) -> u8 {
    0xE0 | (if ext { 0x10 } else { 0x00 }) | type_code.into_nibble()
}

/// Conservative length probe used by index nodes that hold only a prefix of
/// the stored bytes (`spec.md` §4.1, "header-byte length probe"). Given just
/// the header byte (and, for the 2-byte length scheme, the next couple of
/// bytes if present), returns the declared payload length, or a lower bound
/// of 63 when the full declared length can't be determined from the bytes on
/// hand (e.g. only the header byte of a 2-/4-byte length form is present).
pub fn node_header_length(buf: &[u8]) -> usize {
    if buf.is_empty() {
        return 0;
    }
    let b0 = buf[0];
    match classify(b0) {
        Header::ShortStr(len) => len as usize,
        Header::ShortUri(len) => len as usize,
        Header::ShortKeyword(len) => len as usize,
        Header::ShortLong(width) => width as usize,
        Header::Full { type_code, ext } => {
            if let Some(width) = type_code.fixed_width() {
                return width;
            }
            if ext {
                if buf.len() >= 2 {
                    buf[1] as usize
                } else {
                    63
                }
            } else if buf.len() >= 3 {
                let hi = buf[1];
                if hi & 0x80 == 0 {
                    (u16::from_be_bytes([buf[1], buf[2]])) as usize
                } else if buf.len() >= 5 {
                    let top15 = (u16::from_be_bytes([hi & 0x7F, buf[2]])) as u32;
                    let low16 = u16::from_be_bytes([buf[3], buf[4]]) as u32;
                    ((top15 << 16) | low16) as usize
                } else {
                    63
                }
            } else {
                63
            }
        }
        Header::UserDefined { .. } => 63,
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn short_str_roundtrip() {
        for len in [0u8, 1, 63, 127] {
            let h = short_str_header(len);
            assert_eq!(classify(h), Header::ShortStr(len));
            assert_eq!(type_info(h), TypeCode::Str.into_nibble());
        }
    }

    #[test]
    fn short_uri_roundtrip() {
        for len in [0u8, 1, 63] {
            let h = short_uri_header(len);
            assert_eq!(classify(h), Header::ShortUri(len));
            assert_eq!(type_info(h), TypeCode::Uri.into_nibble());
        }
    }

    #[test]
    fn short_keyword_roundtrip() {
        for len in [0u8, 1, 15] {
            let h = short_keyword_header(len);
            assert_eq!(classify(h), Header::ShortKeyword(len));
            assert_eq!(type_info(h), TypeCode::Keyword.into_nibble());
        }
    }

    #[test]
    fn short_long_roundtrip() {
        for w in 1u8..=8 {
            let h = short_long_header(w);
            assert_eq!(classify(h), Header::ShortLong(w));
            assert_eq!(type_info(h), TypeCode::Long.into_nibble());
        }
    }

    #[test]
    fn full_form_roundtrip() {
        for &ext in &[true, false] {
            for code in 0u8..14 {
                let type_code = TypeCode::from_nibble(code).unwrap();
                let h = full_header(type_code, ext);
                assert_eq!(classify(h), Header::Full { type_code, ext });
            }
        }
    }

    #[test]
    fn user_defined_fallthrough() {
        for &ext in &[true, false] {
            for code in [14u8, 15] {
                let h = 0xE0 | (if ext { 0x10 } else { 0 }) | code;
                assert_eq!(classify(h), Header::UserDefined { ext });
            }
        }
    }

    #[test]
    fn every_byte_classifies() {
        for b in 0u8..=255 {
            let _ = classify(b);
        }
    }

    #[test]
    fn node_header_length_short_forms() {
        assert_eq!(node_header_length(&[short_str_header(5)]), 5);
        assert_eq!(node_header_length(&[short_uri_header(5)]), 5);
        assert_eq!(node_header_length(&[short_keyword_header(5)]), 5);
    }

    #[test]
    fn node_header_length_fixed_width() {
        let h = full_header(TypeCode::Long, true);
        assert_eq!(node_header_length(&[h]), 8);
        let h = full_header(TypeCode::Uuid, true);
        assert_eq!(node_header_length(&[h]), 16);
    }

    #[test]
    fn node_header_length_ext_present() {
        let h = full_header(TypeCode::Str, true);
        assert_eq!(node_header_length(&[h, 200]), 200);
    }

    #[test]
    fn node_header_length_ext_missing_is_lower_bound() {
        let h = full_header(TypeCode::Str, true);
        assert_eq!(node_header_length(&[h]), 63);
    }

    #[test]
    fn node_header_length_two_byte() {
        let h = full_header(TypeCode::Str, false);
        assert_eq!(node_header_length(&[h, 0x01, 0x00]), 256);
    }

    #[test]
    fn node_header_length_four_byte() {
        let h = full_header(TypeCode::Str, false);
        let buf = [h, 0x80, 0x00, 0x80, 0x00];
        assert_eq!(node_header_length(&buf), 0x8000);
    }
}
