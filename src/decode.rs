//! The tagged byte decoder (`spec.md` §4.1).
//!
//! `read_object_size` is the single entry point: given a reader and a
//! position, it reads one header byte, dispatches on its high bits, and
//! returns the decoded [`Value`] plus the total number of bytes consumed
//! (header, length bytes and payload, including any bytes consumed by
//! nested elements). `read_object` is the same but discards the count.

use bigdecimal::BigDecimal;
use byteorder::{BigEndian, ReadBytesExt};
use num_bigint::BigInt;
use std::str::FromStr;
use uuid::Uuid;

use crate::depth_tracking::DepthTracker;
use crate::error::{Error, Result};
use crate::header::{classify, Header, TypeCode};
use crate::reader::PagedReader;
use crate::timestamp::{Date, Instant};
use crate::user_type::UserTypeRegistry;
use crate::value::Value;

/// Decode the value at `pos`, discarding the consumed byte count.
pub fn read_object<R: PagedReader>(
    reader: &R,
    pos: u64,
    registry: &UserTypeRegistry,
) -> Result<Value> {
    Ok(read_object_size(reader, pos, registry)?.0)
}

/// Decode the value at `pos`, returning it along with the number of bytes
/// consumed from `pos`.
pub fn read_object_size<R: PagedReader>(
    reader: &R,
    pos: u64,
    registry: &UserTypeRegistry,
) -> Result<(Value, usize)> {
    let mut depth = DepthTracker::new();
    read_object_size_inner(reader, pos, registry, &mut depth)
}

fn read_object_size_inner<R: PagedReader>(
    reader: &R,
    pos: u64,
    registry: &UserTypeRegistry,
    depth: &mut DepthTracker,
) -> Result<(Value, usize)> {
    let b0 = reader.read_byte(pos)?;
    match classify(b0) {
        Header::ShortStr(len) => {
            let s = read_utf8(reader, pos + 1, len as usize)?;
            Ok((Value::Str(s), len as usize + 1))
        }
        Header::ShortUri(len) => {
            let s = read_utf8(reader, pos + 1, len as usize)?;
            Ok((Value::Uri(s), len as usize + 1))
        }
        Header::ShortKeyword(len) => {
            let s = read_utf8(reader, pos + 1, len as usize)?;
            Ok((Value::Keyword(s), len as usize + 1))
        }
        Header::ShortLong(width) => {
            let bytes = reader.read_bytes(pos + 1, width as usize)?;
            Ok((Value::Long(be_signed(&bytes)), width as usize + 1))
        }
        Header::Full { type_code, ext } => {
            let (value, payload_len) =
                decode_typed(type_code, ext, reader, pos + 1, registry, depth)?;
            Ok((value, payload_len + 1))
        }
        Header::UserDefined { ext } => {
            let (value, payload_len) = decode_user_defined(ext, reader, pos + 1, registry)?;
            Ok((value, payload_len + 1))
        }
    }
}

fn read_utf8<R: PagedReader>(reader: &R, pos: u64, len: usize) -> Result<String> {
    let bytes = reader.read_bytes(pos, len)?;
    String::from_utf8(bytes).map_err(|e| Error::BadEncode(e.to_string()))
}

/// Interpret `bytes` as a big-endian two's-complement signed integer, widened
/// to `i64`. `bytes.len()` must be in `1..=8`.
pub(crate) fn be_signed(bytes: &[u8]) -> i64 {
    let mut acc: i64 = if bytes[0] & 0x80 != 0 { -1 } else { 0 };
    for &b in bytes {
        acc = (acc << 8) | b as i64;
    }
    acc
}

/// Read a length field per `spec.md` §3: one byte if `ext`, otherwise a
/// 2-byte big-endian length with a top-bit continuation into a second
/// 2-byte field for 31 usable bits. Returns `(length, bytes_consumed)`.
fn read_length<R: PagedReader>(reader: &R, pos: u64, ext: bool) -> Result<(usize, usize)> {
    if ext {
        let len = reader.read_byte(pos)?;
        Ok((len as usize, 1))
    } else {
        let short = reader.read_short(pos)? as u16;
        if short & 0x8000 == 0 {
            Ok((short as usize, 2))
        } else {
            let low = reader.read_short(pos + 2)? as u16;
            let top15 = (short & 0x7FFF) as u32;
            let low16 = low as u32;
            Ok((((top15 << 16) | low16) as usize, 4))
        }
    }
}

fn decode_typed<R: PagedReader>(
    type_code: TypeCode,
    ext: bool,
    reader: &R,
    pos: u64,
    registry: &UserTypeRegistry,
    depth: &mut DepthTracker,
) -> Result<(Value, usize)> {
    match type_code {
        TypeCode::Long => {
            let bytes = reader.read_bytes(pos, 8)?;
            let v = (&bytes[..]).read_i64::<BigEndian>().expect("exactly 8 bytes");
            Ok((Value::Long(v), 8))
        }
        TypeCode::Double => {
            let bytes = reader.read_bytes(pos, 8)?;
            let v = (&bytes[..]).read_f64::<BigEndian>().expect("exactly 8 bytes");
            Ok((Value::Double(v), 8))
        }
        TypeCode::Str => {
            let (len, lenb) = read_length(reader, pos, ext)?;
            let s = read_utf8(reader, pos + lenb as u64, len)?;
            Ok((Value::Str(s), lenb + len))
        }
        TypeCode::Uri => {
            let (len, lenb) = read_length(reader, pos, ext)?;
            let s = read_utf8(reader, pos + lenb as u64, len)?;
            Ok((Value::Uri(s), lenb + len))
        }
        TypeCode::Keyword => {
            let (len, lenb) = read_length(reader, pos, ext)?;
            let s = read_utf8(reader, pos + lenb as u64, len)?;
            Ok((Value::Keyword(s), lenb + len))
        }
        TypeCode::BigInt => {
            let (len, lenb) = read_length(reader, pos, ext)?;
            let bytes = reader.read_bytes(pos + lenb as u64, len)?;
            Ok((Value::BigInt(BigInt::from_signed_bytes_be(&bytes)), lenb + len))
        }
        TypeCode::BigDecimal => {
            let (len, lenb) = read_length(reader, pos, ext)?;
            let s = read_utf8(reader, pos + lenb as u64, len)?;
            let d = BigDecimal::from_str(&s).map_err(|e| Error::BadEncode(e.to_string()))?;
            Ok((Value::BigDecimal(d), lenb + len))
        }
        TypeCode::Date => {
            let bytes = reader.read_bytes(pos, 8)?;
            let millis = (&bytes[..]).read_i64::<BigEndian>().expect("exactly 8 bytes");
            Ok((Value::Date(Date::from_millis(millis)), 8))
        }
        TypeCode::Instant => {
            let bytes = reader.read_bytes(pos, 12)?;
            let mut cursor = &bytes[..];
            let secs = cursor.read_i64::<BigEndian>().expect("exactly 12 bytes");
            let nanos = cursor.read_u32::<BigEndian>().expect("exactly 12 bytes");
            Ok((Value::Instant(Instant::new(secs, nanos)), 12))
        }
        TypeCode::Uuid => {
            let bytes = reader.read_bytes(pos, 16)?;
            let mut cursor = &bytes[..];
            let low = cursor.read_u64::<BigEndian>().expect("exactly 16 bytes");
            let high = cursor.read_u64::<BigEndian>().expect("exactly 16 bytes");
            let value = ((high as u128) << 64) | low as u128;
            Ok((Value::Uuid(Uuid::from_u128(value)), 16))
        }
        TypeCode::Blob => {
            let (len, lenb) = read_length(reader, pos, ext)?;
            let bytes = reader.read_bytes(pos + lenb as u64, len)?;
            Ok((Value::Blob(bytes), lenb + len))
        }
        TypeCode::TypedLiteral => {
            let (len, lenb) = read_length(reader, pos, ext)?;
            let s = read_utf8(reader, pos + lenb as u64, len)?;
            let (datatype, lexical) = s.split_once(' ').ok_or_else(|| {
                Error::BadEncode("typed literal missing space separator".to_string())
            })?;
            Ok((
                Value::TypedLiteral {
                    datatype: datatype.to_string(),
                    lexical: lexical.to_string(),
                },
                lenb + len,
            ))
        }
        TypeCode::Sequence => {
            let (len, lenb) = read_length(reader, pos, ext)?;
            depth.enter()?;
            let result = decode_sequence_body(reader, pos + lenb as u64, len, registry, depth);
            depth.exit();
            Ok((Value::Sequence(result?), lenb + len))
        }
        TypeCode::Map => {
            let (len, lenb) = read_length(reader, pos, ext)?;
            depth.enter()?;
            let result = decode_sequence_body(reader, pos + lenb as u64, len, registry, depth);
            depth.exit();
            let elems = result?;
            if elems.len() % 2 != 0 {
                return Err(Error::BadEncode("map body has odd element count".to_string()));
            }
            let mut pairs = Vec::with_capacity(elems.len() / 2);
            let mut it = elems.into_iter();
            while let (Some(k), Some(v)) = (it.next(), it.next()) {
                pairs.push((k, v));
            }
            Ok((Value::Map(pairs), lenb + len))
        }
    }
}

/// Decode a sequence body of `body_len` bytes starting at `pos` (just past
/// the outer length prefix), per `spec.md` §4.1's three sub-formats.
fn decode_sequence_body<R: PagedReader>(
    reader: &R,
    pos: u64,
    body_len: usize,
    registry: &UserTypeRegistry,
    depth: &mut DepthTracker,
) -> Result<Vec<Value>> {
    if body_len == 0 {
        return Ok(Vec::new());
    }
    let seq0 = reader.read_byte(pos)?;
    let remaining = body_len - 1;
    let elem_pos = pos + 1;
    if seq0 == 0 {
        let mut out = Vec::new();
        let mut consumed = 0usize;
        while consumed < remaining {
            let (value, n) = read_object_size_inner(reader, elem_pos + consumed as u64, registry, depth)?;
            consumed += n;
            out.push(value);
        }
        Ok(out)
    } else if seq0 & 0xF0 == 0xD0 {
        let width = (seq0 & 0x0F) as usize;
        if width == 0 || remaining % width != 0 {
            return Err(Error::BadEncode("homogeneous long width doesn't divide body".to_string()));
        }
        let mut out = Vec::with_capacity(remaining / width);
        let mut offset = 0usize;
        while offset < remaining {
            let bytes = reader.read_bytes(elem_pos + offset as u64, width)?;
            out.push(Value::Long(be_signed(&bytes)));
            offset += width;
        }
        Ok(out)
    } else {
        let type_code = TypeCode::from_nibble(seq0 & 0x0F)
            .ok_or(Error::UnknownSequenceType { type_code: seq0 & 0x0F })?;
        let mut out = Vec::new();
        let mut consumed = 0usize;
        while consumed < remaining {
            let (value, n) = decode_typed(type_code, true, reader, elem_pos + consumed as u64, registry, depth)?;
            consumed += n;
            out.push(value);
        }
        Ok(out)
    }
}

fn decode_user_defined<R: PagedReader>(
    ext: bool,
    reader: &R,
    pos: u64,
    registry: &UserTypeRegistry,
) -> Result<(Value, usize)> {
    let (len, lenb) = read_length(reader, pos, ext)?;
    let s = read_utf8(reader, pos + lenb as u64, len)?;
    let (class_name, payload) = s
        .split_once(' ')
        .ok_or_else(|| Error::BadEncode("user-defined value missing space separator".to_string()))?;
    let value = registry.decode(class_name, payload)?;
    Ok((value, lenb + len))
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::header::{full_header, short_str_header};
    use crate::reader::SliceReader;

    fn registry() -> UserTypeRegistry {
        UserTypeRegistry::new()
    }

    #[test]
    fn literal_scenario_short_string_hi() {
        // spec.md §8 scenario 1.
        let buf = [short_str_header(2), b'h', b'i'];
        let reader = SliceReader::new(&buf);
        let (v, n) = read_object_size(&reader, 0, &registry()).unwrap();
        assert_eq!(v, Value::Str("hi".to_string()));
        assert_eq!(n, 3);
    }

    #[test]
    fn decode_long_full_form() {
        let mut buf = vec![full_header(TypeCode::Long, true)];
        buf.extend_from_slice(&42i64.to_be_bytes());
        let reader = SliceReader::new(&buf);
        let v = read_object(&reader, 0, &registry()).unwrap();
        assert_eq!(v, Value::Long(42));
    }

    #[test]
    fn decode_double() {
        let mut buf = vec![full_header(TypeCode::Double, true)];
        buf.extend_from_slice(&1.5f64.to_be_bytes());
        let reader = SliceReader::new(&buf);
        let v = read_object(&reader, 0, &registry()).unwrap();
        assert_eq!(v, Value::Double(1.5));
    }

    #[test]
    fn decode_uuid_low_then_high() {
        let low = 0x0102030405060708u64;
        let high = 0x1112131415161718u64;
        let mut buf = vec![full_header(TypeCode::Uuid, true)];
        buf.extend_from_slice(&low.to_be_bytes());
        buf.extend_from_slice(&high.to_be_bytes());
        let reader = SliceReader::new(&buf);
        let v = read_object(&reader, 0, &registry()).unwrap();
        let expect = ((high as u128) << 64) | low as u128;
        assert_eq!(v, Value::Uuid(Uuid::from_u128(expect)));
    }

    #[test]
    fn decode_typed_literal_splits_on_first_space() {
        let body = "http://example.org/type literal value with spaces";
        let mut buf = vec![full_header(TypeCode::TypedLiteral, true), body.len() as u8];
        buf.extend_from_slice(body.as_bytes());
        let reader = SliceReader::new(&buf);
        let v = read_object(&reader, 0, &registry()).unwrap();
        match v {
            Value::TypedLiteral { datatype, lexical } => {
                assert_eq!(datatype, "http://example.org/type");
                assert_eq!(lexical, "literal value with spaces");
            }
            _ => panic!("expected TypedLiteral"),
        }
    }

    #[test]
    fn decode_empty_sequence() {
        let buf = [full_header(TypeCode::Sequence, true), 0];
        let reader = SliceReader::new(&buf);
        let v = read_object(&reader, 0, &registry()).unwrap();
        assert_eq!(v, Value::Sequence(vec![]));
    }

    #[test]
    fn decode_heterogeneous_sequence_one_element() {
        let mut buf = vec![full_header(TypeCode::Sequence, true)];
        let mut body = vec![0u8]; // seq0 = heterogeneous
        body.push(short_str_header(2));
        body.push(b'h');
        body.push(b'i');
        buf.push(body.len() as u8);
        buf.extend_from_slice(&body);
        let reader = SliceReader::new(&buf);
        let v = read_object(&reader, 0, &registry()).unwrap();
        assert_eq!(v, Value::Sequence(vec![Value::Str("hi".to_string())]));
    }

    #[test]
    fn literal_scenario_homogeneous_long_sequence() {
        // spec.md §8 scenario 6: [1, 2, 3] with width-1 homogeneous long marker.
        let mut body = vec![0xD1u8, 1, 2, 3];
        let mut buf = vec![full_header(TypeCode::Sequence, true)];
        buf.push(body.len() as u8);
        buf.append(&mut body);
        let reader = SliceReader::new(&buf);
        let v = read_object(&reader, 0, &registry()).unwrap();
        assert_eq!(
            v,
            Value::Sequence(vec![Value::Long(1), Value::Long(2), Value::Long(3)])
        );
    }

    #[test]
    fn decode_homogeneous_tagged_sequence_of_strings() {
        let mut body = vec![TypeCode::Str.into_nibble()];
        body.push(1);
        body.push(b'a');
        body.push(1);
        body.push(b'b');
        let mut buf = vec![full_header(TypeCode::Sequence, true)];
        buf.push(body.len() as u8);
        buf.extend_from_slice(&body);
        let reader = SliceReader::new(&buf);
        let v = read_object(&reader, 0, &registry()).unwrap();
        assert_eq!(
            v,
            Value::Sequence(vec![Value::Str("a".to_string()), Value::Str("b".to_string())])
        );
    }

    #[test]
    fn decode_map_preserves_pair_order() {
        let mut body = vec![0u8];
        body.push(short_str_header(1));
        body.push(b'a');
        body.push(short_str_header(1));
        body.push(b'1');
        body.push(short_str_header(1));
        body.push(b'a');
        body.push(short_str_header(1));
        body.push(b'2');
        let mut buf = vec![full_header(TypeCode::Map, true)];
        buf.push(body.len() as u8);
        buf.extend_from_slice(&body);
        let reader = SliceReader::new(&buf);
        let v = read_object(&reader, 0, &registry()).unwrap();
        assert_eq!(
            v,
            Value::Map(vec![
                (Value::Str("a".to_string()), Value::Str("1".to_string())),
                (Value::Str("a".to_string()), Value::Str("2".to_string())),
            ])
        );
    }

    #[test]
    fn unknown_sequence_type_errors() {
        let body = vec![0xEFu8]; // low nibble 15, unassigned type code
        let mut buf = vec![full_header(TypeCode::Sequence, true)];
        buf.push(body.len() as u8);
        buf.extend_from_slice(&body);
        let reader = SliceReader::new(&buf);
        let err = read_object(&reader, 0, &registry()).unwrap_err();
        assert!(matches!(err, Error::UnknownSequenceType { type_code: 15 }));
    }

    #[test]
    fn user_defined_fallback_roundtrips_through_registry() {
        let mut registry = UserTypeRegistry::new();
        registry.register("com.example.Widget", crate::user_type::passthrough_decoder);
        let body = "com.example.Widget hello";
        let mut buf = vec![0xEEu8]; // ext=true, low nibble 14 (unassigned)
        buf.push(body.len() as u8);
        buf.extend_from_slice(body.as_bytes());
        let reader = SliceReader::new(&buf);
        let v = read_object(&reader, 0, &registry).unwrap();
        assert_eq!(
            v,
            Value::UserDefined {
                class_name: "com.example.Widget".to_string(),
                payload: "hello".to_string(),
            }
        );
    }

    #[test]
    fn not_enough_bytes_errors() {
        let buf = [full_header(TypeCode::Long, true), 0, 0];
        let reader = SliceReader::new(&buf);
        assert!(read_object(&reader, 0, &registry()).is_err());
    }

    #[test]
    fn depth_limit_exceeded_errors() {
        // Build a sequence of sequences nested past MAX_DEPTH.
        let mut buf = vec![short_str_header(0)];
        for _ in 0..(crate::depth_tracking::MAX_DEPTH + 2) {
            let mut next = vec![full_header(TypeCode::Sequence, true)];
            next.push((buf.len() + 1) as u8);
            next.push(0); // heterogeneous marker
            next.extend_from_slice(&buf);
            buf = next;
        }
        let reader = SliceReader::new(&buf);
        let err = read_object(&reader, 0, &registry()).unwrap_err();
        assert!(matches!(err, Error::ParseLimit(_)));
    }
}
