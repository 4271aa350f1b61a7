//! The tagged byte encoder, the inverse of [`crate::decode`].
//!
//! Chooses the narrowest header/length encoding that represents a value -
//! short forms for small strings/URIs/keywords/longs, full form otherwise -
//! so that `decode(encode(v)) == v` (invariant 1, `spec.md` §3) and so that
//! the encoder never emits a pattern the decoder would reject as
//! non-minimal.

use crate::error::{Error, Result};
use crate::header::{self, TypeCode};
use crate::value::Value;

/// Encode a single value to its tagged-byte representation.
pub fn encode_value(value: &Value) -> Result<Vec<u8>> {
    encode_object(value)
}

/// Encode a single value. Named to mirror [`crate::decode::read_object`].
pub fn encode_object(value: &Value) -> Result<Vec<u8>> {
    match value {
        Value::Bool(_) => Err(Error::BadEncode(
            "Bool has no tagged-byte encoding; encode it through inline::encapsulate".to_string(),
        )),
        Value::Str(s) if s.len() <= 0x7F => {
            Ok(prepend(header::short_str_header(s.len() as u8), s.as_bytes()))
        }
        Value::Uri(s) if s.len() <= 0x3F => {
            Ok(prepend(header::short_uri_header(s.len() as u8), s.as_bytes()))
        }
        Value::Keyword(s) if s.len() <= 0x0F => {
            Ok(prepend(header::short_keyword_header(s.len() as u8), s.as_bytes()))
        }
        Value::Long(v) => {
            let width = minimal_signed_width(*v);
            Ok(prepend(header::short_long_header(width), &signed_be_width(*v, width)))
        }
        Value::UserDefined { class_name, payload } => encode_user_defined(class_name, payload),
        _ => {
            let code = value
                .type_code()
                .ok_or_else(|| Error::BadEncode("value has no tagged-byte type code".to_string()))?;
            encode_full(value, code)
        }
    }
}

fn prepend(header_byte: u8, bytes: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(1 + bytes.len());
    out.push(header_byte);
    out.extend_from_slice(bytes);
    out
}

/// Smallest byte width in `1..=8` whose big-endian two's-complement range
/// contains `v`.
fn minimal_signed_width(v: i64) -> u8 {
    for w in 1u8..8 {
        let bits = (w as u32) * 8;
        let max = (1i64 << (bits - 1)) - 1;
        let min = -(1i64 << (bits - 1));
        if v >= min && v <= max {
            return w;
        }
    }
    8
}

/// `v` truncated to its low `width` bytes of big-endian two's-complement
/// representation. Caller must ensure `v` fits (see `minimal_signed_width`).
fn signed_be_width(v: i64, width: u8) -> Vec<u8> {
    v.to_be_bytes()[8 - width as usize..].to_vec()
}

fn encode_varlen_ext_true(bytes: &[u8]) -> Result<Vec<u8>> {
    if bytes.len() > 0xFF {
        return Err(Error::BadEncode(
            "value too long for a forced 1-byte length field".to_string(),
        ));
    }
    let mut out = Vec::with_capacity(1 + bytes.len());
    out.push(bytes.len() as u8);
    out.extend_from_slice(bytes);
    Ok(out)
}

/// Choose the narrowest length encoding for `len` bytes of payload: a single
/// byte (`ext = true`) up to 255, a plain 2-byte length up to 32767, or the
/// 31-bit continuation form beyond that.
fn choose_length_bytes(len: usize) -> Result<(bool, Vec<u8>)> {
    if len <= 0xFF {
        Ok((true, vec![len as u8]))
    } else if len <= 0x7FFF {
        Ok((false, (len as u16).to_be_bytes().to_vec()))
    } else if len <= 0x7FFF_FFFF {
        let top15 = ((len >> 16) as u16) & 0x7FFF;
        let low16 = (len & 0xFFFF) as u16;
        let mut bytes = (top15 | 0x8000).to_be_bytes().to_vec();
        bytes.extend_from_slice(&(low16).to_be_bytes());
        Ok((false, bytes))
    } else {
        Err(Error::BadEncode(format!("payload length {} exceeds 31-bit length field", len)))
    }
}

/// The raw payload bytes for `value` under `code`: the fixed-width bytes for
/// fixed-width codes, or the un-length-prefixed body for variable-length
/// ones. Shared by both the forced-`ext=true` (homogeneous tagged sequence
/// elements) and auto-length (top-level full-form) encoders.
fn payload_bytes(value: &Value, code: TypeCode) -> Result<Vec<u8>> {
    match value {
        Value::Long(v) => Ok(v.to_be_bytes().to_vec()),
        Value::Double(v) => Ok(v.to_bits().to_be_bytes().to_vec()),
        Value::Str(s) | Value::Uri(s) | Value::Keyword(s) => Ok(s.as_bytes().to_vec()),
        Value::BigInt(v) => Ok(v.to_signed_bytes_be()),
        Value::BigDecimal(v) => Ok(v.to_string().into_bytes()),
        Value::Date(d) => Ok(d.as_millis().to_be_bytes().to_vec()),
        Value::Instant(t) => {
            let mut out = t.secs().to_be_bytes().to_vec();
            out.extend_from_slice(&t.nanos().to_be_bytes());
            Ok(out)
        }
        Value::Uuid(u) => {
            let val = u.as_u128();
            let low = val as u64;
            let high = (val >> 64) as u64;
            let mut out = low.to_be_bytes().to_vec();
            out.extend_from_slice(&high.to_be_bytes());
            Ok(out)
        }
        Value::Blob(b) => Ok(b.clone()),
        Value::TypedLiteral { datatype, lexical } => {
            Ok(format!("{} {}", datatype, lexical).into_bytes())
        }
        Value::Sequence(elems) => encode_sequence_body(&elems.iter().collect::<Vec<_>>()),
        Value::Map(pairs) => {
            let mut refs = Vec::with_capacity(pairs.len() * 2);
            for (k, v) in pairs {
                refs.push(k);
                refs.push(v);
            }
            encode_sequence_body(&refs)
        }
        Value::Bool(_) | Value::UserDefined { .. } => {
            Err(Error::BadEncode(format!("{:?} has no payload encoding under {:?}", value, code)))
        }
    }
}

/// Encode `value`'s payload the way a homogeneous-tagged sequence element
/// is decoded: fixed width as-is, variable-length forced to a single
/// 1-byte length field (`ext = true`).
fn encode_payload_forced(value: &Value, code: TypeCode) -> Result<Vec<u8>> {
    let raw = payload_bytes(value, code)?;
    if code.is_variable_length() {
        encode_varlen_ext_true(&raw)
    } else {
        Ok(raw)
    }
}

/// Encode a full-form value: header byte plus payload, choosing the
/// narrowest length encoding for variable-length types.
fn encode_full(value: &Value, code: TypeCode) -> Result<Vec<u8>> {
    let raw = payload_bytes(value, code)?;
    if code.is_variable_length() {
        let (ext, len_bytes) = choose_length_bytes(raw.len())?;
        let mut out = vec![header::full_header(code, ext)];
        out.extend(len_bytes);
        out.extend(raw);
        Ok(out)
    } else {
        let mut out = vec![header::full_header(code, true)];
        out.extend(raw);
        Ok(out)
    }
}

fn encode_user_defined(class_name: &str, payload: &str) -> Result<Vec<u8>> {
    let raw = format!("{} {}", class_name, payload).into_bytes();
    let (ext, len_bytes) = choose_length_bytes(raw.len())?;
    let mut out = vec![0xE0 | (if ext { 0x10 } else { 0x00 }) | 0x0E];
    out.extend(len_bytes);
    out.extend(raw);
    Ok(out)
}

/// Encode a sequence or (flattened) map body, choosing among the three
/// sub-formats `spec.md` §4.1 defines: homogeneous fixed-width long,
/// homogeneous tagged, or heterogeneous.
fn encode_sequence_body(elems: &[&Value]) -> Result<Vec<u8>> {
    if elems.is_empty() {
        return Ok(Vec::new());
    }

    if elems.iter().all(|e| matches!(e, Value::Long(_))) {
        let width = elems
            .iter()
            .map(|e| minimal_signed_width(e.as_long().unwrap()))
            .max()
            .unwrap();
        let mut body = vec![header::short_long_header(width)];
        for e in elems {
            body.extend_from_slice(&signed_be_width(e.as_long().unwrap(), width));
        }
        return Ok(body);
    }

    if let Some(code) = elems[0].type_code() {
        if elems.iter().all(|e| e.type_code() == Some(code)) {
            let mut body = vec![code.into_nibble()];
            let mut fits = true;
            for e in elems {
                match encode_payload_forced(e, code) {
                    Ok(bytes) => body.extend(bytes),
                    Err(_) => {
                        fits = false;
                        break;
                    }
                }
            }
            if fits {
                return Ok(body);
            }
        }
    }

    let mut body = vec![0u8];
    for e in elems {
        body.extend(encode_object(e)?);
    }
    Ok(body)
}
