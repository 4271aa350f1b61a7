//! The prefix comparator (`spec.md` §4.3): orders an in-memory value against
//! a byte buffer that may hold only a prefix of the stored value, such as an
//! index node's fixed-width key slot.

use std::cmp::Ordering;

use crate::decode::be_signed;
use crate::encode::encode_object;
use crate::error::{Error, Result};
use crate::header::{classify, node_header_length, Header, TypeCode};
use crate::value::Value;

/// Backward UTF-8 boundary scan is bounded at this many bytes - a guard
/// against malformed input, not a correctness requirement for well-formed
/// strings (`spec.md` §9).
pub const UTF8_TAIL_SCAN_LIMIT: usize = 4;

/// Compare `left` against `right_bytes`, the full byte view of a stored
/// index slot (including its header byte), which may hold only a prefix of
/// the complete stored value.
pub fn cmp_value_prefix(left: &Value, right_bytes: &[u8]) -> Result<Ordering> {
    if right_bytes.is_empty() {
        return Err(Error::LengthTooShort {
            step: "cmp_value_prefix",
            actual: 0,
            expected: 1,
        });
    }
    match left.as_string_shaped() {
        Some(left_s) => cmp_string_prefix(left_s, right_bytes),
        None => {
            if let Value::Long(lv) = left {
                // `Long` is logically fixed-width but its tagged-byte
                // encoding picks the narrowest short-long width that fits
                // (see `encode.rs::minimal_signed_width`), so two encoded
                // longs of differing magnitude can have differing byte
                // widths. A raw byte compare would then order them by width
                // before value (`3` as `[0x03]` vs `300` as `[0x01, 0x2C]`).
                // Decode the right-hand long back to an `i64` and compare
                // numerically instead.
                let rv = decode_long_header(right_bytes)?;
                return Ok(lv.cmp(&rv));
            }
            let left_bytes = encode_object(left)?;
            let left_body = &left_bytes[1..];
            let right_body = &right_bytes[1..];
            Ok(left_body.cmp(right_body))
        }
    }
}

/// Decode a `Long`-shaped header (short-long or full-form) back to its
/// signed value, for numeric comparison against a `Value::Long` left side.
fn decode_long_header(right_bytes: &[u8]) -> Result<i64> {
    match classify(right_bytes[0]) {
        Header::ShortLong(width) => {
            let width = width as usize;
            let body = right_bytes.get(1..1 + width).ok_or(Error::LengthTooShort {
                step: "decode_long_header",
                actual: right_bytes.len().saturating_sub(1),
                expected: width,
            })?;
            Ok(be_signed(body))
        }
        Header::Full { type_code: TypeCode::Long, .. } => {
            let body = right_bytes.get(1..9).ok_or(Error::LengthTooShort {
                step: "decode_long_header",
                actual: right_bytes.len().saturating_sub(1),
                expected: 8,
            })?;
            Ok(be_signed(body))
        }
        _ => Err(Error::BadEncode("expected a long-shaped header".to_string())),
    }
}

/// How many bytes of `right_bytes` precede the string/URI/keyword body: 1 for
/// every short form, 2 for a full-form header with `ext` set (1 length
/// byte), and 3 or 5 for a full-form header with a 2-byte or continued
/// 4-byte length. `spec.md` §4.3's literal formula assumes this offset is
/// always 1 (true for the short forms that dominate index-key storage); this
/// generalizes it to full-form string-shaped values too.
fn body_offset(right_bytes: &[u8]) -> usize {
    match classify(right_bytes[0]) {
        Header::Full { ext, .. } => {
            if ext {
                2
            } else if right_bytes.len() >= 2 && right_bytes[1] & 0x80 == 0 {
                3
            } else {
                5
            }
        }
        _ => 1,
    }
}

fn cmp_string_prefix(left_s: &str, right_bytes: &[u8]) -> Result<Ordering> {
    let full_length = node_header_length(right_bytes);
    // `body_offset` can exceed `right_bytes.len()` when the slot holds only
    // the header byte (and maybe a partial length field) of a full-form
    // string - e.g. an `ext` header with no length byte at all yet. Clamp it
    // so `available`/`rlen`/the slice bounds below never go negative or past
    // the end of the buffer.
    let offset = body_offset(right_bytes).min(right_bytes.len());
    let available = right_bytes.len() - offset;
    let rlen = full_length.min(available);
    let body_end = offset + rlen;
    let trunc = partial_utf8_tail_bytes(&right_bytes[offset..body_end], rlen);
    let right_s = std::str::from_utf8(&right_bytes[offset..body_end - trunc])
        .map_err(|e| Error::BadEncode(e.to_string()))?;

    if full_length <= available {
        Ok(left_s.cmp(right_s))
    } else {
        let right_len = right_s.chars().count();
        let left_prefix: String = left_s.chars().take(right_len).collect();
        Ok(left_prefix.as_str().cmp(right_s))
    }
}

/// Scans `buf[..end]` backward up to [`UTF8_TAIL_SCAN_LIMIT`] bytes and
/// returns the number of trailing bytes that form an incomplete UTF-8 code
/// unit and must be dropped before decoding.
fn partial_utf8_tail_bytes(buf: &[u8], end: usize) -> usize {
    let limit = UTF8_TAIL_SCAN_LIMIT.min(end);
    for back in 1..=limit {
        let b = buf[end - back];
        if b & 0x80 == 0 {
            return 0;
        } else if b & 0xC0 == 0x80 {
            continue;
        }
        let needed = if b & 0xE0 == 0xC0 {
            1
        } else if b & 0xF0 == 0xE0 {
            2
        } else if b & 0xF8 == 0xF0 {
            3
        } else {
            return back;
        };
        let have = back - 1;
        return if have < needed { back } else { 0 };
    }
    limit
}
