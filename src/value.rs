//! The in-memory value universe (`spec.md` §3's type-code table) and the
//! accessors used to inspect a decoded [`Value`] without matching on it
//! directly, in the same style as `fog-pack`'s `Value`/`ValueRef`.

use std::collections::BTreeMap;

use bigdecimal::BigDecimal;
use num_bigint::BigInt;
use uuid::Uuid;

use crate::timestamp::{Date, Instant};

/// A single decoded value. Produced by [`crate::decode::read_object`] and
/// consumed by [`crate::encode::encode_value`].
///
/// `Bool` has no tagged-byte encoding of its own (§3's type-code table omits
/// it) - it only ever arrives via [`crate::inline::unencapsulate`]. Passing
/// a `Bool` to the tagged-byte encoder is a programmer error and returns
/// [`crate::error::Error::BadEncode`].
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Bool(bool),
    Long(i64),
    Double(f64),
    Str(String),
    Uri(String),
    /// Ordered list. See [`Value::Map`] for why maps are also list-shaped.
    Sequence(Vec<Value>),
    /// An ordered list of key/value pairs, *not* a `BTreeMap`/`HashMap`.
    /// Round-tripping a decode through an encode must reproduce the
    /// original bytes (invariant 1, `spec.md` §3) - a representation that
    /// collapses duplicate keys or reorders pairs during decode can't
    /// satisfy that for wire data containing duplicate keys or
    /// non-lexicographic pair order. See `DESIGN.md` for the full
    /// rationale.
    Map(Vec<(Value, Value)>),
    BigInt(BigInt),
    BigDecimal(BigDecimal),
    Date(Date),
    Instant(Instant),
    Keyword(String),
    Uuid(Uuid),
    Blob(Vec<u8>),
    /// `(uri, lexical)`, written on the wire as `"<uri> <lexical>"`.
    TypedLiteral { datatype: String, lexical: String },
    /// `(class_name, payload)`, the default decoder branch for a full-form
    /// header naming an unrecognized type code.
    UserDefined { class_name: String, payload: String },
}

impl Value {
    pub fn is_bool(&self) -> bool {
        matches!(self, Value::Bool(_))
    }

    pub fn is_long(&self) -> bool {
        matches!(self, Value::Long(_))
    }

    pub fn is_double(&self) -> bool {
        matches!(self, Value::Double(_))
    }

    pub fn is_str(&self) -> bool {
        matches!(self, Value::Str(_))
    }

    pub fn is_uri(&self) -> bool {
        matches!(self, Value::Uri(_))
    }

    pub fn is_string_shaped(&self) -> bool {
        matches!(self, Value::Str(_) | Value::Uri(_) | Value::Keyword(_))
    }

    pub fn is_sequence(&self) -> bool {
        matches!(self, Value::Sequence(_))
    }

    pub fn is_map(&self) -> bool {
        matches!(self, Value::Map(_))
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_long(&self) -> Option<i64> {
        match self {
            Value::Long(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_double(&self) -> Option<f64> {
        match self {
            Value::Double(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the canonical string spelling of a string-shaped value:
    /// the string itself, a URI's spelling, or a keyword's name (without a
    /// leading sigil - this codec stores keyword names bare, see
    /// `spec.md` §4.3).
    pub fn as_string_shaped(&self) -> Option<&str> {
        match self {
            Value::Str(s) | Value::Uri(s) | Value::Keyword(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn as_sequence(&self) -> Option<&[Value]> {
        match self {
            Value::Sequence(v) => Some(v.as_slice()),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&[(Value, Value)]> {
        match self {
            Value::Map(v) => Some(v.as_slice()),
            _ => None,
        }
    }

    pub fn as_blob(&self) -> Option<&[u8]> {
        match self {
            Value::Blob(v) => Some(v.as_slice()),
            _ => None,
        }
    }

    pub fn as_uuid(&self) -> Option<&Uuid> {
        match self {
            Value::Uuid(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_big_int(&self) -> Option<&BigInt> {
        match self {
            Value::BigInt(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_big_decimal(&self) -> Option<&BigDecimal> {
        match self {
            Value::BigDecimal(v) => Some(v),
            _ => None,
        }
    }

    /// The type code this value decodes/encodes under, or `None` for
    /// `Bool`, which has none (see the struct doc).
    pub fn type_code(&self) -> Option<crate::header::TypeCode> {
        use crate::header::TypeCode as T;
        match self {
            Value::Bool(_) => None,
            Value::Long(_) => Some(T::Long),
            Value::Double(_) => Some(T::Double),
            Value::Str(_) => Some(T::Str),
            Value::Uri(_) => Some(T::Uri),
            Value::Sequence(_) => Some(T::Sequence),
            Value::Map(_) => Some(T::Map),
            Value::BigInt(_) => Some(T::BigInt),
            Value::BigDecimal(_) => Some(T::BigDecimal),
            Value::Date(_) => Some(T::Date),
            Value::Instant(_) => Some(T::Instant),
            Value::Keyword(_) => Some(T::Keyword),
            Value::Uuid(_) => Some(T::Uuid),
            Value::Blob(_) => Some(T::Blob),
            Value::TypedLiteral { .. } => Some(T::TypedLiteral),
            Value::UserDefined { .. } => None,
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Value {
        Value::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Value {
        Value::Long(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Value {
        Value::Double(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Value {
        Value::Str(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Value {
        Value::Str(v.to_string())
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Value {
        Value::Blob(v)
    }
}

/// Convert a decoded `Map` pair list to a `BTreeMap`, applying last-wins
/// semantics for duplicate keys. This is a lossy, one-way convenience for
/// callers that just want a lookup table; it is *not* used internally, and
/// round-tripping through it does not preserve original wire bytes.
pub fn map_to_last_wins(pairs: &[(Value, Value)]) -> BTreeMap<String, &Value> {
    let mut out = BTreeMap::new();
    for (k, v) in pairs {
        if let Some(key) = k.as_string_shaped() {
            out.insert(key.to_string(), v);
        }
    }
    out
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn accessors() {
        assert_eq!(Value::Long(5).as_long(), Some(5));
        assert_eq!(Value::Double(1.5).as_double(), Some(1.5));
        assert_eq!(Value::Str("hi".into()).as_string_shaped(), Some("hi"));
        assert_eq!(Value::Uri("http://x".into()).as_string_shaped(), Some("http://x"));
        assert_eq!(Value::Keyword("kw".into()).as_string_shaped(), Some("kw"));
        assert!(Value::Bool(true).as_long().is_none());
    }

    #[test]
    fn map_last_wins_collapses_duplicates() {
        let pairs = vec![
            (Value::Str("a".into()), Value::Long(1)),
            (Value::Str("a".into()), Value::Long(2)),
        ];
        let map = map_to_last_wins(&pairs);
        assert_eq!(map.get("a").unwrap().as_long(), Some(2));
    }

    #[test]
    fn type_codes() {
        assert_eq!(Value::Long(0).type_code(), Some(crate::header::TypeCode::Long));
        assert_eq!(Value::Bool(false).type_code(), None);
    }
}
