//! The user-defined type registry (`spec.md` §4.1 default branch, §9).
//!
//! A full-form header naming a type code outside 0-13 falls through to the
//! user-defined decoder, which reads a space-separated `"class_name
//! payload"` string and hands `payload` to whatever decoder function was
//! registered for `class_name`. There is no reflection and no dynamic
//! loading - callers populate the registry explicitly at startup, exactly
//! as they would build any other lookup table.

use std::collections::BTreeMap;

use crate::error::{Error, Result};
use crate::value::Value;

/// A decoder for one user-defined class name: parses `payload` (the bytes
/// after the space separator) into a [`Value::UserDefined`] or fails.
pub type UserTypeDecoder = fn(class_name: &str, payload: &str) -> Result<Value>;

/// Maps registered class names to their decoder. Empty by default; the
/// caller populates it before decoding any value that might carry a
/// user-defined type.
#[derive(Clone, Default)]
pub struct UserTypeRegistry {
    decoders: BTreeMap<String, UserTypeDecoder>,
}

impl UserTypeRegistry {
    pub fn new() -> UserTypeRegistry {
        UserTypeRegistry {
            decoders: BTreeMap::new(),
        }
    }

    pub fn register(&mut self, class_name: impl Into<String>, decoder: UserTypeDecoder) {
        self.decoders.insert(class_name.into(), decoder);
    }

    /// Look up and invoke the decoder for `class_name`, or
    /// [`Error::UnknownUserType`] if none was registered.
    pub fn decode(&self, class_name: &str, payload: &str) -> Result<Value> {
        match self.decoders.get(class_name) {
            Some(decoder) => decoder(class_name, payload),
            None => Err(Error::UnknownUserType {
                class_name: class_name.to_string(),
            }),
        }
    }
}

/// The default fallback decoder: stores `(class_name, payload)` verbatim
/// with no interpretation. Useful for registries that want to accept any
/// class name rather than reject unrecognized ones.
pub fn passthrough_decoder(class_name: &str, payload: &str) -> Result<Value> {
    Ok(Value::UserDefined {
        class_name: class_name.to_string(),
        payload: payload.to_string(),
    })
}
