//! Library error types.
//!
use std::fmt;

/// A codec `Result`, normally returning a codec [`Error`].
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// A codec error. Encompasses any issues that can happen during decoding,
/// encoding, or comparison.
///
/// The codec never retries, never swallows an error, and never logs
/// (`spec.md` §7); callers decide whether a given error aborts the
/// enclosing transaction.
#[derive(Clone, Debug)]
pub enum Error {
    /// The homogeneous-tagged sequence path named a type code with no
    /// decoder ("illegal datatype in array", `spec.md` §7).
    UnknownSequenceType {
        /// The decoded type code nibble.
        type_code: u8,
    },
    /// The default (user-defined) decoder's class name isn't registered.
    UnknownUserType {
        /// The unrecognized class name.
        class_name: String,
    },
    /// Basic structural decoding failure: bad UTF-8, a typed-literal body
    /// with no space separator, a malformed big-decimal string, and so on.
    BadEncode(String),
    /// The reader ran out of bytes partway through a value.
    LengthTooShort {
        /// What step of decoding failed.
        step: &'static str,
        /// Bytes actually available.
        actual: usize,
        /// Bytes required to complete the step.
        expected: usize,
    },
    /// Sequence/map nesting exceeded the depth limit.
    ParseLimit(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::UnknownSequenceType { type_code } => {
                write!(f, "Illegal datatype in array: type code {}", type_code)
            }
            Error::UnknownUserType { class_name } => {
                write!(f, "No decoder registered for user-defined class '{}'", class_name)
            }
            Error::BadEncode(msg) => write!(f, "Basic data encoding failure: {}", msg),
            Error::LengthTooShort {
                step,
                actual,
                expected,
            } => write!(
                f,
                "Expected at least {} bytes, but got {} on step [{}]",
                expected, actual, step
            ),
            Error::ParseLimit(msg) => write!(f, "Hit parsing limit: {}", msg),
        }
    }
}

impl std::error::Error for Error {}
