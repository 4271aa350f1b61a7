//! The paged byte reader abstraction the codec consumes (`spec.md` §6).
//!
//! The codec never owns storage; it is handed a `PagedReader` and an
//! absolute byte position. All three operations must be idempotent and free
//! of caller-visible side effects. Implementations backed by shared storage
//! must be `Send + Sync` if they are to be used from more than one thread -
//! the codec itself acquires no locks (`spec.md` §5).

use byteorder::{BigEndian, ReadBytesExt};

use crate::error::{Error, Result};

/// Random access to a byte-addressed store, at the granularity the codec
/// needs: a single byte, a contiguous run of bytes, or a big-endian 16-bit
/// signed short - all at an absolute position.
pub trait PagedReader {
    fn read_byte(&self, pos: u64) -> Result<u8>;
    fn read_bytes(&self, pos: u64, len: usize) -> Result<Vec<u8>>;
    fn read_short(&self, pos: u64) -> Result<i16>;
}

/// An in-memory `PagedReader` over a single contiguous byte slice. Used by
/// tests, and as the default reader for callers that already have the whole
/// value in memory rather than behind a real paged store.
#[derive(Clone, Copy, Debug)]
pub struct SliceReader<'a> {
    data: &'a [u8],
}

impl<'a> SliceReader<'a> {
    pub fn new(data: &'a [u8]) -> SliceReader<'a> {
        SliceReader { data }
    }
}

impl<'a> PagedReader for SliceReader<'a> {
    fn read_byte(&self, pos: u64) -> Result<u8> {
        let pos = pos as usize;
        self.data.get(pos).copied().ok_or(Error::LengthTooShort {
            step: "read_byte",
            actual: self.data.len().saturating_sub(pos),
            expected: 1,
        })
    }

    fn read_bytes(&self, pos: u64, len: usize) -> Result<Vec<u8>> {
        let pos = pos as usize;
        let end = pos.checked_add(len).ok_or(Error::LengthTooShort {
            step: "read_bytes",
            actual: 0,
            expected: len,
        })?;
        self.data
            .get(pos..end)
            .map(|s| s.to_vec())
            .ok_or(Error::LengthTooShort {
                step: "read_bytes",
                actual: self.data.len().saturating_sub(pos),
                expected: len,
            })
    }

    fn read_short(&self, pos: u64) -> Result<i16> {
        let bytes = self.read_bytes(pos, 2)?;
        Ok((&bytes[..]).read_i16::<BigEndian>().expect("exactly 2 bytes"))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn reads_in_bounds() {
        let data = [0x01, 0x02, 0x03, 0x04];
        let r = SliceReader::new(&data);
        assert_eq!(r.read_byte(0).unwrap(), 0x01);
        assert_eq!(r.read_bytes(1, 2).unwrap(), vec![0x02, 0x03]);
        assert_eq!(r.read_short(0).unwrap(), 0x0102);
    }

    #[test]
    fn out_of_bounds_errors() {
        let data = [0x01u8];
        let r = SliceReader::new(&data);
        assert!(r.read_byte(5).is_err());
        assert!(r.read_bytes(0, 10).is_err());
        assert!(r.read_short(0).is_err());
    }
}
