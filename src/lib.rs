//! The durable value codec for a graph/triple store: a tagged-byte
//! encoder/decoder for a heterogeneous value universe, a bit-packed 64-bit
//! encapsulated-ID scheme that inlines small values directly into
//! identifiers, and a prefix comparator for ordering index-node byte
//! prefixes against in-memory values.
//!
//! The crate is pure and stateless - it performs no I/O of its own. All byte
//! access goes through the [`PagedReader`] trait, so callers can back it
//! with whatever paged storage they have; [`SliceReader`] is a simple
//! in-memory reference implementation.

#![allow(dead_code)]

mod compare;
mod decode;
mod depth_tracking;
mod encode;
mod error;
mod header;
mod inline;
mod reader;
mod timestamp;
mod user_type;
mod value;

pub use compare::{cmp_value_prefix, UTF8_TAIL_SCAN_LIMIT};
pub use decode::{read_object, read_object_size};
pub use depth_tracking::{DepthTracker, MAX_DEPTH};
pub use encode::{encode_object, encode_value};
pub use error::{Error, Result};
pub use header::{node_header_length, type_info, TypeCode};
pub use inline::{encapsulate, encapsulate_node_ref, is_encapsulated_node, unencapsulate};
pub use reader::{PagedReader, SliceReader};
pub use timestamp::{Date, Instant};
pub use user_type::{passthrough_decoder, UserTypeDecoder, UserTypeRegistry};
pub use value::{map_to_last_wins, Value};
