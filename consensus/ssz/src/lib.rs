//! Provides encoding (serialization) and decoding (deserialization) in the SimpleSerialize (SSZ)
//! format designed for use in Ethereum 2.0.
//!
//! Unlike a trait-per-type implementation, every shape is described at runtime by an
//! [`SszType`](enum.SszType.html) descriptor and every record is held as a
//! [`Value`](enum.Value.html) tree. Descriptors are built once (typically at process start) and
//! are immutable thereafter; encoding and decoding are pure functions of a value and its
//! descriptor.
//!
//! ## Example
//!
//! ```rust
//! use ssz::{decode, encode, ContainerType, SszType, Value};
//!
//! let foo = SszType::Container(
//!     ContainerType::new(
//!         "Foo",
//!         vec![
//!             ("a", SszType::U64),
//!             ("b", SszType::list(SszType::U8, 4).unwrap()),
//!         ],
//!     )
//!     .unwrap(),
//! );
//!
//! let value = Value::Container(vec![
//!     Value::Uint(5),
//!     Value::List(vec![Value::Uint(1), Value::Uint(2)]),
//! ]);
//!
//! let bytes = encode(&value, &foo).unwrap();
//! assert_eq!(bytes, vec![5, 0, 0, 0, 0, 0, 0, 0, 12, 0, 0, 0, 1, 2]);
//! assert_eq!(decode(&bytes, &foo).unwrap(), value);
//! ```
mod bitfield;
pub mod decode;
mod descriptor;
pub mod encode;
mod path;
pub mod validate;
mod value;

pub use bitfield::{Bitfield, Error as BitfieldError};
pub use decode::{decode, read_offset, DecodeError, OffsetError, SszDecoder, SszDecoderBuilder};
pub use descriptor::{ConfigError, ContainerType, Field, ListType, SszType, VectorType};
pub use encode::{encode, encode_into, encoded_len, EncodeError, SszEncoder};
pub use path::PathSegment;
pub use value::Value;

/// The number of bytes used to represent an offset.
pub const BYTES_PER_LENGTH_OFFSET: usize = 4;
/// The maximum value that can be represented using `BYTES_PER_LENGTH_OFFSET`.
pub const MAX_LENGTH_VALUE: usize = u32::MAX as usize;

/// The deepest chunk tree any descriptor may produce.
pub const MAX_TREE_DEPTH: usize = 48;
/// The maximum element count (or bit count) that a list or bitlist descriptor may declare.
///
/// Bounding limits keeps every Merkle tree at or below `MAX_TREE_DEPTH` layers.
pub const MAX_LIST_LIMIT: u64 = 1 << MAX_TREE_DEPTH;
