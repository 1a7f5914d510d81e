//! The v0.9.0 beacon chain records, described as `ssz` descriptors.
//!
//! Records are held as `ssz::Value` trees and addressed by `RecordKind`. A `Schema` holds the
//! descriptor of every record for one `Preset`; `RecordCodec` wraps a schema to encode, decode,
//! hash and prove records.

#[macro_use]
pub mod test_utils;

mod codec;
mod errors;
mod preset;
mod proof;
mod record_kind;
mod schema;

pub use crate::codec::RecordCodec;
pub use crate::errors::Error;
pub use crate::preset::{Error as PresetError, Preset};
pub use crate::proof::{generate_proof, Proof};
pub use crate::record_kind::RecordKind;
pub use crate::schema::Schema;

pub use ssz::{PathSegment, SszType, Value};

pub type Hash256 = ethereum_types::H256;
