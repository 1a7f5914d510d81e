use crate::{
    merkle_root_with, mix_in_length_with, ChunkHasher, Error, Hash256, Sha256Hasher,
    BYTES_PER_CHUNK,
};
use ssz::validate::{check_length, check_limit, check_uint};
use ssz::{EncodeError, SszType, Value};

/// Bits per chunk when merkleizing bit vectors and bitlists.
const BITS_PER_CHUNK: usize = BYTES_PER_CHUNK * 8;

/// Returns the `hash_tree_root` of `value`, interpreted as `ty`.
///
/// Returns an error if `value` does not conform to `ty`. In particular, a list or bitlist longer
/// than its limit is rejected rather than truncated.
pub fn hash_tree_root(value: &Value, ty: &SszType) -> Result<Hash256, Error> {
    hash_tree_root_with(value, ty, &Sha256Hasher)
}

/// As `hash_tree_root`, using `hasher` for every node.
pub fn hash_tree_root_with<H: ChunkHasher>(
    value: &Value,
    ty: &SszType,
    hasher: &H,
) -> Result<Hash256, Error> {
    let bytes = leaf_bytes(value, ty, hasher)?;
    let root = merkle_root_with(&bytes, chunk_count(ty), hasher);

    match mixed_in_length(value, ty) {
        Some(len) => Ok(mix_in_length_with(&root, len, hasher)),
        None => Ok(root),
    }
}

/// Returns the leaf chunks of `value`'s tree, excluding any padding (and, for lists and
/// bitlists, excluding the length mix-in).
///
/// Leaf `i` of the result is leaf `i` of the tree of depth `tree_depth(ty)` which produces the
/// root (or, for lists, the data root).
pub fn merkle_leaves(value: &Value, ty: &SszType) -> Result<Vec<Hash256>, Error> {
    merkle_leaves_with(value, ty, &Sha256Hasher)
}

pub fn merkle_leaves_with<H: ChunkHasher>(
    value: &Value,
    ty: &SszType,
    hasher: &H,
) -> Result<Vec<Hash256>, Error> {
    let bytes = leaf_bytes(value, ty, hasher)?;
    if ty.is_basic() {
        return Ok(vec![pad_chunk(&bytes)]);
    }
    Ok(bytes.chunks(BYTES_PER_CHUNK).map(pad_chunk).collect())
}

/// The number of leaves in the tree of `ty` before padding to a power of two.
///
/// For lists and bitlists this is derived from the limit, not the length, so the tree shape is
/// fixed by the descriptor.
pub fn chunk_count(ty: &SszType) -> usize {
    match ty {
        SszType::Uint(_) | SszType::Bool => 1,
        SszType::ByteVector(len) => (len + BYTES_PER_CHUNK - 1) / BYTES_PER_CHUNK,
        SszType::Bitvector(len) | SszType::Bitlist(len) => {
            (len + BITS_PER_CHUNK - 1) / BITS_PER_CHUNK
        }
        SszType::Vector(vector) => sequence_chunk_count(vector.elem(), vector.len()),
        SszType::List(list) => sequence_chunk_count(list.elem(), list.limit()),
        SszType::Container(container) => container.fields().len(),
    }
}

fn sequence_chunk_count(elem: &SszType, len: usize) -> usize {
    if elem.is_basic() {
        (len * elem.ssz_fixed_len() + BYTES_PER_CHUNK - 1) / BYTES_PER_CHUNK
    } else {
        len
    }
}

/// The depth of the chunk tree of `ty` (i.e., the length of an inclusion proof for one of its
/// leaves), excluding the length mix-in of lists and bitlists.
pub fn tree_depth(ty: &SszType) -> usize {
    chunk_count(ty).next_power_of_two().trailing_zeros() as usize
}

/// Returns `true` if the root of `ty` is `mix_in_length(data_root, len)`.
pub fn mixes_in_length(ty: &SszType) -> bool {
    matches!(ty, SszType::List(_) | SszType::Bitlist(_))
}

pub(crate) fn mixed_in_length(value: &Value, ty: &SszType) -> Option<usize> {
    match (ty, value) {
        (SszType::List(_), Value::List(values)) => Some(values.len()),
        (SszType::Bitlist(_), Value::Bits(bits)) => Some(bits.len()),
        _ => None,
    }
}

/// Returns the concatenated leaves of `value`, unpadded.
///
/// For packed shapes these are the packed bytes themselves; for other composites they are the
/// roots of each child.
fn leaf_bytes<H: ChunkHasher>(value: &Value, ty: &SszType, hasher: &H) -> Result<Vec<u8>, Error> {
    match (ty, value) {
        (SszType::Uint(_), _) | (SszType::Bool, _) => {
            let mut bytes = Vec::with_capacity(8);
            pack_basic(value, ty, &mut bytes)?;
            Ok(bytes)
        }
        (SszType::ByteVector(len), Value::Bytes(bytes)) => {
            check_length(bytes.len(), *len)?;
            Ok(bytes.clone())
        }
        (SszType::Bitvector(len), Value::Bits(bits)) => {
            check_length(bits.len(), *len)?;
            Ok(bits.as_bytes().to_vec())
        }
        (SszType::Bitlist(limit), Value::Bits(bits)) => {
            check_limit(bits.len(), *limit)?;
            Ok(bits.as_bytes().to_vec())
        }
        (SszType::Vector(vector), Value::Vector(values)) => {
            check_length(values.len(), vector.len())?;
            sequence_leaf_bytes(values, vector.elem(), hasher)
        }
        (SszType::List(list), Value::List(values)) => {
            check_limit(values.len(), list.limit())?;
            sequence_leaf_bytes(values, list.elem(), hasher)
        }
        (SszType::Container(container), Value::Container(values)) => {
            check_length(values.len(), container.fields().len())?;

            let mut bytes = Vec::with_capacity(values.len() * BYTES_PER_CHUNK);
            for (field, value) in container.fields().iter().zip(values) {
                let root = hash_tree_root_with(value, field.ty(), hasher)
                    .map_err(|e| e.in_field(field.name()))?;
                bytes.extend_from_slice(root.as_bytes());
            }
            Ok(bytes)
        }
        _ => Err(type_mismatch(ty, value)),
    }
}

fn sequence_leaf_bytes<H: ChunkHasher>(
    values: &[Value],
    elem: &SszType,
    hasher: &H,
) -> Result<Vec<u8>, Error> {
    if elem.is_basic() {
        let mut bytes = Vec::with_capacity(values.len() * elem.ssz_fixed_len());
        for (i, value) in values.iter().enumerate() {
            pack_basic(value, elem, &mut bytes).map_err(|e| e.at_index(i))?;
        }
        Ok(bytes)
    } else {
        let mut bytes = Vec::with_capacity(values.len() * BYTES_PER_CHUNK);
        for (i, value) in values.iter().enumerate() {
            let root = hash_tree_root_with(value, elem, hasher).map_err(|e| e.at_index(i))?;
            bytes.extend_from_slice(root.as_bytes());
        }
        Ok(bytes)
    }
}

/// Appends the little-endian encoding of a basic value.
fn pack_basic(value: &Value, ty: &SszType, bytes: &mut Vec<u8>) -> Result<(), Error> {
    match (ty, value) {
        (SszType::Uint(num_bytes), Value::Uint(n)) => {
            check_uint(*n, *num_bytes)?;
            bytes.extend_from_slice(&n.to_le_bytes()[0..*num_bytes]);
            Ok(())
        }
        (SszType::Bool, Value::Bool(b)) => {
            bytes.push(*b as u8);
            Ok(())
        }
        _ => Err(type_mismatch(ty, value)),
    }
}

fn type_mismatch(ty: &SszType, value: &Value) -> Error {
    Error::InvalidValue(EncodeError::TypeMismatch {
        expected: ty.kind_name(),
        found: value.kind_name(),
    })
}

fn pad_chunk(chunk: &[u8]) -> Hash256 {
    let mut padded = [0; BYTES_PER_CHUNK];
    padded[..chunk.len()].copy_from_slice(chunk);
    Hash256::from(padded)
}
