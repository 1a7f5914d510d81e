//! Computes SSZ `hash_tree_root` for any `ssz::Value` described by an `ssz::SszType`.
//!
//! Roots are built from 32-byte chunks. Basic values and sequences of basic values are packed
//! into chunks; every other composite contributes one chunk per child (that child's root). Lists
//! and bitlists mix their length into the root, so `[1]` and `[1, 0]` hash differently.
mod cache;
mod hasher;
mod merkle_hasher;
mod merkleize;
mod merkleize_padded;

pub use cache::{CachedRoot, TreeHashCache};
pub use hasher::{ChunkHasher, Sha256Hasher};
pub use merkle_hasher::MerkleHasher;
pub use merkleize::{
    chunk_count, hash_tree_root, hash_tree_root_with, merkle_leaves, merkle_leaves_with,
    mixes_in_length, tree_depth,
};
pub use merkleize_padded::{merkleize_padded, merkleize_padded_with};

use ssz::validate::{LengthMismatch, LimitExceeded};
use ssz::EncodeError;

pub const BYTES_PER_CHUNK: usize = 32;
pub const HASHSIZE: usize = 32;
pub const MERKLE_HASH_CHUNK: usize = 2 * BYTES_PER_CHUNK;

pub type Hash256 = ethereum_types::H256;

#[derive(Clone, Debug, PartialEq)]
pub enum Error {
    /// The value does not conform to the descriptor it was hashed with.
    InvalidValue(EncodeError),
    /// More leaves were written to a `MerkleHasher` than its capacity.
    MaximumLeavesExceeded { max_leaves: usize },
    /// A `TreeHashCache` was given fewer leaves than it already holds.
    CannotShrink,
    /// A `TreeHashCache` was given more leaves than its depth permits.
    TooManyLeaves,
    /// A `TreeHashCache` layer is missing a node that should exist.
    CacheInconsistent,
}

impl Error {
    /// Annotate `self` as having occurred within the container field `name`.
    pub fn in_field(self, name: &str) -> Self {
        match self {
            Error::InvalidValue(e) => Error::InvalidValue(e.in_field(name)),
            other => other,
        }
    }

    /// Annotate `self` as having occurred within element `i` of a vector or list.
    pub fn at_index(self, i: usize) -> Self {
        match self {
            Error::InvalidValue(e) => Error::InvalidValue(e.at_index(i)),
            other => other,
        }
    }
}

impl From<EncodeError> for Error {
    fn from(e: EncodeError) -> Self {
        Error::InvalidValue(e)
    }
}

impl From<LimitExceeded> for Error {
    fn from(e: LimitExceeded) -> Self {
        Error::InvalidValue(e.into())
    }
}

impl From<LengthMismatch> for Error {
    fn from(e: LengthMismatch) -> Self {
        Error::InvalidValue(e.into())
    }
}

/// Convenience method for `MerkleHasher` which also provides some fast-paths for small trees.
///
/// `minimum_leaf_count` will only be used if it is greater than or equal to the minimum number of
/// leaves that can be created from `bytes`.
pub fn merkle_root(bytes: &[u8], minimum_leaf_count: usize) -> Hash256 {
    merkle_root_with(bytes, minimum_leaf_count, &Sha256Hasher)
}

/// As `merkle_root`, using `hasher` for every node.
pub fn merkle_root_with<H: ChunkHasher>(
    bytes: &[u8],
    minimum_leaf_count: usize,
    hasher: &H,
) -> Hash256 {
    let leaves = std::cmp::max(
        (bytes.len() + (HASHSIZE - 1)) / HASHSIZE,
        minimum_leaf_count,
    );

    if leaves == 0 {
        // If there are no bytes then the hash is always zero.
        Hash256::zero()
    } else if leaves == 1 {
        // If there is only one leaf, the hash is always those leaf bytes padded out to 32-bytes.
        let mut hash = [0; HASHSIZE];
        hash[0..bytes.len()].copy_from_slice(bytes);
        Hash256::from_slice(&hash)
    } else if leaves == 2 {
        // If there are only two leaves (this is common with BLS pubkeys), we can avoid some
        // overhead with `MerkleHasher` and just do a simple 3-node tree here.
        let mut leaves = [0; HASHSIZE * 2];
        leaves[0..bytes.len()].copy_from_slice(bytes);

        Hash256::from(hasher.hash_concat(&leaves[0..HASHSIZE], &leaves[HASHSIZE..]))
    } else {
        // If there are 3 or more leaves, use `MerkleHasher`.
        let mut merkle_hasher = MerkleHasher::with_leaves_and_hasher(leaves, hasher);
        merkle_hasher
            .write(bytes)
            .expect("the number of leaves is adequate for the number of bytes");
        merkle_hasher
            .finish()
            .expect("the number of leaves is adequate for the number of bytes")
    }
}

/// Returns the node created by hashing `root` and `length`.
///
/// Used for inserting the length of a list or bitlist above its root.
pub fn mix_in_length(root: &Hash256, length: usize) -> Hash256 {
    mix_in_length_with(root, length, &Sha256Hasher)
}

pub fn mix_in_length_with<H: ChunkHasher>(root: &Hash256, length: usize, hasher: &H) -> Hash256 {
    Hash256::from(hasher.hash_concat(root.as_bytes(), &length_chunk(length)))
}

/// Returns `length` as a little-endian, zero-padded chunk.
///
/// This is the right-hand sibling of a list's data root and so the final node of any inclusion
/// proof for an element of that list.
pub fn length_chunk(length: usize) -> [u8; BYTES_PER_CHUNK] {
    let mut length_bytes = [0; BYTES_PER_CHUNK];
    length_bytes[0..8].copy_from_slice(&(length as u64).to_le_bytes());
    length_bytes
}
