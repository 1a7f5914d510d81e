use crate::{Hash256, BYTES_PER_CHUNK};
use ethereum_hashing::{hash32_concat, ZERO_HASHES, ZERO_HASHES_MAX_INDEX};

/// The two-to-one compression function used to build Merkle trees.
///
/// Every entry point in this crate has a `_with` variant which accepts any `ChunkHasher`; the
/// plain variants use `Sha256Hasher`.
pub trait ChunkHasher {
    /// Returns the hash of `left ++ right`, where both are 32 bytes.
    fn hash_concat(&self, left: &[u8], right: &[u8]) -> [u8; BYTES_PER_CHUNK];

    /// Returns the root of a tree of the given `height` where every leaf is `[0; 32]`.
    ///
    /// A height of zero is a single zero leaf. Implementations should override this with a
    /// pre-computed table.
    fn zero_hash(&self, height: usize) -> Hash256 {
        let mut node = [0; BYTES_PER_CHUNK];
        for _ in 0..height {
            node = self.hash_concat(&node, &node);
        }
        Hash256::from(node)
    }
}

impl<'a, H: ChunkHasher + ?Sized> ChunkHasher for &'a H {
    fn hash_concat(&self, left: &[u8], right: &[u8]) -> [u8; BYTES_PER_CHUNK] {
        (**self).hash_concat(left, right)
    }

    fn zero_hash(&self, height: usize) -> Hash256 {
        (**self).zero_hash(height)
    }
}

/// SHA-256, as used by the beacon chain.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Sha256Hasher;

impl ChunkHasher for Sha256Hasher {
    fn hash_concat(&self, left: &[u8], right: &[u8]) -> [u8; BYTES_PER_CHUNK] {
        hash32_concat(left, right)
    }

    fn zero_hash(&self, height: usize) -> Hash256 {
        if height <= ZERO_HASHES_MAX_INDEX {
            Hash256::from_slice(&ZERO_HASHES[height][..])
        } else {
            let mut node = Hash256::from_slice(&ZERO_HASHES[ZERO_HASHES_MAX_INDEX][..]);
            for _ in ZERO_HASHES_MAX_INDEX..height {
                node = Hash256::from(self.hash_concat(node.as_bytes(), node.as_bytes()));
            }
            node
        }
    }
}
