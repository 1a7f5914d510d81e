use crate::{ChunkHasher, Hash256, Sha256Hasher, BYTES_PER_CHUNK};

/// Merkleizes bytes and returns the root, hashing one full layer at a time.
///
/// This is slower and uses more memory than `MerkleHasher`; it is kept as a simple, independent
/// implementation to test the faster paths against.
///
/// If `bytes.len() <= BYTES_PER_CHUNK` and `min_leaves <= 1`, no hashing is done and bytes is
/// returned, padded out to `BYTES_PER_CHUNK` length with `0`.
pub fn merkleize_padded(bytes: &[u8], min_leaves: usize) -> Hash256 {
    merkleize_padded_with(bytes, min_leaves, &Sha256Hasher)
}

pub fn merkleize_padded_with<H: ChunkHasher>(
    bytes: &[u8],
    min_leaves: usize,
    hasher: &H,
) -> Hash256 {
    let mut layer = bytes.chunks(BYTES_PER_CHUNK).map(pad).collect::<Vec<_>>();

    // The number of leaves in the full tree (including padding nodes).
    let num_leaves = std::cmp::max(layer.len(), min_leaves).next_power_of_two();
    let height = num_leaves.trailing_zeros() as usize;

    for h in 0..height {
        if layer.len() % 2 == 1 {
            layer.push(hasher.zero_hash(h).to_fixed_bytes());
        }

        layer = layer
            .chunks(2)
            .map(|pair| hasher.hash_concat(&pair[0], &pair[1]))
            .collect();
    }

    match layer.first() {
        Some(root) => Hash256::from(*root),
        None => hasher.zero_hash(height),
    }
}

fn pad(chunk: &[u8]) -> [u8; BYTES_PER_CHUNK] {
    let mut padded = [0; BYTES_PER_CHUNK];
    padded[..chunk.len()].copy_from_slice(chunk);
    padded
}
