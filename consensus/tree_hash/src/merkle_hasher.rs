use crate::{ChunkHasher, Error, Hash256, Sha256Hasher, BYTES_PER_CHUNK};
use smallvec::SmallVec;

type Chunk = [u8; BYTES_PER_CHUNK];

/// Computes the root of a fixed-height Merkle tree from a stream of bytes, without holding more
/// than one node per level in memory.
///
/// Written bytes are cut into 32-byte leaves (the final leaf is zero-padded). Leaves which are
/// never written are taken to be `[0; 32]`, so an incomplete tree is finished using the hasher's
/// zero hashes rather than by hashing padding.
///
/// ## Frontier
///
/// After `n` leaves have been written, `frontier[h]` holds the root of a complete, finished
/// subtree of height `h` if and only if bit `h` of `n` is set. Those subtrees are the left
/// siblings still waiting for their right half. Writing a leaf works like incrementing a binary
/// counter: each set bit it carries through hashes a stored left node with the incoming node and
/// clears that level.
///
/// For example, with a height of two after three leaves (`0b11`):
///
/// ```ignore
///           -
///          / \
///        h01  -          frontier[1] = h01
///        / \ / \
///       L0 L1 L2 -       frontier[0] = L2
/// ```
pub struct MerkleHasher<H = Sha256Hasher> {
    /// Pending left nodes, indexed by height above the leaves.
    ///
    /// Inline capacity covers trees of up to 256 leaves.
    frontier: SmallVec<[Option<Chunk>; 8]>,
    /// Levels between the leaves and the root.
    height: usize,
    /// Number of leaves written so far.
    leaves: usize,
    /// Bytes that do not yet fill a leaf.
    partial: SmallVec<[u8; BYTES_PER_CHUNK]>,
    /// Set once the final leaf of a full tree has been written.
    root: Option<Hash256>,
    hasher: H,
}

impl MerkleHasher<Sha256Hasher> {
    /// A SHA-256 hasher for a tree of at least `num_leaves` leaves.
    ///
    /// See `with_leaves_and_hasher`.
    pub fn with_leaves(num_leaves: usize) -> Self {
        Self::with_leaves_and_hasher(num_leaves, Sha256Hasher)
    }
}

impl<H: ChunkHasher> MerkleHasher<H> {
    /// A hasher for a tree of `num_leaves` leaves, rounded up to the next power of two.
    ///
    /// A `num_leaves` of zero or one gives a tree with a single leaf, whose root is that leaf (or
    /// `[0; 32]` when nothing is written).
    pub fn with_leaves_and_hasher(num_leaves: usize, hasher: H) -> Self {
        let height = num_leaves.next_power_of_two().trailing_zeros() as usize;
        Self::with_height(height, hasher)
    }

    fn with_height(height: usize, hasher: H) -> Self {
        Self {
            frontier: SmallVec::from_elem(None, height),
            height,
            leaves: 0,
            partial: SmallVec::new(),
            root: None,
            hasher,
        }
    }

    /// The number of leaves the tree holds, including those not yet written.
    pub fn capacity(&self) -> usize {
        1 << self.height
    }

    /// Appends `bytes` to the leaves of the tree.
    ///
    /// ## Errors
    ///
    /// Returns `MaximumLeavesExceeded` if `bytes` completes more leaves than the tree has room
    /// for. Bytes written before the error are kept.
    pub fn write(&mut self, mut bytes: &[u8]) -> Result<(), Error> {
        if !self.partial.is_empty() {
            let take = std::cmp::min(BYTES_PER_CHUNK - self.partial.len(), bytes.len());
            self.partial.extend_from_slice(&bytes[..take]);
            bytes = &bytes[take..];

            if self.partial.len() < BYTES_PER_CHUNK {
                return Ok(());
            }

            let mut leaf = [0; BYTES_PER_CHUNK];
            leaf.copy_from_slice(&self.partial);
            self.partial.clear();
            self.push_leaf(leaf)?;
        }

        let mut chunks = bytes.chunks_exact(BYTES_PER_CHUNK);
        for chunk in &mut chunks {
            let mut leaf = [0; BYTES_PER_CHUNK];
            leaf.copy_from_slice(chunk);
            self.push_leaf(leaf)?;
        }
        self.partial.extend_from_slice(chunks.remainder());

        Ok(())
    }

    fn push_leaf(&mut self, leaf: Chunk) -> Result<(), Error> {
        if self.leaves >= self.capacity() {
            return Err(Error::MaximumLeavesExceeded {
                max_leaves: self.capacity(),
            });
        }

        let mut node = leaf;
        let mut stored = false;
        for h in 0..self.height {
            match self.frontier[h].take() {
                Some(left) => node = self.hasher.hash_concat(&left, &node),
                None => {
                    self.frontier[h] = Some(node);
                    stored = true;
                    break;
                }
            }
        }

        // Carrying past the top level means the tree is now full.
        if !stored {
            self.root = Some(Hash256::from(node));
        }
        self.leaves += 1;

        Ok(())
    }

    /// Returns the root of the tree, treating every leaf not written as `[0; 32]`.
    ///
    /// ## Errors
    ///
    /// Returns `MaximumLeavesExceeded` if the buffered partial leaf does not fit in the tree.
    pub fn finish(mut self) -> Result<Hash256, Error> {
        if !self.partial.is_empty() {
            let mut leaf = [0; BYTES_PER_CHUNK];
            leaf[..self.partial.len()].copy_from_slice(&self.partial);
            self.push_leaf(leaf)?;
        }

        if let Some(root) = self.root {
            return Ok(root);
        }

        // Climb from the leaves, pairing each pending left node with the subtree to its right
        // (or with zeros where nothing was written).
        let mut node: Option<Chunk> = None;
        for h in 0..self.height {
            let zero = self.hasher.zero_hash(h);
            node = match (self.frontier[h].take(), node) {
                (Some(left), Some(right)) => Some(self.hasher.hash_concat(&left, &right)),
                (Some(left), None) => Some(self.hasher.hash_concat(&left, zero.as_bytes())),
                (None, Some(left)) => Some(self.hasher.hash_concat(&left, zero.as_bytes())),
                (None, None) => None,
            };
        }

        Ok(node.map_or_else(|| self.hasher.zero_hash(self.height), Hash256::from))
    }
}
