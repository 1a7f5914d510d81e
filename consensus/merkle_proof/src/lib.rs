use ethereum_hashing::{hash32_concat, ZERO_HASHES, ZERO_HASHES_MAX_INDEX};
use ethereum_types::H256;

/// The deepest tree that can be built; matches the deepest list limit a descriptor may declare.
pub const MAX_TREE_DEPTH: usize = 48;

#[derive(Debug, PartialEq, Clone)]
pub enum MerkleTreeError {
    /// Trying to build a tree of `depth` from more than `2^depth` leaves.
    LeavesExceedDepth { leaves: usize, depth: usize },
    /// Trying to build a tree deeper than `MAX_TREE_DEPTH`.
    DepthTooLarge(usize),
    /// The requested leaf is outside the tree.
    InvalidIndex { index: usize, depth: usize },
}

/// Right-sparse Merkle tree of fixed depth.
///
/// Only the nodes above populated leaves are stored: `layers[h]` holds the first
/// `ceil(leaves / 2^h)` nodes at height `h`, and every node to their right is the zero hash for
/// that height. A list with a limit of `2^40` and a handful of elements therefore costs a few
/// nodes per level.
#[derive(Debug, PartialEq, Clone)]
pub struct MerkleTree {
    layers: Vec<Vec<H256>>,
    depth: usize,
}

impl MerkleTree {
    /// Create a new Merkle tree from a list of leaves and a fixed depth.
    pub fn create(leaves: &[H256], depth: usize) -> Result<Self, MerkleTreeError> {
        if depth > MAX_TREE_DEPTH {
            return Err(MerkleTreeError::DepthTooLarge(depth));
        }
        if leaves.len() > capacity(depth) {
            return Err(MerkleTreeError::LeavesExceedDepth {
                leaves: leaves.len(),
                depth,
            });
        }

        let mut layers = Vec::with_capacity(depth + 1);
        layers.push(leaves.to_vec());

        for height in 0..depth {
            let below = &layers[height];
            let layer = below
                .chunks(2)
                .map(|pair| {
                    let right = pair.get(1).copied().unwrap_or_else(|| zero_hash(height));
                    hash_concat(pair[0], right)
                })
                .collect();
            layers.push(layer);
        }

        Ok(Self { layers, depth })
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    /// The number of populated leaves.
    pub fn len(&self) -> usize {
        self.layers[0].len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Retrieve the root hash of this Merkle tree.
    pub fn hash(&self) -> H256 {
        self.node(self.depth, 0)
    }

    /// Returns the node at `position` within the layer at `height`, which is the zero hash
    /// beyond the populated nodes.
    fn node(&self, height: usize, position: usize) -> H256 {
        self.layers[height]
            .get(position)
            .copied()
            .unwrap_or_else(|| zero_hash(height))
    }

    /// Return the leaf at `index` and a Merkle proof of its inclusion.
    ///
    /// The proof is in bottom-up order and has exactly `self.depth()` nodes. The leaf of an index
    /// beyond the populated leaves (but within the tree) is the zero hash.
    pub fn generate_proof(&self, index: usize) -> Result<(H256, Vec<H256>), MerkleTreeError> {
        if index >= capacity(self.depth) {
            return Err(MerkleTreeError::InvalidIndex {
                index,
                depth: self.depth,
            });
        }

        let branch = (0..self.depth)
            .map(|height| self.node(height, shr(index, height) ^ 1))
            .collect();

        Ok((self.node(0, index), branch))
    }
}

/// The number of leaves in a full tree of `depth`, saturating on platforms where it overflows.
fn capacity(depth: usize) -> usize {
    1usize.checked_shl(depth as u32).unwrap_or(usize::MAX)
}

fn shr(index: usize, bits: usize) -> usize {
    index.checked_shr(bits as u32).unwrap_or(0)
}

/// The root of a tree of `height` with all-zero leaves.
fn zero_hash(height: usize) -> H256 {
    debug_assert!(height <= ZERO_HASHES_MAX_INDEX);
    H256::from_slice(&ZERO_HASHES[height])
}

/// Verify a proof that `leaf` exists at `index` in a Merkle tree rooted at `root`.
///
/// `branch` holds the sibling of each node on the path from `leaf` to `root`, bottom-up. It must
/// have exactly `depth` nodes.
pub fn verify_merkle_proof(
    leaf: H256,
    branch: &[H256],
    depth: usize,
    index: usize,
    root: H256,
) -> bool {
    branch.len() == depth && merkle_root_from_branch(leaf, branch, depth, index) == root
}

/// Compute a root hash from a leaf and a Merkle proof.
///
/// Only the first `depth` nodes of `branch` are used. Bit `i` of `index` gives the side of the
/// path at height `i` (set means the path node is the right child).
pub fn merkle_root_from_branch(leaf: H256, branch: &[H256], depth: usize, index: usize) -> H256 {
    branch
        .iter()
        .take(depth)
        .enumerate()
        .fold(leaf, |node, (height, sibling)| {
            if shr(index, height) & 1 == 1 {
                hash_concat(*sibling, node)
            } else {
                hash_concat(node, *sibling)
            }
        })
}

fn hash_concat(left: H256, right: H256) -> H256 {
    H256::from(hash32_concat(left.as_bytes(), right.as_bytes()))
}
