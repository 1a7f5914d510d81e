use crate::merkleize::mixed_in_length;
use crate::{
    merkle_leaves_with, mix_in_length_with, tree_depth, ChunkHasher, Error, Hash256, Sha256Hasher,
    BYTES_PER_CHUNK,
};
use ssz::{SszType, Value};

/// Sparse Merkle tree suitable for tree hashing vectors and lists.
///
/// Only nodes with at least one non-padding leaf beneath them are stored; everything to their
/// right is implied by the hasher's zero hashes.
#[derive(Debug, PartialEq, Clone, Default)]
pub struct TreeHashCache {
    initialized: bool,
    /// Depth is such that the tree has a capacity for 2^depth leaves
    depth: usize,
    /// Sparse layers.
    ///
    /// The leaves are contained in `self.layers[self.depth]`, and each other layer `i`
    /// contains the parents of the nodes in layer `i + 1`.
    layers: Vec<Vec<Hash256>>,
}

impl TreeHashCache {
    /// Create a new, empty cache for a tree with capacity for `2^depth` leaves.
    pub fn new(depth: usize) -> Self {
        TreeHashCache {
            initialized: false,
            depth,
            layers: vec![vec![]; depth + 1],
        }
    }

    /// Compute the updated Merkle root for the given `leaves`.
    pub fn recalculate_merkle_root(
        &mut self,
        leaves: impl Iterator<Item = [u8; BYTES_PER_CHUNK]> + ExactSizeIterator,
    ) -> Result<Hash256, Error> {
        self.recalculate_merkle_root_with(&Sha256Hasher, leaves)
    }

    pub fn recalculate_merkle_root_with<H: ChunkHasher>(
        &mut self,
        hasher: &H,
        leaves: impl Iterator<Item = [u8; BYTES_PER_CHUNK]> + ExactSizeIterator,
    ) -> Result<Hash256, Error> {
        let dirty_indices = self.update_leaves(leaves)?;
        self.update_merkle_root(hasher, dirty_indices)
    }

    /// Phase 1 of the algorithm: compute the indices of all dirty leaves.
    pub fn update_leaves(
        &mut self,
        mut leaves: impl Iterator<Item = [u8; BYTES_PER_CHUNK]> + ExactSizeIterator,
    ) -> Result<Vec<usize>, Error> {
        let new_leaf_count = leaves.len();
        let initialized = self.initialized;
        let depth = self.depth;
        let layer = self.layers.get_mut(depth).ok_or(Error::CacheInconsistent)?;

        if new_leaf_count < layer.len() {
            return Err(Error::CannotShrink);
        } else if depth < usize::BITS as usize && new_leaf_count > 1 << depth {
            return Err(Error::TooManyLeaves);
        }

        // Update the existing leaves
        let mut dirty = layer
            .iter_mut()
            .enumerate()
            .zip(&mut leaves)
            .flat_map(|((i, leaf), new_leaf)| {
                if leaf.as_bytes() != new_leaf || !initialized {
                    *leaf = Hash256::from(new_leaf);
                    Some(i)
                } else {
                    None
                }
            })
            .collect::<Vec<_>>();

        // Push the rest of the new leaves (if any)
        dirty.extend(layer.len()..new_leaf_count);
        layer.extend(leaves.map(Hash256::from));

        Ok(dirty)
    }

    /// Phase 2: propagate changes upwards from the leaves of the tree, and compute the root.
    ///
    /// Returns an error if `dirty_indices` is inconsistent with the cache.
    pub fn update_merkle_root<H: ChunkHasher>(
        &mut self,
        hasher: &H,
        mut dirty_indices: Vec<usize>,
    ) -> Result<Hash256, Error> {
        if dirty_indices.is_empty() {
            return Ok(self.root(hasher));
        }

        let mut depth = self.depth;

        while depth > 0 {
            let new_dirty_indices = lift_dirty(&dirty_indices);

            for &idx in &new_dirty_indices {
                let left_idx = 2 * idx;
                let right_idx = left_idx + 1;

                let left = *self.layers[depth]
                    .get(left_idx)
                    .ok_or(Error::CacheInconsistent)?;
                let right = self.layers[depth]
                    .get(right_idx)
                    .copied()
                    .unwrap_or_else(|| hasher.zero_hash(self.depth - depth));

                let new_hash = Hash256::from(hasher.hash_concat(left.as_bytes(), right.as_bytes()));

                let parent_layer = &mut self.layers[depth - 1];
                match parent_layer.get_mut(idx) {
                    Some(hash) => *hash = new_hash,
                    None => {
                        // Parent layer should already contain nodes for all non-dirty indices
                        if idx != parent_layer.len() {
                            return Err(Error::CacheInconsistent);
                        }
                        parent_layer.push(new_hash);
                    }
                }
            }

            dirty_indices = new_dirty_indices;
            depth -= 1;
        }

        self.initialized = true;

        Ok(self.root(hasher))
    }

    /// Get the root of this cache, without doing any updates/computation.
    pub fn root<H: ChunkHasher>(&self, hasher: &H) -> Hash256 {
        self.layers
            .first()
            .and_then(|layer| layer.first())
            .copied()
            .unwrap_or_else(|| hasher.zero_hash(self.depth))
    }

    pub fn leaves(&self) -> &[Hash256] {
        self.layers
            .get(self.depth)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Returns the approximate size of the cache in bytes.
    ///
    /// The size is approximate because we ignore some stack-allocated `u64` and `Vec` pointers.
    /// We focus instead on the lists of hashes, which should massively outweigh the items that we
    /// ignore.
    pub fn approx_mem_size(&self) -> usize {
        self.layers.iter().map(|layer| layer.len() * 32).sum()
    }
}

/// Compute the dirty indices for one layer up.
fn lift_dirty(dirty_indices: &[usize]) -> Vec<usize> {
    let mut new_dirty = dirty_indices.iter().map(|i| *i / 2).collect::<Vec<_>>();
    new_dirty.dedup();
    new_dirty
}

/// Incrementally computes the `hash_tree_root` of successive versions of one value.
///
/// Each call re-hashes the leaves of the value (i.e., the roots of its children) and then only
/// those interior nodes above leaves that changed. The result is always identical to
/// `hash_tree_root(value, ty)`.
///
/// Intended for large lists and vectors (e.g., a validator registry) where only a few elements
/// change between calls.
#[derive(Debug, Clone)]
pub struct CachedRoot {
    ty: SszType,
    cache: TreeHashCache,
}

impl CachedRoot {
    pub fn new(ty: SszType) -> Self {
        let cache = TreeHashCache::new(tree_depth(&ty));
        Self { ty, cache }
    }

    pub fn ty(&self) -> &SszType {
        &self.ty
    }

    pub fn recalculate(&mut self, value: &Value) -> Result<Hash256, Error> {
        self.recalculate_with(value, &Sha256Hasher)
    }

    /// Returns the root of `value`, updating the cache.
    ///
    /// A value with fewer leaves than the previous one (e.g., a list that has shrunk) causes the
    /// cache to be rebuilt from scratch.
    pub fn recalculate_with<H: ChunkHasher>(
        &mut self,
        value: &Value,
        hasher: &H,
    ) -> Result<Hash256, Error> {
        let leaves = merkle_leaves_with(value, &self.ty, hasher)?;

        if leaves.len() < self.cache.leaves().len() {
            self.cache = TreeHashCache::new(tree_depth(&self.ty));
        }

        let root = self
            .cache
            .recalculate_merkle_root_with(hasher, leaves.iter().map(|leaf| leaf.to_fixed_bytes()))?;

        match mixed_in_length(value, &self.ty) {
            Some(len) => Ok(mix_in_length_with(&root, len, hasher)),
            None => Ok(root),
        }
    }

    /// Returns the approximate size of the cache in bytes.
    pub fn approx_mem_size(&self) -> usize {
        self.cache.approx_mem_size()
    }
}
