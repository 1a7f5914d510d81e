use crate::{Error, Hash256};
use merkle_proof::{verify_merkle_proof, MerkleTree};
use ssz::{PathSegment, SszType, Value};
use tree_hash::{length_chunk, merkle_leaves, mixes_in_length, tree_depth, BYTES_PER_CHUNK};

/// A Merkle inclusion proof of some node within a record's tree.
///
/// `branch` is in bottom-up order and `index` is the position of `leaf` amongst the `2^depth`
/// nodes at the bottom of the proof. The length mix-in of each list traversed is included, so
/// the proof verifies against the record's `hash_tree_root`.
#[derive(Debug, Clone, PartialEq)]
pub struct Proof {
    pub leaf: Hash256,
    pub branch: Vec<Hash256>,
    pub depth: usize,
    pub index: u64,
}

impl Proof {
    /// Returns `true` if this proof shows `self.leaf` is included in the tree with the given
    /// `root`.
    pub fn verify(&self, root: Hash256) -> bool {
        // The `merkle_proof` crate indexes with `usize`.
        match usize::try_from(self.index) {
            Ok(index) => verify_merkle_proof(self.leaf, &self.branch, self.depth, index, root),
            Err(_) => false,
        }
    }

    /// The generalized index of the proven node (i.e., `2^depth + index`), if it fits in a
    /// `u64`.
    pub fn generalized_index(&self) -> Option<u64> {
        if self.depth < 64 {
            Some((1 << self.depth) | self.index)
        } else {
            None
        }
    }
}

/// A child node which has its own subtree (i.e., is not packed into a chunk).
type Child<'a> = Option<(&'a Value, &'a SszType)>;

/// One level of a proof: the sibling hashes between a child and its parent's root.
struct Step {
    branch: Vec<Hash256>,
    depth: usize,
    index: usize,
}

/// Produces a proof for the node of `value` found by following `path` from the root.
///
/// Each segment names a container field or a vector/list element. An index into a vector or
/// list of basic values resolves to the 32-byte chunk holding that element, and must be the
/// last segment of the path.
pub fn generate_proof(value: &Value, ty: &SszType, path: &[PathSegment]) -> Result<Proof, Error> {
    let mut steps = Vec::with_capacity(path.len());
    let mut node = (value, ty);
    let mut leaf = None;

    for (i, segment) in path.iter().enumerate() {
        let (value, ty) = node;
        let (child_index, child) = locate_child(value, ty, segment)?;

        let leaves = merkle_leaves(value, ty)?;
        let depth = tree_depth(ty);
        let tree = MerkleTree::create(&leaves, depth)?;
        let (node_leaf, mut branch) = tree.generate_proof(child_index)?;

        let mut step_depth = depth;
        if mixes_in_length(ty) {
            // The data root is the left child of the list root; its sibling is the length.
            let len = value.as_slice().map_or(0, <[Value]>::len);
            branch.push(Hash256::from(length_chunk(len)));
            step_depth += 1;
        }

        steps.push(Step {
            branch,
            depth: step_depth,
            index: child_index,
        });

        match child {
            Some(child) => node = child,
            None if i + 1 == path.len() => leaf = Some(node_leaf),
            None => {
                return Err(Error::InvalidPath(format!(
                    "cannot descend into a packed element at segment {}",
                    segment
                )))
            }
        }
    }

    let leaf = match leaf {
        Some(leaf) => leaf,
        None => tree_hash::hash_tree_root(node.0, node.1)?,
    };

    // Assemble the per-level branches bottom-up, with the deepest level in the lowest bits of
    // the index.
    let mut proof = Proof {
        leaf,
        branch: vec![],
        depth: 0,
        index: 0,
    };
    for step in steps.into_iter().rev() {
        let shifted = (step.index as u64)
            .checked_shl(proof.depth as u32)
            .filter(|_| proof.depth + step.depth < 64)
            .ok_or(Error::ProofTooDeep {
                depth: proof.depth + step.depth,
            })?;
        proof.index |= shifted;
        proof.depth += step.depth;
        proof.branch.extend(step.branch);
    }

    Ok(proof)
}

/// Returns the leaf index of the child of `value` named by `segment` and, unless the child is
/// packed into a chunk with its siblings, the child itself.
fn locate_child<'a>(
    value: &'a Value,
    ty: &'a SszType,
    segment: &PathSegment,
) -> Result<(usize, Child<'a>), Error> {
    match (ty, segment) {
        (SszType::Container(container), PathSegment::Field(name)) => {
            let i = container
                .field_index(name)
                .ok_or_else(|| Error::UnknownField {
                    container: container.name().to_string(),
                    field: name.clone(),
                })?;
            let child = value
                .as_slice()
                .and_then(|fields| fields.get(i))
                .ok_or_else(|| Error::InvalidPath(format!("{} is not a container value", name)))?;
            Ok((i, Some((child, container.fields()[i].ty()))))
        }
        (SszType::Vector(vector), PathSegment::Index(i)) => element(value, vector.elem(), *i),
        (SszType::List(list), PathSegment::Index(i)) => element(value, list.elem(), *i),
        _ => Err(Error::InvalidPath(format!(
            "segment {} does not apply to a {}",
            segment,
            ty.kind_name()
        ))),
    }
}

fn element<'a>(value: &'a Value, elem: &'a SszType, i: usize) -> Result<(usize, Child<'a>), Error> {
    let values = value
        .as_slice()
        .ok_or_else(|| Error::InvalidPath(format!("[{}] is not a sequence value", i)))?;
    let child = values.get(i).ok_or(Error::IndexOutOfBounds {
        index: i,
        len: values.len(),
    })?;

    if elem.is_basic() {
        Ok((i * elem.ssz_fixed_len() / BYTES_PER_CHUNK, None))
    } else {
        Ok((i, Some((child, elem))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tree_hash::hash_tree_root;

    fn field(name: &str) -> PathSegment {
        PathSegment::Field(name.to_string())
    }

    fn registry() -> (Value, SszType) {
        let pair = SszType::container(
            "Pair",
            vec![("a", SszType::U64), ("b", SszType::ByteVector(32))],
        )
        .unwrap();
        let ty = SszType::container(
            "Registry",
            vec![
                ("pairs", SszType::list(pair, 1 << 20).unwrap()),
                ("balances", SszType::list(SszType::U64, 1 << 20).unwrap()),
            ],
        )
        .unwrap();
        let value = Value::Container(vec![
            Value::List(
                (0..5)
                    .map(|i| {
                        Value::Container(vec![Value::Uint(i), Value::bytes(vec![i as u8; 32])])
                    })
                    .collect(),
            ),
            Value::List((0..9).map(Value::Uint).collect()),
        ]);
        (value, ty)
    }

    #[test]
    fn empty_path_proves_root() {
        let (value, ty) = registry();
        let proof = generate_proof(&value, &ty, &[]).unwrap();
        let root = hash_tree_root(&value, &ty).unwrap();
        assert_eq!(proof.leaf, root);
        assert!(proof.branch.is_empty());
        assert!(proof.verify(root));
        assert_eq!(proof.generalized_index(), Some(1));
    }

    #[test]
    fn nested_field_proof() {
        let (value, ty) = registry();
        let root = hash_tree_root(&value, &ty).unwrap();
        let path = [field("pairs"), PathSegment::Index(3), field("b")];
        let proof = generate_proof(&value, &ty, &path).unwrap();

        assert_eq!(proof.leaf, Hash256::from([3; 32]));
        // Pair (1) + list of 2^20 (20 + 1 for the length) + registry (1).
        assert_eq!(proof.depth, 23);
        assert_eq!(proof.index, (0 << 22) | (3 << 1) | 1);
        assert!(proof.verify(root));
        assert!(!proof.verify(Hash256::zero()));
    }

    #[test]
    fn packed_element_proof() {
        let (value, ty) = registry();
        let root = hash_tree_root(&value, &ty).unwrap();
        let proof = generate_proof(&value, &ty, &[field("balances"), PathSegment::Index(6)])
            .unwrap();

        // Elements 4..8 share the second chunk.
        let mut chunk = [0; 32];
        for (j, i) in (4..8u64).enumerate() {
            chunk[j * 8..(j + 1) * 8].copy_from_slice(&i.to_le_bytes());
        }
        assert_eq!(proof.leaf, Hash256::from(chunk));
        assert!(proof.verify(root));
    }

    #[test]
    fn invalid_paths() {
        let (value, ty) = registry();
        assert_eq!(
            generate_proof(&value, &ty, &[field("nope")]),
            Err(Error::UnknownField {
                container: "Registry".to_string(),
                field: "nope".to_string()
            })
        );
        assert_eq!(
            generate_proof(&value, &ty, &[field("pairs"), PathSegment::Index(5)]),
            Err(Error::IndexOutOfBounds { index: 5, len: 5 })
        );
        assert!(matches!(
            generate_proof(
                &value,
                &ty,
                &[field("balances"), PathSegment::Index(0), field("x")]
            ),
            Err(Error::InvalidPath(_))
        ));
        assert!(matches!(
            generate_proof(&value, &ty, &[PathSegment::Index(0)]),
            Err(Error::InvalidPath(_))
        ));
    }
}
