//! Tree proofs and proof verification.
//!
//! The sparse merkle tree is an authenticated data structure, which means that it permits
//! efficient proving against the root. This module exposes types and functions necessary for
//! handling these kinds of proofs.
//!
//! A [`SparseMerkleProof`] proves either that a key has a given value (membership) or that it has
//! no value (non-membership). A [`CompactProof`] is the same proof with placeholder side nodes
//! replaced by a bitmask.
//!
//! [`verify_proof`] reports a plain `bool` and does not distinguish a malformed proof from a
//! well-formed proof of something false. [`compact`] and [`decompact`] report a [`ProofError`].

pub use compact::{compact, decompact, verify_compact_proof, CompactProof};

mod compact;

use crate::{
    hasher::{BinaryHash, LEAF_PREFIX},
    key_path::{bit_at, shares_prefix},
    spec::TreeSpec,
    trie::{Node, DEFAULT_VALUE},
};
use alloc::vec::Vec;
use core::fmt;

/// A proof of the value, or absence of value, of a single key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(
    feature = "borsh",
    derive(borsh::BorshDeserialize, borsh::BorshSerialize)
)]
pub struct SparseMerkleProof {
    /// Sibling hashes along the lookup path, ordered from the terminal node up to just below the
    /// root. Placeholder siblings are included.
    pub side_nodes: Vec<Node>,
    /// The preimage of a leaf holding a different key, found where the proven key's lookup ends.
    /// Empty for membership proofs and for non-membership proofs ending at a placeholder.
    pub non_membership_leaf_data: Vec<u8>,
    /// The preimage of `side_nodes[0]`, if any. Lets the holder of the proof rebuild the tree
    /// around the proven key without any further data.
    pub sibling_data: Vec<u8>,
}

/// Errors in the structure of a proof.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProofError {
    /// More side nodes than the tree has levels.
    TooManySideNodes,
    /// A side node is not exactly one hash long.
    BadSideNodeSize,
    /// The non-membership leaf data is not a leaf preimage.
    BadLeafDataSize,
    /// The sibling data is not the preimage of the first side node.
    BadSiblingData,
    /// The bit mask of a compact proof has the wrong length or stray bits.
    BadBitMask,
    /// A compact proof carries a different number of side nodes than its bit mask describes.
    SideNodeCountMismatch,
    /// A branch proof does not verify against the root it is being added to.
    InvalidBranch,
}

impl fmt::Display for ProofError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            ProofError::TooManySideNodes => "more side nodes than tree levels",
            ProofError::BadSideNodeSize => "side node of unexpected size",
            ProofError::BadLeafDataSize => "non-membership leaf data is not a leaf preimage",
            ProofError::BadSiblingData => "sibling data does not match the first side node",
            ProofError::BadBitMask => "bit mask does not match the side node count",
            ProofError::SideNodeCountMismatch => "side node count does not match the bit mask",
            ProofError::InvalidBranch => "proof does not verify against the root",
        };
        f.write_str(msg)
    }
}

#[cfg(feature = "std")]
impl std::error::Error for ProofError {}

impl SparseMerkleProof {
    /// Check that the proof is structurally well-formed for trees described by `spec`.
    ///
    /// A proof passing this check can be folded without any out-of-range access.
    pub fn sanity_check<H: BinaryHash>(&self, spec: &TreeSpec<H>) -> Result<(), ProofError> {
        let hasher = spec.hasher();

        if self.side_nodes.len() > spec.depth() {
            return Err(ProofError::TooManySideNodes);
        }

        if self
            .side_nodes
            .iter()
            .any(|node| node.len() != spec.hash_size())
        {
            return Err(ProofError::BadSideNodeSize);
        }

        if !self.non_membership_leaf_data.is_empty()
            && (self.non_membership_leaf_data.len() != hasher.node_size()
                || self.non_membership_leaf_data[0] != LEAF_PREFIX)
        {
            return Err(ProofError::BadLeafDataSize);
        }

        if !self.sibling_data.is_empty() {
            let Some(first) = self.side_nodes.first() else {
                return Err(ProofError::BadSiblingData);
            };
            if self.sibling_data.len() != hasher.node_size()
                || hasher.digest(&self.sibling_data) != *first
            {
                return Err(ProofError::BadSiblingData);
            }
        }

        Ok(())
    }

    /// Verify this proof. See [`verify_proof`].
    pub fn verify<H: BinaryHash>(
        &self,
        spec: &TreeSpec<H>,
        root: &[u8],
        key: &[u8],
        value: &[u8],
    ) -> bool {
        verify_proof(self, root, key, value, spec)
    }
}

/// Verify that, under `root`, `key` maps to `value`.
///
/// Passing [`DEFAULT_VALUE`] as the value verifies that `key` has no value. Returns `false` for
/// malformed proofs as well as for proofs of a different statement.
pub fn verify_proof<H: BinaryHash>(
    proof: &SparseMerkleProof,
    root: &[u8],
    key: &[u8],
    value: &[u8],
    spec: &TreeSpec<H>,
) -> bool {
    verify_proof_with_updates(proof, root, key, value, spec).is_some()
}

/// Verify a proof like [`verify_proof`], returning every node recomputed along the way.
///
/// On success, the result holds `(hash, preimage)` pairs ordered from the terminal leaf (if there
/// is one) up to the root. These are exactly the nodes needed to walk the proven path.
pub fn verify_proof_with_updates<H: BinaryHash>(
    proof: &SparseMerkleProof,
    root: &[u8],
    key: &[u8],
    value: &[u8],
    spec: &TreeSpec<H>,
) -> Option<Vec<(Node, Vec<u8>)>> {
    proof.sanity_check(spec).ok()?;

    let hasher = spec.hasher();
    let path = spec.path(key);
    let depth = proof.side_nodes.len();
    let mut updates = Vec::new();

    let mut current = if value == DEFAULT_VALUE {
        if proof.non_membership_leaf_data.is_empty() {
            hasher.placeholder().to_vec()
        } else {
            let (actual_path, _) = hasher.parse_leaf(&proof.non_membership_leaf_data);
            // the leaf must hold another key, and must lie on the proven key's path.
            if actual_path == &path[..] || !shares_prefix(actual_path, &path, depth) {
                return None;
            }
            let hash = hasher.digest(&proof.non_membership_leaf_data);
            updates.push((hash.clone(), proof.non_membership_leaf_data.clone()));
            hash
        }
    } else {
        if !proof.non_membership_leaf_data.is_empty() {
            return None;
        }
        let (hash, preimage) = hasher.digest_leaf(&path, &spec.digest_value(value));
        updates.push((hash.clone(), preimage));
        hash
    };

    for (i, side_node) in proof.side_nodes.iter().enumerate() {
        let (hash, preimage) = if bit_at(&path, depth - 1 - i) {
            hasher.digest_inner(side_node, &current)
        } else {
            hasher.digest_inner(&current, side_node)
        };
        updates.push((hash.clone(), preimage));
        current = hash;
    }

    if current == root {
        Some(updates)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::{verify_proof, verify_proof_with_updates, ProofError, SparseMerkleProof};
    use crate::{
        hasher::{Blake3Hasher, Sha2Hasher},
        spec::TreeSpec,
        trie::DEFAULT_VALUE,
    };
    use alloc::vec;

    #[test]
    fn empty_tree_proves_absence() {
        let spec = TreeSpec::<Sha2Hasher>::new();
        let proof = SparseMerkleProof::default();
        assert!(verify_proof(&proof, spec.placeholder(), b"k", DEFAULT_VALUE, &spec));
        assert!(!verify_proof(&proof, spec.placeholder(), b"k", b"v", &spec));
    }

    #[test]
    fn single_leaf_root_proves_membership() {
        let spec = TreeSpec::<Blake3Hasher>::new();
        let (root, _) = spec
            .hasher()
            .digest_leaf(&spec.path(b"k"), &spec.digest_value(b"v"));
        let proof = SparseMerkleProof::default();

        assert!(proof.verify(&spec, &root, b"k", b"v"));
        assert!(!proof.verify(&spec, &root, b"k", b"w"));
        assert!(!proof.verify(&spec, &root, b"k", DEFAULT_VALUE));

        let updates = verify_proof_with_updates(&proof, &root, b"k", b"v", &spec).unwrap();
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].0, root);
    }

    #[test]
    fn leaf_data_for_other_key_proves_absence() {
        let spec = TreeSpec::<Blake3Hasher>::new();
        let (root, preimage) = spec
            .hasher()
            .digest_leaf(&spec.path(b"present"), &spec.digest_value(b"v"));
        let proof = SparseMerkleProof {
            non_membership_leaf_data: preimage.clone(),
            ..Default::default()
        };

        assert!(proof.verify(&spec, &root, b"absent", DEFAULT_VALUE));
        // the leaf's own key is not absent.
        assert!(!proof.verify(&spec, &root, b"present", DEFAULT_VALUE));
        // leaf data contradicts any membership claim.
        assert!(!proof.verify(&spec, &root, b"present", b"v"));
    }

    #[test]
    fn sanity_check_cases() {
        let spec = TreeSpec::<Sha2Hasher>::new();
        let node = vec![1u8; 32];

        let proof = SparseMerkleProof {
            side_nodes: vec![node.clone(); 257],
            ..Default::default()
        };
        assert_eq!(proof.sanity_check(&spec), Err(ProofError::TooManySideNodes));

        let proof = SparseMerkleProof {
            side_nodes: vec![node.clone(), vec![1u8; 31]],
            ..Default::default()
        };
        assert_eq!(proof.sanity_check(&spec), Err(ProofError::BadSideNodeSize));

        let proof = SparseMerkleProof {
            side_nodes: vec![node.clone()],
            non_membership_leaf_data: vec![0u8; 64],
            ..Default::default()
        };
        assert_eq!(proof.sanity_check(&spec), Err(ProofError::BadLeafDataSize));

        // right size, but an inner node preimage.
        let (_, inner) = spec.hasher().digest_inner(&node, &node);
        let proof = SparseMerkleProof {
            side_nodes: vec![node.clone()],
            non_membership_leaf_data: inner.clone(),
            ..Default::default()
        };
        assert_eq!(proof.sanity_check(&spec), Err(ProofError::BadLeafDataSize));

        let proof = SparseMerkleProof {
            side_nodes: vec![node.clone()],
            sibling_data: inner.clone(),
            ..Default::default()
        };
        assert_eq!(proof.sanity_check(&spec), Err(ProofError::BadSiblingData));

        let proof = SparseMerkleProof {
            sibling_data: inner.clone(),
            ..Default::default()
        };
        assert_eq!(proof.sanity_check(&spec), Err(ProofError::BadSiblingData));

        let proof = SparseMerkleProof {
            side_nodes: vec![spec.hasher().digest(&inner), node],
            sibling_data: inner,
            ..Default::default()
        };
        assert_eq!(proof.sanity_check(&spec), Ok(()));
    }

    #[test]
    fn malformed_proof_never_verifies() {
        let spec = TreeSpec::<Sha2Hasher>::new();
        let proof = SparseMerkleProof {
            side_nodes: vec![vec![0u8; 3]],
            ..Default::default()
        };
        assert!(!verify_proof(&proof, spec.placeholder(), b"k", DEFAULT_VALUE, &spec));
    }
}
