//! Compact proofs: placeholder side nodes are replaced by set bits in a bit mask.
//!
//! Most side nodes of a proof from a sparse tree sit on the long, mostly empty stretch between the
//! populated top of the tree and the leaf, so they are placeholders. Compaction drops them from
//! the side node list and records their positions instead.

use super::{verify_proof, ProofError, SparseMerkleProof};
use crate::{hasher::BinaryHash, spec::TreeSpec, trie::Node};
use alloc::{vec, vec::Vec};
use bitvec::prelude::*;

/// A [`SparseMerkleProof`] with placeholder side nodes elided.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(
    feature = "borsh",
    derive(borsh::BorshDeserialize, borsh::BorshSerialize)
)]
pub struct CompactProof {
    /// The side nodes of the original proof which are not placeholders, in their original order.
    pub side_nodes: Vec<Node>,
    /// Passed through unchanged from the original proof.
    pub non_membership_leaf_data: Vec<u8>,
    /// Bit `i`, most significant bit first, is set iff the original side node `i` was a
    /// placeholder. Exactly `ceil(num_side_nodes / 8)` bytes; bits past `num_side_nodes` are
    /// zero.
    pub bit_mask: Vec<u8>,
    /// The number of side nodes in the original proof.
    pub num_side_nodes: usize,
    /// Passed through unchanged from the original proof.
    pub sibling_data: Vec<u8>,
}

impl CompactProof {
    /// Check the fields specific to compact proofs.
    ///
    /// The leaf and sibling data are checked once the proof is decompacted.
    pub fn sanity_check<H: BinaryHash>(&self, spec: &TreeSpec<H>) -> Result<(), ProofError> {
        if self.num_side_nodes > spec.depth() {
            return Err(ProofError::TooManySideNodes);
        }

        if self.bit_mask.len() != self.num_side_nodes.div_ceil(8) {
            return Err(ProofError::BadBitMask);
        }

        let bits = self.bit_mask.view_bits::<Msb0>();
        if bits[self.num_side_nodes..].any() {
            return Err(ProofError::BadBitMask);
        }

        let placeholders = bits[..self.num_side_nodes].count_ones();
        if self.side_nodes.len() != self.num_side_nodes - placeholders {
            return Err(ProofError::SideNodeCountMismatch);
        }

        if self
            .side_nodes
            .iter()
            .any(|node| node.len() != spec.hash_size())
        {
            return Err(ProofError::BadSideNodeSize);
        }

        Ok(())
    }
}

/// Compact a proof. Fails if the proof is not well-formed.
pub fn compact<H: BinaryHash>(
    proof: &SparseMerkleProof,
    spec: &TreeSpec<H>,
) -> Result<CompactProof, ProofError> {
    proof.sanity_check(spec)?;

    let hasher = spec.hasher();
    let num_side_nodes = proof.side_nodes.len();
    let mut bit_mask = vec![0u8; num_side_nodes.div_ceil(8)];
    let mut side_nodes = Vec::new();
    {
        let bits = bit_mask.view_bits_mut::<Msb0>();
        for (i, node) in proof.side_nodes.iter().enumerate() {
            if hasher.is_placeholder(node) {
                bits.set(i, true);
            } else {
                side_nodes.push(node.clone());
            }
        }
    }

    Ok(CompactProof {
        side_nodes,
        non_membership_leaf_data: proof.non_membership_leaf_data.clone(),
        bit_mask,
        num_side_nodes,
        sibling_data: proof.sibling_data.clone(),
    })
}

/// Expand a compact proof back into the original proof. Fails if the result would not be
/// well-formed.
pub fn decompact<H: BinaryHash>(
    proof: &CompactProof,
    spec: &TreeSpec<H>,
) -> Result<SparseMerkleProof, ProofError> {
    proof.sanity_check(spec)?;

    let bits = proof.bit_mask.view_bits::<Msb0>();
    let mut literals = proof.side_nodes.iter();
    let mut side_nodes = Vec::with_capacity(proof.num_side_nodes);
    for placeholder in bits[..proof.num_side_nodes].iter().by_vals() {
        if placeholder {
            side_nodes.push(spec.placeholder().to_vec());
        } else {
            // the sanity check guarantees one literal per unset bit.
            let Some(node) = literals.next() else {
                return Err(ProofError::SideNodeCountMismatch);
            };
            side_nodes.push(node.clone());
        }
    }

    let decompacted = SparseMerkleProof {
        side_nodes,
        non_membership_leaf_data: proof.non_membership_leaf_data.clone(),
        sibling_data: proof.sibling_data.clone(),
    };
    decompacted.sanity_check(spec)?;
    Ok(decompacted)
}

/// Verify a compact proof. A compact proof which cannot be decompacted does not verify.
pub fn verify_compact_proof<H: BinaryHash>(
    proof: &CompactProof,
    root: &[u8],
    key: &[u8],
    value: &[u8],
    spec: &TreeSpec<H>,
) -> bool {
    match decompact(proof, spec) {
        Ok(proof) => verify_proof(&proof, root, key, value, spec),
        Err(_) => false,
    }
}
