//! Generating proofs for single keys.

use crate::{
    cursor::{record_path, NodeReader, Terminal},
    hasher::BinaryHash,
    proof::SparseMerkleProof,
    spec::TreeSpec,
    trie::NodeError,
};
use alloc::vec::Vec;

/// Prove the value, or absence of value, of the key with the given path.
///
/// The proof is a membership proof if the lookup ends at a leaf holding `path`, and a
/// non-membership proof otherwise. If the lookup ends at a leaf holding a different path, that
/// leaf's preimage is attached as evidence. The preimage of the first side node is attached
/// whenever that side node is not a placeholder.
pub fn prove<H: BinaryHash, R: NodeReader>(
    spec: &TreeSpec<H>,
    reader: &R,
    root: &[u8],
    path: &[u8],
) -> Result<SparseMerkleProof, R::Error> {
    let record = record_path(spec, reader, root, path)?;

    let non_membership_leaf_data = match record.terminal {
        Terminal::Leaf { data, preimage, .. } if data.key_path != path => preimage,
        _ => Vec::new(),
    };

    let sibling_data = match record.side_nodes.first() {
        Some(node) if !spec.hasher().is_placeholder(node) => reader
            .read_node(node)?
            .ok_or_else(|| NodeError::Missing(node.clone()))?,
        _ => Vec::new(),
    };

    Ok(SparseMerkleProof {
        side_nodes: record.side_nodes,
        non_membership_leaf_data,
        sibling_data,
    })
}
