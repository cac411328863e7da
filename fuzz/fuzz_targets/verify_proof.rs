#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use smt_core::{
    hasher::Blake3Hasher,
    proof::{
        compact, decompact, verify_compact_proof, verify_proof, CompactProof, SparseMerkleProof,
    },
    TreeSpec,
};

#[derive(Debug, Arbitrary)]
struct Run {
    side_nodes: Vec<Vec<u8>>,
    non_membership_leaf_data: Vec<u8>,
    sibling_data: Vec<u8>,
    bit_mask: Vec<u8>,
    num_side_nodes: usize,
    root: Vec<u8>,
    key: Vec<u8>,
    value: Vec<u8>,
}

// Arbitrary input must never panic, and whatever compacts must come back unchanged.
fuzz_target!(|run: Run| {
    let spec = TreeSpec::<Blake3Hasher>::new();

    let proof = SparseMerkleProof {
        side_nodes: run.side_nodes.clone(),
        non_membership_leaf_data: run.non_membership_leaf_data.clone(),
        sibling_data: run.sibling_data.clone(),
    };
    let verified = verify_proof(&proof, &run.root, &run.key, &run.value, &spec);
    if let Ok(compacted) = compact(&proof, &spec) {
        assert_eq!(decompact(&compacted, &spec).as_ref(), Ok(&proof));
        assert_eq!(
            verify_compact_proof(&compacted, &run.root, &run.key, &run.value, &spec),
            verified
        );
    }

    let compacted = CompactProof {
        side_nodes: run.side_nodes,
        non_membership_leaf_data: run.non_membership_leaf_data,
        bit_mask: run.bit_mask,
        num_side_nodes: run.num_side_nodes,
        sibling_data: run.sibling_data,
    };
    let _ = verify_compact_proof(&compacted, &run.root, &run.key, &run.value, &spec);
});
