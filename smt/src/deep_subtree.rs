//! Partial trees rebuilt from proofs.
//!
//! A deep subtree starts out knowing nothing but a root. Every proof added to it fills in the
//! nodes along one key's path, after which that key can be read, proven, updated and deleted as
//! if the whole tree were present. Operations touching any other part of the tree fail with a
//! missing node.

use crate::{
    store::KVStore, verify_proof_with_updates, Node, ProofError, SparseMerkleProof,
    SparseMerkleTree, DEFAULT_VALUE,
};
use anyhow::Result;
use smt_core::hasher::BinaryHash;
use std::ops::{Deref, DerefMut};

/// A [`SparseMerkleTree`] which only holds the branches it was given.
pub struct DeepSubtree<H, S = crate::Store> {
    tree: SparseMerkleTree<H, S>,
}

impl<H: BinaryHash, S: KVStore> DeepSubtree<H, S> {
    /// Create a subtree with the given root over empty stores.
    pub fn new(nodes: S, values: S, root: Node) -> Self {
        DeepSubtree {
            tree: SparseMerkleTree::import(nodes, values, root),
        }
    }

    /// Add the branch for `key` described by `proof`.
    ///
    /// `value` is the value the proof attests to; pass [`DEFAULT_VALUE`] for a proof of absence.
    /// Fails with [`ProofError::InvalidBranch`] if the proof does not verify against the current
    /// root.
    pub fn add_branch(&mut self, proof: &SparseMerkleProof, key: &[u8], value: &[u8]) -> Result<()> {
        let spec = self.tree.spec();
        let Some(updates) = verify_proof_with_updates(proof, self.tree.root(), key, value, spec)
        else {
            return Err(ProofError::InvalidBranch.into());
        };

        for (hash, preimage) in &updates {
            self.tree.nodes().set(hash, preimage)?;
        }

        // the sibling of the terminal node is needed to collapse the tree around it on delete.
        if !proof.sibling_data.is_empty() {
            let hash = spec.hasher().digest(&proof.sibling_data);
            self.tree.nodes().set(&hash, &proof.sibling_data)?;
        }

        if value != DEFAULT_VALUE {
            self.tree.values().set(&spec.path(key), value)?;
        }

        tracing::trace!(nodes = updates.len(), "added branch");
        Ok(())
    }

    /// Unwrap the underlying tree.
    pub fn into_inner(self) -> SparseMerkleTree<H, S> {
        self.tree
    }
}

impl<H, S> Deref for DeepSubtree<H, S> {
    type Target = SparseMerkleTree<H, S>;

    fn deref(&self) -> &Self::Target {
        &self.tree
    }
}

impl<H, S> DerefMut for DeepSubtree<H, S> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.tree
    }
}
