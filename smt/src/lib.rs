//! A Sparse Merkle Tree over pluggable key-value stores.
//!
//! Keys are hashed into fixed-size paths which pick a leaf position in a binary tree of depth
//! `8 * hash_size`. Empty sub-trees are represented by a placeholder and never stored, and every
//! leaf sits at the shallowest depth at which its path is unique. The root therefore commits to
//! the set of key-value pairs alone, regardless of the order in which they were written.
//!
//! [`SparseMerkleTree`] keeps two stores: a node store mapping node hashes to node encodings and a
//! value store mapping key paths to values. Any [`KVStore`] works; [`Store`] bundles an in-memory
//! and an on-disk implementation, selected through [`Options`].
//!
//! Proofs are produced with [`SparseMerkleTree::prove`] and checked with [`verify_proof`], which
//! needs nothing but the root. [`DeepSubtree`] rebuilds just enough of a tree from proofs to apply
//! updates to the proven keys.

use anyhow::{bail, Result};
use smt_core::{
    cursor::{record_path, Terminal},
    prove::prove,
    update::{insert, remove, TrieUpdate},
};
use store::NodeStoreReader;

pub use options::Options;
pub use smt_core::{
    hasher::{BinaryHash, TreeHasher},
    proof::{
        compact, decompact, verify_compact_proof, verify_proof, verify_proof_with_updates,
        CompactProof, ProofError, SparseMerkleProof,
    },
    trie::{KeyPath, Node, NodeError, ValueHash, DEFAULT_VALUE},
    TreeSpec,
};
#[cfg(feature = "blake3-hasher")]
pub use smt_core::hasher::Blake3Hasher;
#[cfg(feature = "sha2-hasher")]
pub use smt_core::hasher::Sha2Hasher;
pub use store::{FileStore, KVStore, MemStore, Store};

pub use deep_subtree::DeepSubtree;

mod deep_subtree;
mod options;
pub mod store;

/// A value stored in the tree.
pub type Value = Vec<u8>;

/// A Sparse Merkle Tree bound to a node store and a value store.
///
/// Reads take `&self` and writes take `&mut self`. The stores may be shared, but the tree assumes
/// it is the only writer.
pub struct SparseMerkleTree<H, S = Store> {
    spec: TreeSpec<H>,
    nodes: S,
    values: S,
    root: Node,
}

impl<H: BinaryHash, S: KVStore> SparseMerkleTree<H, S> {
    /// Create an empty tree over the given stores.
    pub fn new(nodes: S, values: S) -> Self {
        let spec = TreeSpec::new();
        let root = spec.placeholder().to_vec();
        SparseMerkleTree {
            spec,
            nodes,
            values,
            root,
        }
    }

    /// Open a tree over stores already holding the tree with the given root.
    ///
    /// Nothing is checked up front: a root the node store does not know about surfaces as an
    /// error on the first operation that needs to read it.
    pub fn import(nodes: S, values: S, root: Node) -> Self {
        SparseMerkleTree {
            spec: TreeSpec::new(),
            nodes,
            values,
            root,
        }
    }

    /// The parameters of this tree.
    pub fn spec(&self) -> &TreeSpec<H> {
        &self.spec
    }

    /// Returns the current root of the tree. For an empty tree, this is the placeholder.
    pub fn root(&self) -> &[u8] {
        &self.root
    }

    /// Returns true if the tree holds no values.
    pub fn is_empty(&self) -> bool {
        self.spec.hasher().is_placeholder(&self.root)
    }

    /// The node store.
    pub fn nodes(&self) -> &S {
        &self.nodes
    }

    /// The value store.
    pub fn values(&self) -> &S {
        &self.values
    }

    /// Load the value of `key`, or `None` if the tree does not hold it.
    pub fn get(&self, key: &[u8]) -> Result<Option<Value>> {
        let path = self.spec.path(key);
        if !self.has_path(&path)? {
            return Ok(None);
        }

        match self.values.get(&path)? {
            Some(value) => Ok(Some(value)),
            None => bail!(
                "value store has no value for present key path {}",
                hex::encode(&path)
            ),
        }
    }

    /// Returns true if the tree holds a value for `key`.
    pub fn has(&self, key: &[u8]) -> Result<bool> {
        self.has_path(&self.spec.path(key))
    }

    fn has_path(&self, path: &[u8]) -> Result<bool> {
        let record = record_path(&self.spec, &NodeStoreReader(&self.nodes), &self.root, path)?;
        tracing::trace!(depth = record.depth(), "looked up key path");
        Ok(matches!(
            record.terminal,
            Terminal::Leaf { ref data, .. } if data.key_path == path
        ))
    }

    /// Set the value of `key`. Setting [`DEFAULT_VALUE`] deletes the key.
    ///
    /// On error, the root is left unchanged. Nodes written before the error remain in the node
    /// store but are unreachable from the root.
    pub fn update(&mut self, key: &[u8], value: &[u8]) -> Result<()> {
        if value == DEFAULT_VALUE {
            return self.delete(key);
        }

        let path = self.spec.path(key);
        let value_hash = self.spec.digest_value(value);
        let reader = NodeStoreReader(&self.nodes);
        let Some(update) = insert(&self.spec, &reader, &self.root, &path, &value_hash)? else {
            return Ok(());
        };

        self.write_nodes(&update)?;
        self.values.set(&path, value)?;
        self.set_root(update.root);
        Ok(())
    }

    /// Remove the value of `key`. Removing a key the tree does not hold is a no-op.
    pub fn delete(&mut self, key: &[u8]) -> Result<()> {
        let path = self.spec.path(key);
        let reader = NodeStoreReader(&self.nodes);
        let Some(update) = remove(&self.spec, &reader, &self.root, &path)? else {
            return Ok(());
        };

        self.write_nodes(&update)?;
        self.values.delete(&path)?;
        self.set_root(update.root);
        Ok(())
    }

    fn write_nodes(&self, update: &TrieUpdate) -> Result<()> {
        for (hash, preimage) in &update.nodes {
            self.nodes.set(hash, preimage)?;
        }
        Ok(())
    }

    fn set_root(&mut self, root: Node) {
        tracing::debug!(
            old = %hex::encode(&self.root),
            new = %hex::encode(&root),
            "root changed"
        );
        self.root = root;
    }

    /// Prove the value of `key`, or its absence, against the current root.
    pub fn prove(&self, key: &[u8]) -> Result<SparseMerkleProof> {
        let path = self.spec.path(key);
        prove(&self.spec, &NodeStoreReader(&self.nodes), &self.root, &path)
    }

    /// Like [`SparseMerkleTree::prove`], but compacted.
    pub fn prove_compact(&self, key: &[u8]) -> Result<CompactProof> {
        let proof = self.prove(key)?;
        Ok(compact(&proof, &self.spec)?)
    }

    /// Stop both stores. The tree is unusable afterwards.
    pub fn stop(&self) -> Result<()> {
        self.nodes.stop()?;
        self.values.stop()
    }
}
