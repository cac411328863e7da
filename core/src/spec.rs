//! The immutable description of a tree: its hash function and everything derived from it.

use crate::{
    hasher::{BinaryHash, TreeHasher},
    key_path::PathHasher,
    trie::{KeyPath, ValueHash},
};
use core::fmt;

/// Everything needed to hash, walk, and verify a tree over the binary hash `H`.
///
/// A spec is created once per tree and shared between the tree, its provers and its verifiers.
/// It holds no mutable state.
pub struct TreeSpec<H> {
    hasher: TreeHasher<H>,
    paths: PathHasher<H>,
}

impl<H> Clone for TreeSpec<H> {
    fn clone(&self) -> Self {
        TreeSpec {
            hasher: self.hasher.clone(),
            paths: self.paths.clone(),
        }
    }
}

impl<H> fmt::Debug for TreeSpec<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TreeSpec")
            .field("hasher", &self.hasher)
            .finish()
    }
}

impl<H: BinaryHash> Default for TreeSpec<H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H: BinaryHash> TreeSpec<H> {
    /// Create the spec for a tree over `H`.
    ///
    /// Panics if the hash function has a zero output size.
    pub fn new() -> Self {
        TreeSpec {
            hasher: TreeHasher::new(),
            paths: PathHasher::new(),
        }
    }

    /// The node hasher.
    pub fn hasher(&self) -> &TreeHasher<H> {
        &self.hasher
    }

    /// The path deriver.
    pub fn paths(&self) -> &PathHasher<H> {
        &self.paths
    }

    /// The size of every hash, in bytes.
    pub fn hash_size(&self) -> usize {
        self.hasher.hash_size()
    }

    /// The size of every path, in bytes.
    pub fn path_size(&self) -> usize {
        self.paths.path_size()
    }

    /// The depth of the tree in bits, which bounds the number of side nodes in a proof.
    pub fn depth(&self) -> usize {
        self.path_size() * 8
    }

    /// The hash of the empty tree.
    pub fn placeholder(&self) -> &[u8] {
        self.hasher.placeholder()
    }

    /// Derive the path of a key.
    pub fn path(&self, key: &[u8]) -> KeyPath {
        self.paths.path(key)
    }

    /// Hash a raw value.
    pub fn digest_value(&self, value: &[u8]) -> ValueHash {
        self.hasher.digest_value(value)
    }
}

#[cfg(test)]
mod tests {
    use super::TreeSpec;
    use crate::hasher::{Blake3Hasher, Sha2Hasher};

    #[test]
    fn sizes_derive_from_hash() {
        let spec = TreeSpec::<Sha2Hasher>::new();
        assert_eq!(spec.hash_size(), 32);
        assert_eq!(spec.depth(), 256);
        assert_eq!(spec.placeholder().len(), 32);

        let spec = TreeSpec::<sha2::Sha512>::new();
        assert_eq!(spec.depth(), 512);

        let spec = TreeSpec::<sha2::Sha224>::new();
        assert_eq!(spec.hash_size(), 28);
        assert_eq!(spec.depth(), 224);
    }

    #[test]
    fn digest_value_is_plain_hash() {
        let spec = TreeSpec::<Blake3Hasher>::new();
        assert_eq!(
            spec.digest_value(b"value"),
            blake3::hash(b"value").as_bytes().to_vec()
        );
    }
}
