//! Hashers (feature-gated) and the node encoding scheme built on top of them.

use alloc::vec::Vec;
use core::{fmt, marker::PhantomData};

use crate::trie::{InnerData, LeafData, Node, NodeError, NodeKind, NodePreimage};

/// The domain-separation byte at the start of every leaf preimage.
pub const LEAF_PREFIX: u8 = 0;

/// The domain-separation byte at the start of every inner node preimage.
pub const INNER_PREFIX: u8 = 1;

/// A simple trait for representing binary hash functions.
///
/// The output size is fixed for a given implementation. The tree derives its depth, path length
/// and placeholder from it.
pub trait BinaryHash {
    /// The length of every output of [`BinaryHash::hash`], in bytes.
    fn output_size() -> usize;

    /// Given a bit-string, produce a hash of exactly [`BinaryHash::output_size`] bytes.
    fn hash(input: &[u8]) -> Vec<u8>;
}

/// Blanket implementation for all implementations of `Digest`
impl<H: digest::Digest> BinaryHash for H {
    fn output_size() -> usize {
        <H as digest::Digest>::output_size()
    }

    fn hash(input: &[u8]) -> Vec<u8> {
        H::digest(input).to_vec()
    }
}

/// Node and value hashing for a tree over the binary hash `H`.
///
/// Leaves and inner nodes are domain-separated by a prefix byte, so a leaf hash can never be
/// passed off as the hash of an inner node with chosen children, or vice versa.
pub struct TreeHasher<H> {
    placeholder: Node,
    _marker: PhantomData<fn() -> H>,
}

impl<H> Clone for TreeHasher<H> {
    fn clone(&self) -> Self {
        TreeHasher {
            placeholder: self.placeholder.clone(),
            _marker: PhantomData,
        }
    }
}

impl<H> fmt::Debug for TreeHasher<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TreeHasher")
            .field("hash_size", &self.placeholder.len())
            .finish()
    }
}

impl<H: BinaryHash> Default for TreeHasher<H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H: BinaryHash> TreeHasher<H> {
    /// Create a new tree hasher.
    ///
    /// Panics if the hash function has a zero output size.
    pub fn new() -> Self {
        let hash_size = H::output_size();
        assert!(hash_size > 0, "hash function must have a non-zero output size");
        TreeHasher {
            placeholder: alloc::vec![0u8; hash_size],
            _marker: PhantomData,
        }
    }

    /// The size of every node hash, in bytes.
    pub fn hash_size(&self) -> usize {
        self.placeholder.len()
    }

    /// The size of every key path, in bytes. Paths are digests, so this is the hash size.
    pub fn path_size(&self) -> usize {
        self.placeholder.len()
    }

    /// The size of every node preimage, leaf or inner.
    pub fn node_size(&self) -> usize {
        1 + self.path_size() + self.hash_size()
    }

    /// The hash standing in for an empty sub-tree.
    pub fn placeholder(&self) -> &[u8] {
        &self.placeholder
    }

    /// Whether the node is the placeholder.
    pub fn is_placeholder(&self, node: &[u8]) -> bool {
        node == &self.placeholder[..]
    }

    /// A single application of the hash function.
    pub fn digest(&self, data: &[u8]) -> Node {
        H::hash(data)
    }

    /// Hash an arbitrary-length value.
    pub fn digest_value(&self, value: &[u8]) -> Node {
        H::hash(value)
    }

    /// Hash a leaf. Returns the leaf hash and its preimage.
    pub fn digest_leaf(&self, path: &[u8], value_hash: &[u8]) -> (Node, Vec<u8>) {
        let preimage = encode(LEAF_PREFIX, path, value_hash);
        (H::hash(&preimage), preimage)
    }

    /// Hash an inner node. Returns the node hash and its preimage.
    pub fn digest_inner(&self, left: &[u8], right: &[u8]) -> (Node, Vec<u8>) {
        let preimage = encode(INNER_PREFIX, left, right);
        (H::hash(&preimage), preimage)
    }

    /// Whether the preimage is tagged as a leaf.
    pub fn is_leaf(&self, preimage: &[u8]) -> bool {
        preimage.first() == Some(&LEAF_PREFIX)
    }

    /// Split a leaf preimage into its path and value hash.
    ///
    /// The preimage must be [`Self::node_size`] bytes long.
    pub fn parse_leaf<'a>(&self, preimage: &'a [u8]) -> (&'a [u8], &'a [u8]) {
        preimage[1..].split_at(self.path_size())
    }

    /// Split an inner node preimage into its left and right children.
    ///
    /// The preimage must be [`Self::node_size`] bytes long.
    pub fn parse_inner<'a>(&self, preimage: &'a [u8]) -> (&'a [u8], &'a [u8]) {
        preimage[1..].split_at(self.hash_size())
    }

    /// Get the kind of a node from its hash alone. Non-placeholder hashes are reported as
    /// [`NodeKind::Inner`] unless `preimage` says otherwise.
    pub fn node_kind(&self, node: &[u8], preimage: Option<&[u8]>) -> NodeKind {
        if self.is_placeholder(node) {
            NodeKind::Placeholder
        } else if preimage.map_or(false, |p| self.is_leaf(p)) {
            NodeKind::Leaf
        } else {
            NodeKind::Inner
        }
    }

    /// Decode the stored preimage of the node `hash`.
    pub fn decode(&self, hash: &[u8], preimage: &[u8]) -> Result<NodePreimage, NodeError> {
        if preimage.len() != self.node_size() {
            return Err(NodeError::Malformed(hash.to_vec()));
        }
        match preimage[0] {
            LEAF_PREFIX => {
                let (path, value_hash) = self.parse_leaf(preimage);
                Ok(NodePreimage::Leaf(LeafData {
                    key_path: path.to_vec(),
                    value_hash: value_hash.to_vec(),
                }))
            }
            INNER_PREFIX => {
                let (left, right) = self.parse_inner(preimage);
                Ok(NodePreimage::Inner(InnerData {
                    left: left.to_vec(),
                    right: right.to_vec(),
                }))
            }
            _ => Err(NodeError::Malformed(hash.to_vec())),
        }
    }
}

fn encode(prefix: u8, a: &[u8], b: &[u8]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(1 + a.len() + b.len());
    buf.push(prefix);
    buf.extend_from_slice(a);
    buf.extend_from_slice(b);
    buf
}

#[cfg(any(feature = "blake3-hasher", test))]
pub use self::blake3::Blake3Hasher;

/// A binary hash making use of blake3.
#[cfg(any(feature = "blake3-hasher", test))]
pub mod blake3 {
    use super::BinaryHash;
    use alloc::vec::Vec;

    /// A [`BinaryHash`] implementation for Blake3.
    #[derive(Debug, Clone, Copy, Default)]
    pub struct Blake3Hasher;

    impl BinaryHash for Blake3Hasher {
        fn output_size() -> usize {
            blake3::OUT_LEN
        }

        fn hash(value: &[u8]) -> Vec<u8> {
            blake3::hash(value).as_bytes().to_vec()
        }
    }
}

#[cfg(any(feature = "sha2-hasher", test))]
pub use self::sha2::Sha2Hasher;

/// A binary hash making use of sha2-256.
#[cfg(any(feature = "sha2-hasher", test))]
pub mod sha2 {
    use super::BinaryHash;
    use alloc::vec::Vec;
    use sha2::{Digest, Sha256};

    /// A [`BinaryHash`] implementation for Sha2.
    #[derive(Debug, Clone, Copy, Default)]
    pub struct Sha2Hasher;

    impl BinaryHash for Sha2Hasher {
        fn output_size() -> usize {
            32
        }

        fn hash(value: &[u8]) -> Vec<u8> {
            let mut hasher = Sha256::new();
            hasher.update(value);
            hasher.finalize().to_vec()
        }
    }
}
