//! This module defines the types of a binary sparse merkle tree, generalized over the output size
//! of a hash function. Every lookup path is exactly one hash output long, so a tree built on a
//! 256-bit hash is 256 levels deep.
//!
//! There are three kinds of nodes.
//!   1. Inner nodes, which each have two children. The hash of an inner node is given by hashing
//!      [`INNER_PREFIX`] followed by the concatenation of the two child hashes.
//!   2. Leaf nodes, which have zero children. The hash of a leaf node is given by hashing
//!      [`LEAF_PREFIX`] followed by the lookup path and the hash of the value stored at the leaf.
//!   3. Placeholder nodes, which have the special value of all 0s. These nodes have no children
//!      and stand in for an empty sub-tree at any height.
//!
//! All node preimages are `1 + 2 * hash_size` bytes. Leaves are stored at the shallowest depth at
//! which their path is unique, so an inner node always has at least two leaves beneath it.
//!
//! [`INNER_PREFIX`]: crate::hasher::INNER_PREFIX
//! [`LEAF_PREFIX`]: crate::hasher::LEAF_PREFIX

use alloc::vec::Vec;
use core::fmt;

/// A node in the binary tree. Its length is always the output size of the tree's hash function.
///
/// It is either the hash of a [`LeafData`] or an [`InnerData`] preimage, or zeroed if it's a
/// placeholder.
pub type Node = Vec<u8>;

/// The path to a key. All paths of a tree have the same fixed length.
pub type KeyPath = Vec<u8>;

/// The hash of a value.
pub type ValueHash = Vec<u8>;

/// The value denoting "no value". Writing it deletes a key; proving it proves non-membership.
pub const DEFAULT_VALUE: &[u8] = &[];

/// The kind of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// A placeholder node indicates an empty sub-tree.
    Placeholder,
    /// A leaf node indicates a sub-tree with a single leaf.
    Leaf,
    /// An inner node indicates at least two values.
    Inner,
}

/// The data of an inner (branch) node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InnerData {
    /// The hash of the left child of this node.
    pub left: Node,
    /// The hash of the right child of this node.
    pub right: Node,
}

/// The data of a leaf node.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct LeafData {
    /// The total path to this value within the tree.
    ///
    /// The actual location of this node may be anywhere along this path, depending on the other
    /// data within the tree.
    pub key_path: KeyPath,
    /// The hash of the value carried in this leaf.
    pub value_hash: ValueHash,
}

/// A decoded node preimage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodePreimage {
    /// A leaf preimage.
    Leaf(LeafData),
    /// An inner node preimage.
    Inner(InnerData),
}

impl NodePreimage {
    /// Get the kind of the decoded node.
    pub fn kind(&self) -> NodeKind {
        match self {
            NodePreimage::Leaf(_) => NodeKind::Leaf,
            NodePreimage::Inner(_) => NodeKind::Inner,
        }
    }
}

/// A node reachable from the root could not be used.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeError {
    /// No preimage is known for the node.
    Missing(Node),
    /// The stored preimage is not a valid node encoding.
    Malformed(Node),
}

impl fmt::Display for NodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeError::Missing(hash) => write!(f, "node 0x{} is missing", hex::encode(hash)),
            NodeError::Malformed(hash) => {
                write!(f, "node 0x{} has a malformed preimage", hex::encode(hash))
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for NodeError {}
